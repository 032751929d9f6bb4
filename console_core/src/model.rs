//! Entities as the console sees them. They live server-side; these are
//! the shapes the REST API returns and the dropdowns carry.

use serde::{Deserialize, Serialize};

use crate::ids::{
    DutyId, InchargeId, ItsId, JamaatId, JamiaatId, LocationId, MiqaatId, RoleId, TeamId, TempId, VenueId,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Miqaat {
    pub id: MiqaatId,
    pub name: String,
    pub quota: u32,
    pub venue_id: VenueId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jamiaat {
    pub id: JamiaatId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jamaat {
    pub id: JamaatId,
    pub name: String,
    pub jamiaat_id: JamiaatId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jamiaat_id: Option<JamiaatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_id: Option<VenueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub its_id: ItsId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

/// A persisted duty. The server keeps (team, miqaat, location) unique.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub id: DutyId,
    pub miqaat_id: MiqaatId,
    pub team_id: TeamId,
    #[serde(default)]
    pub team_name: String,
    pub location_id: LocationId,
    #[serde(default)]
    pub location_name: String,
    pub quota: u32,
}

/// Body of a duty create/update request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DutyDraft {
    pub miqaat_id: MiqaatId,
    pub team_id: TeamId,
    pub location_id: LocationId,
    pub quota: u32,
}

/// Client-only staged duty, never persisted until a bulk save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDuty {
    pub temp_id: TempId,
    pub miqaat_id: MiqaatId,
    pub team: Team,
    pub location: Location,
    pub quota: u32,
    pub member_count: u32,
}

impl PendingDuty {
    pub fn draft(&self) -> DutyDraft {
        DutyDraft {
            miqaat_id: self.miqaat_id,
            team_id: self.team.id,
            location_id: self.location.id,
            quota: self.quota,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incharge {
    pub id: InchargeId,
    pub miqaat_id: MiqaatId,
    pub location_id: LocationId,
    #[serde(default)]
    pub location_name: String,
    pub its_id: ItsId,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InchargeDraft {
    pub miqaat_id: MiqaatId,
    pub location_id: LocationId,
    pub its_id: ItsId,
}

/// Navigation state handed from the miqaat-creation flow to the duty and
/// incharge screens. Consumed once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiqaatHandoff {
    #[serde(rename = "fromMiqaatCreation", default)]
    pub from_miqaat_creation: bool,
    #[serde(rename = "miqaatId")]
    pub miqaat_id: MiqaatId,
    #[serde(rename = "miqaatName")]
    pub miqaat_name: String,
    #[serde(rename = "venueId")]
    pub venue_id: VenueId,
}
