//! REST envelope, result codes and the backend seams.
//!
//! Every endpoint answers `{ success, message?, data }`. Writes also carry
//! `data.result_code`, which is turned into [`ResultCode`] once here so no
//! screen branches on raw integers.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConsoleError, Result};
use crate::ids::{DutyId, InchargeId, JamiaatId, MiqaatId, TeamId, VenueId};
use crate::model::{Duty, DutyDraft, Incharge, InchargeDraft, Jamiaat, Location, Member, Miqaat, Team};
use crate::reports::{AttendanceDetail, AttendanceRow, DutyReportRow};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps a read response; a missing payload on success is a decode error.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(ConsoleError::Rejected {
                code: 0,
                message: self.message.unwrap_or_else(|| "request failed".to_string()),
            });
        }
        self.data.ok_or_else(|| ConsoleError::Decode("response has no data".to_string()))
    }
}

/// A list payload that drops rows which fail to decode, so one malformed
/// record cannot empty a whole dropdown.
#[derive(Clone, Debug, PartialEq)]
pub struct Lenient<T>(pub Vec<T>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let rows = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(row) => Some(row),
                Err(err) => {
                    log::warn!("skipped {} row: {err}", std::any::type_name::<T>());
                    None
                }
            })
            .collect();
        Ok(Lenient(rows))
    }
}

/// Payload of a write response.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WriteAck {
    #[serde(default)]
    pub result_code: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultCode {
    Inserted,
    Updated,
    Deleted,
    Duplicate,
    NotFound,
    Failed(i64),
}

impl ResultCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ResultCode::Inserted,
            2 => ResultCode::Updated,
            3 => ResultCode::Deleted,
            4 => ResultCode::Duplicate,
            5 => ResultCode::NotFound,
            other => ResultCode::Failed(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Inserted | ResultCode::Updated | ResultCode::Deleted)
    }
}

/// Classified result of a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success(ResultCode),
    Duplicate(String),
    NotFound(String),
    Failure(String),
}

impl Outcome {
    pub fn from_envelope(env: &Envelope<WriteAck>) -> Self {
        let message = env.message.clone().unwrap_or_default();
        let code = env.data.as_ref().and_then(|d| d.result_code);
        match code.map(ResultCode::from_code) {
            Some(rc) if rc.is_success() && env.success => Outcome::Success(rc),
            Some(ResultCode::Duplicate) => Outcome::Duplicate(or_default(message, "Record already exists")),
            Some(ResultCode::NotFound) => Outcome::NotFound(or_default(message, "Record not found")),
            // Older endpoints answer success without a result code.
            None if env.success => Outcome::Success(ResultCode::Inserted),
            _ => Outcome::Failure(or_default(message, "Request failed")),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<ResultCode> {
        match self {
            Outcome::Success(rc) => Ok(rc),
            Outcome::Duplicate(message) => Err(ConsoleError::Rejected { code: 4, message }),
            Outcome::NotFound(message) => Err(ConsoleError::Rejected { code: 5, message }),
            Outcome::Failure(message) => Err(ConsoleError::Rejected { code: 0, message }),
        }
    }
}

fn or_default(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Relative API paths.
pub mod paths {
    use crate::ids::{DutyId, InchargeId, JamiaatId, MiqaatId, TeamId, VenueId};

    pub const LOGIN: &str = "/auth/login";
    pub const MIQAATS: &str = "/miqaat";
    pub const JAMIAATS: &str = "/jamiaat";
    pub const TEAMS: &str = "/team";
    pub const DUTIES: &str = "/duty";
    pub const INCHARGES: &str = "/incharge";

    pub fn teams_by_jamiaat(id: JamiaatId) -> String {
        format!("/team/by-jamiaat/{id}")
    }

    pub fn locations_by_venue(id: VenueId) -> String {
        format!("/location/by-venue/{id}")
    }

    pub fn remaining_quota(id: MiqaatId) -> String {
        format!("/duty/remaining-quota/{id}")
    }

    pub fn duties_by_miqaat(id: MiqaatId) -> String {
        format!("/duty/by-miqaat/{id}")
    }

    pub fn duty(id: DutyId) -> String {
        format!("/duty/{id}")
    }

    pub fn team_member_count(id: TeamId) -> String {
        format!("/team/{id}/member-count")
    }

    pub fn team_members(id: TeamId) -> String {
        format!("/team/{id}/members")
    }

    pub fn incharges_by_miqaat(id: MiqaatId) -> String {
        format!("/incharge/by-miqaat/{id}")
    }

    pub fn incharge(id: InchargeId) -> String {
        format!("/incharge/{id}")
    }

    pub fn duty_report(id: MiqaatId) -> String {
        format!("/report/duty/{id}")
    }

    pub fn attendance_report(id: MiqaatId) -> String {
        format!("/report/attendance/{id}")
    }

    pub fn attendance_detail(miqaat: MiqaatId, team: TeamId) -> String {
        format!("/report/attendance/{miqaat}/team/{team}")
    }
}

/// Read endpoints feeding the dropdown cascade.
#[async_trait(?Send)]
pub trait CatalogBackend {
    async fn miqaats(&self) -> Result<Vec<Miqaat>>;
    async fn jamiaats(&self) -> Result<Vec<Jamiaat>>;
    async fn teams(&self, jamiaat: Option<JamiaatId>) -> Result<Vec<Team>>;
    async fn locations(&self, venue: VenueId) -> Result<Vec<Location>>;
    async fn remaining_quota(&self, miqaat: MiqaatId) -> Result<i64>;
    async fn duties(&self, miqaat: MiqaatId) -> Result<Vec<Duty>>;
    async fn team_member_count(&self, team: TeamId) -> Result<u32>;
    async fn team_members(&self, team: TeamId) -> Result<Vec<Member>>;
}

#[async_trait(?Send)]
pub trait DutyBackend {
    async fn create_duty(&self, draft: &DutyDraft) -> Result<Outcome>;
    async fn update_duty(&self, id: DutyId, draft: &DutyDraft) -> Result<Outcome>;
    async fn delete_duty(&self, id: DutyId) -> Result<Outcome>;
}

#[async_trait(?Send)]
pub trait InchargeBackend {
    async fn incharges(&self, miqaat: MiqaatId) -> Result<Vec<Incharge>>;
    async fn create_incharge(&self, draft: &InchargeDraft) -> Result<Outcome>;
    async fn delete_incharge(&self, id: InchargeId) -> Result<Outcome>;
}

#[async_trait(?Send)]
pub trait ReportBackend {
    async fn duty_report(&self, miqaat: MiqaatId) -> Result<Vec<DutyReportRow>>;
    async fn attendance_report(&self, miqaat: MiqaatId) -> Result<Vec<AttendanceRow>>;
    async fn attendance_detail(&self, miqaat: MiqaatId, team: TeamId) -> Result<Vec<AttendanceDetail>>;
}

/// Generic CRUD over one master-data collection, addressed by path.
#[async_trait(?Send)]
pub trait MasterBackend {
    async fn list_raw(&self, path: &str) -> Result<serde_json::Value>;
    async fn write_raw(&self, method: WriteMethod, path: &str, body: Option<serde_json::Value>) -> Result<Outcome>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum WriteMethod {
    Post,
    Put,
    Delete,
}
