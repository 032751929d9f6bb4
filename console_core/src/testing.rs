//! In-memory backend used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{
    CatalogBackend, DutyBackend, InchargeBackend, MasterBackend, Outcome, ReportBackend, ResultCode, WriteMethod,
};
use crate::error::{ConsoleError, Result};
use crate::ids::{DutyId, InchargeId, ItsId, JamiaatId, LocationId, MiqaatId, TeamId, VenueId};
use crate::model::{Duty, DutyDraft, Incharge, InchargeDraft, Jamiaat, Location, Member, Miqaat, Team};
use crate::reports::{AttendanceDetail, AttendanceRow, DutyReportRow};

pub fn team(id: i64, name: &str) -> Team {
    Team { id: TeamId(id), name: name.into(), jamiaat_id: None, member_count: None }
}

pub fn location(id: i64, name: &str) -> Location {
    Location { id: LocationId(id), name: name.into(), venue_id: Some(VenueId(1)), reporting_time: None }
}

pub fn miqaat(id: i64, quota: u32, venue: i64) -> Miqaat {
    Miqaat { id: MiqaatId(id), name: format!("Miqaat {id}"), quota, venue_id: VenueId(venue), start_date: None, end_date: None }
}

pub fn member(its: &str, name: &str, team: i64) -> Member {
    Member {
        its_id: ItsId::parse(its).expect("valid ITS id"),
        full_name: name.into(),
        team_id: Some(TeamId(team)),
        role_id: None,
        mobile: None,
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub miqaats: Vec<Miqaat>,
    pub jamiaats: Vec<Jamiaat>,
    pub teams: Vec<Team>,
    pub locations: Vec<Location>,
    pub remaining: i64,
    pub duties: Vec<Duty>,
    pub members: HashMap<TeamId, Vec<Member>>,
    pub incharges: Vec<Incharge>,
    pub fail_reads: bool,
    member_counts: HashMap<TeamId, u32>,
    outcomes: RefCell<VecDeque<Result<Outcome>>>,
    created: RefCell<Vec<DutyDraft>>,
    writes: RefCell<Vec<(WriteMethod, String, Option<Value>)>>,
    count_calls: Cell<usize>,
}

impl FakeApi {
    pub fn with_member_count(mut self, team: i64, count: u32) -> Self {
        self.member_counts.insert(TeamId(team), count);
        self
    }

    pub fn with_outcomes(self, outcomes: Vec<Result<Outcome>>) -> Self {
        *self.outcomes.borrow_mut() = outcomes.into();
        self
    }

    pub fn created(&self) -> Vec<DutyDraft> {
        self.created.borrow().clone()
    }

    pub fn writes(&self) -> Vec<(WriteMethod, String, Option<Value>)> {
        self.writes.borrow().clone()
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.get()
    }

    fn next_outcome(&self) -> Result<Outcome> {
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(Outcome::Success(ResultCode::Inserted)))
    }

    fn read<T: Clone>(&self, value: &T) -> Result<T> {
        if self.fail_reads {
            Err(ConsoleError::Transport("offline".into()))
        } else {
            Ok(value.clone())
        }
    }
}

#[async_trait(?Send)]
impl CatalogBackend for FakeApi {
    async fn miqaats(&self) -> Result<Vec<Miqaat>> {
        self.read(&self.miqaats)
    }

    async fn jamiaats(&self) -> Result<Vec<Jamiaat>> {
        self.read(&self.jamiaats)
    }

    async fn teams(&self, jamiaat: Option<JamiaatId>) -> Result<Vec<Team>> {
        let teams = self
            .teams
            .iter()
            .filter(|t| jamiaat.is_none() || t.jamiaat_id == jamiaat)
            .cloned()
            .collect::<Vec<_>>();
        self.read(&teams)
    }

    async fn locations(&self, venue: VenueId) -> Result<Vec<Location>> {
        let locations = self
            .locations
            .iter()
            .filter(|l| l.venue_id == Some(venue))
            .cloned()
            .collect::<Vec<_>>();
        self.read(&locations)
    }

    async fn remaining_quota(&self, _miqaat: MiqaatId) -> Result<i64> {
        self.read(&self.remaining)
    }

    async fn duties(&self, miqaat: MiqaatId) -> Result<Vec<Duty>> {
        let duties = self.duties.iter().filter(|d| d.miqaat_id == miqaat).cloned().collect::<Vec<_>>();
        self.read(&duties)
    }

    async fn team_member_count(&self, team: TeamId) -> Result<u32> {
        self.count_calls.set(self.count_calls.get() + 1);
        self.member_counts
            .get(&team)
            .copied()
            .ok_or_else(|| ConsoleError::Rejected { code: 5, message: "Team not found".into() })
    }

    async fn team_members(&self, team: TeamId) -> Result<Vec<Member>> {
        self.read(&self.members.get(&team).cloned().unwrap_or_default())
    }
}

#[async_trait(?Send)]
impl DutyBackend for FakeApi {
    async fn create_duty(&self, draft: &DutyDraft) -> Result<Outcome> {
        self.created.borrow_mut().push(draft.clone());
        self.next_outcome()
    }

    async fn update_duty(&self, id: DutyId, draft: &DutyDraft) -> Result<Outcome> {
        let body = serde_json::to_value(draft)?;
        self.writes.borrow_mut().push((WriteMethod::Put, format!("/duty/{id}"), Some(body)));
        self.next_outcome()
    }

    async fn delete_duty(&self, id: DutyId) -> Result<Outcome> {
        self.writes.borrow_mut().push((WriteMethod::Delete, format!("/duty/{id}"), None));
        self.next_outcome()
    }
}

#[async_trait(?Send)]
impl InchargeBackend for FakeApi {
    async fn incharges(&self, miqaat: MiqaatId) -> Result<Vec<Incharge>> {
        let rows = self.incharges.iter().filter(|i| i.miqaat_id == miqaat).cloned().collect::<Vec<_>>();
        self.read(&rows)
    }

    async fn create_incharge(&self, draft: &InchargeDraft) -> Result<Outcome> {
        let body = serde_json::to_value(draft)?;
        self.writes.borrow_mut().push((WriteMethod::Post, "/incharge".into(), Some(body)));
        self.next_outcome()
    }

    async fn delete_incharge(&self, id: InchargeId) -> Result<Outcome> {
        self.writes.borrow_mut().push((WriteMethod::Delete, format!("/incharge/{id}"), None));
        self.next_outcome()
    }
}

#[async_trait(?Send)]
impl ReportBackend for FakeApi {
    async fn duty_report(&self, _miqaat: MiqaatId) -> Result<Vec<DutyReportRow>> {
        self.read(&Vec::new())
    }

    async fn attendance_report(&self, _miqaat: MiqaatId) -> Result<Vec<AttendanceRow>> {
        self.read(&Vec::new())
    }

    async fn attendance_detail(&self, _miqaat: MiqaatId, _team: TeamId) -> Result<Vec<AttendanceDetail>> {
        self.read(&Vec::new())
    }
}

#[async_trait(?Send)]
impl MasterBackend for FakeApi {
    async fn list_raw(&self, _path: &str) -> Result<Value> {
        self.read(&Value::Array(Vec::new()))
    }

    async fn write_raw(&self, method: WriteMethod, path: &str, body: Option<Value>) -> Result<Outcome> {
        self.writes.borrow_mut().push((method, path.to_string(), body));
        self.next_outcome()
    }
}
