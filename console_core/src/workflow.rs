//! The duty-assignment screen as one state object: cascade, quota input,
//! staging list, edit overlay and the confirmation dialogs.

use crate::access::{modules, Action, ModuleId, Permission};
use crate::api::{CatalogBackend, DutyBackend, ResultCode};
use crate::cascade::{Cascade, Fetch, Mode};
use crate::confirm::{ConfirmDialog, Confirmed, Variant};
use crate::error::ConsoleError;
use crate::grid::{Cell, GridRow};
use crate::ids::{DutyId, TeamId, TempId};
use crate::model::{Duty, DutyDraft, Miqaat};
use crate::quota::{self, GateInput, QuotaGate, QuotaViolation};
use crate::staging::{
    run_commit, CommitPolicy, CommitReport, ItemResult, QuotaContext, StageError, StagePlan, StageRequest,
    StagingList,
};

impl GridRow for Duty {
    const COLUMNS: &'static [&'static str] = &["Team", "Location", "Quota"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::opt_text(Some(&self.team_name)),
            1 => Cell::opt_text(Some(&self.location_name)),
            2 => self.quota.into(),
            _ => Cell::Empty,
        }
    }
}

pub struct DutyAssignment {
    pub cascade: Cascade,
    pub staging: StagingList,
    pub confirm_unstage: ConfirmDialog<TempId>,
    pub confirm_delete: ConfirmDialog<DutyId>,
    quota_input: String,
    permission: Permission,
    policy: CommitPolicy,
}

impl DutyAssignment {
    pub fn new(permission: Permission, policy: CommitPolicy) -> Self {
        Self {
            cascade: Cascade::new(Mode::Add),
            staging: StagingList::new(),
            confirm_unstage: ConfirmDialog::new(Variant::Warning),
            confirm_delete: ConfirmDialog::new(Variant::Danger),
            quota_input: String::new(),
            permission,
            policy,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    fn require(&self, action: Action) -> Result<(), ConsoleError> {
        if self.permission.allows(action) {
            Ok(())
        } else {
            Err(ConsoleError::Forbidden { module: ModuleId::from(modules::DUTY), action })
        }
    }

    pub fn quota_input(&self) -> &str {
        &self.quota_input
    }

    pub fn set_quota_input(&mut self, raw: &str) {
        self.quota_input = raw.to_string();
    }

    /// Staged duties belong to one miqaat; switching drops them.
    pub fn select_miqaat(&mut self, miqaat: Option<Miqaat>) -> Vec<Fetch> {
        if self.cascade.is_locked() {
            return Vec::new();
        }
        self.staging.clear();
        self.quota_input.clear();
        self.cascade.select_miqaat(miqaat)
    }

    fn server_remaining(&self) -> i64 {
        self.cascade.remaining_quota().unwrap_or(0)
    }

    pub fn effective_remaining(&self) -> i64 {
        let original = self.cascade.editing().map(|d| d.quota);
        quota::effective_remaining(self.server_remaining(), self.staging.items(), original)
    }

    /// Field-level validation for the current mode. Evaluated on every
    /// quota change and again before submit.
    pub fn gate(&self) -> QuotaGate {
        let teams = self.cascade.teams();
        let editing = self.cascade.editing().map(|duty| {
            let team = teams.first().map(|t| t.id).unwrap_or(duty.team_id);
            (duty, self.cascade.member_count(team))
        });
        QuotaGate::evaluate(GateInput {
            raw_quota: &self.quota_input,
            location_selected: self.cascade.location().is_some(),
            teams,
            pending: self.staging.items(),
            saved: self.cascade.saved_duties(),
            effective: self.effective_remaining(),
            editing,
        })
    }

    /* ------------------------------- staging ---------------------------- */

    pub fn prepare_stage(&mut self) -> Result<StagePlan, StageError> {
        self.require(Action::Add).map_err(StageError::Denied)?;
        let miqaat = self.cascade.miqaat().ok_or(StageError::NoMiqaat)?.id;
        let location = self.cascade.location().cloned().ok_or(QuotaViolation::NoLocationSelected)?;
        let quota = quota::parse_quota(&self.quota_input)?;
        let teams = self.cascade.teams().to_vec();
        for team in &teams {
            if let Some(n) = self.cascade.member_count(team.id) {
                self.staging.remember_member_count(team.id, n);
            }
        }
        let ctx = QuotaContext {
            miqaat_id: miqaat,
            server_remaining: self.server_remaining(),
            saved: self.cascade.saved_duties(),
        };
        self.staging.prepare_stage(ctx, StageRequest { teams, location, quota })
    }

    pub fn finish_stage(
        &mut self,
        plan: StagePlan,
        fetched: Vec<(TeamId, Result<u32, ConsoleError>)>,
    ) -> Result<Vec<TempId>, StageError> {
        let miqaat = self.cascade.miqaat().ok_or(StageError::Superseded)?.id;
        let ctx = QuotaContext {
            miqaat_id: miqaat,
            server_remaining: self.cascade.remaining_quota().unwrap_or(0),
            saved: self.cascade.saved_duties(),
        };
        let staged = self.staging.finish_stage(ctx, plan, fetched)?;
        self.quota_input.clear();
        let _ = self.cascade.select_teams(Vec::new());
        Ok(staged)
    }

    pub async fn stage_selected<C>(&mut self, catalog: &C) -> Result<Vec<TempId>, StageError>
    where
        C: CatalogBackend + ?Sized,
    {
        let plan = self.prepare_stage()?;
        let mut fetched = Vec::new();
        for team in plan.missing_counts().to_vec() {
            fetched.push((team, catalog.team_member_count(team).await));
        }
        self.finish_stage(plan, fetched)
    }

    pub fn update_staged_quota(&mut self, temp_id: TempId, raw: &str) -> bool {
        match quota::parse_quota(raw) {
            Ok(q) => {
                let remaining = self.server_remaining();
                self.staging.update_quota(temp_id, q, remaining)
            }
            Err(_) => false,
        }
    }

    pub fn request_unstage(&mut self, temp_id: TempId) {
        if let Some(item) = self.staging.get(temp_id) {
            let message = format!("Remove the pending duty for {} at {}?", item.team.name, item.location.name);
            self.confirm_unstage.open(temp_id, "Remove pending duty", message);
        }
    }

    pub fn confirm_unstage(&mut self) -> bool {
        match self.confirm_unstage.confirm() {
            Some(token) => self.staging.unstage(token).is_some(),
            None => false,
        }
    }

    /* ------------------------------- bulk save -------------------------- */

    pub fn commit_batch(&self) -> Result<Vec<crate::model::PendingDuty>, ConsoleError> {
        self.require(Action::Add)?;
        Ok(self.staging.commit_batch(self.policy))
    }

    /// Books the per-item results and returns the fetches that refresh the
    /// server's quota view.
    pub fn settle_commit(&mut self, results: Vec<ItemResult>, aborted: Option<ConsoleError>) -> (CommitReport, Vec<Fetch>) {
        let report = self.staging.settle(results, aborted);
        let refresh = if report.success_count > 0 { self.cascade.refresh_quota() } else { Vec::new() };
        (report, refresh)
    }

    pub async fn commit<B>(&mut self, backend: &B) -> Result<(CommitReport, Vec<Fetch>), ConsoleError>
    where
        B: DutyBackend + ?Sized,
    {
        let batch = self.commit_batch()?;
        let (results, aborted) = run_commit(backend, &batch).await;
        Ok(self.settle_commit(results, aborted))
    }

    /* ------------------------------- edit overlay ----------------------- */

    pub fn begin_edit(&mut self, duty: Duty) -> Result<Vec<Fetch>, ConsoleError> {
        self.require(Action::Edit)?;
        let miqaat = self
            .cascade
            .miqaat()
            .filter(|m| m.id == duty.miqaat_id)
            .cloned()
            .or_else(|| self.cascade.miqaat_options().iter().find(|m| m.id == duty.miqaat_id).cloned())
            .ok_or_else(|| ConsoleError::Validation(vec!["Unknown miqaat for this duty".to_string()]))?;
        self.quota_input = duty.quota.to_string();
        self.staging.clear();
        Ok(self.cascade.enter_edit(duty, miqaat))
    }

    pub fn cancel_edit(&mut self) {
        self.quota_input.clear();
        self.cascade.exit_edit();
    }

    /// Validated update request for the duty under edit.
    pub fn edit_request(&self) -> Result<(DutyId, DutyDraft), ConsoleError> {
        self.require(Action::Edit)?;
        let duty = self
            .cascade
            .editing()
            .ok_or_else(|| ConsoleError::Validation(vec!["No duty is being edited".to_string()]))?;
        let gate = self.gate();
        if !gate.can_submit() {
            return Err(ConsoleError::Validation(gate.messages()));
        }
        let quota = quota::parse_quota(&self.quota_input).map_err(|v| ConsoleError::Validation(vec![v.to_string()]))?;
        let team_id = self.cascade.teams().first().map(|t| t.id).unwrap_or(duty.team_id);
        let location_id = self.cascade.location().map(|l| l.id).unwrap_or(duty.location_id);
        Ok((duty.id, DutyDraft { miqaat_id: duty.miqaat_id, team_id, location_id, quota }))
    }

    pub async fn save_edit<B>(&mut self, backend: &B) -> Result<ResultCode, ConsoleError>
    where
        B: DutyBackend + ?Sized,
    {
        let (id, draft) = self.edit_request()?;
        let code = backend.update_duty(id, &draft).await?.into_result()?;
        log::info!("duty {id} updated");
        self.cancel_edit();
        Ok(code)
    }

    /* ------------------------------- delete saved ----------------------- */

    pub fn request_delete(&mut self, duty: &Duty) -> Result<(), ConsoleError> {
        self.require(Action::Delete)?;
        let message = format!("Delete the duty for {} at {}?", duty.team_name, duty.location_name);
        self.confirm_delete.open(duty.id, "Delete duty", message);
        Ok(())
    }

    /// Permission check on a confirmed delete; yields the duty to delete.
    pub fn delete_target(&self, confirmed: Confirmed<DutyId>) -> Result<DutyId, ConsoleError> {
        self.require(Action::Delete)?;
        Ok(confirmed.into_inner())
    }

    pub async fn delete_saved<B>(&mut self, backend: &B, confirmed: Confirmed<DutyId>) -> Result<Vec<Fetch>, ConsoleError>
    where
        B: DutyBackend + ?Sized,
    {
        let id = self.delete_target(confirmed)?;
        backend.delete_duty(id).await?.into_result()?;
        log::info!("duty {id} deleted");
        Ok(self.cascade.refresh_quota())
    }

    /// Form clear: drops staged duties and every selection.
    pub fn clear(&mut self) {
        self.staging.clear();
        self.quota_input.clear();
        self.cascade.reset();
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::access::{check_access, AccessRights};
    use crate::api::Outcome;
    use crate::cascade::Phase;
    use crate::ids::{LocationId, MiqaatId};
    use crate::testing::{location, miqaat, team, FakeApi};

    fn api() -> FakeApi {
        let mut api = FakeApi::default()
            .with_member_count(1, 5)
            .with_member_count(2, 20)
            .with_member_count(3, 20);
        api.miqaats = vec![miqaat(1, 100, 1)];
        api.teams = vec![team(1, "Alpha"), team(2, "Bravo"), team(3, "Charlie")];
        api.locations = vec![location(1, "Main Gate")];
        api.remaining = 30;
        api
    }

    fn ready(api: &FakeApi, permission: Permission) -> DutyAssignment {
        let mut w = DutyAssignment::new(permission, CommitPolicy::default());
        let f = w.cascade.load_miqaats();
        block_on(w.cascade.settle(api, vec![f]));
        let f = w.select_miqaat(Some(miqaat(1, 100, 1)));
        block_on(w.cascade.settle(api, f));
        w.cascade.select_location(Some(location(1, "Main Gate")));
        w
    }

    fn pick(w: &mut DutyAssignment, api: &FakeApi, teams: &[usize]) {
        let chosen = teams.iter().map(|i| api.teams[*i].clone()).collect();
        let f = w.cascade.select_teams(chosen);
        block_on(w.cascade.settle(api, f));
    }

    #[test]
    fn gate_blocks_until_form_is_valid() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        assert!(!w.gate().can_submit());
        pick(&mut w, &api, &[1, 2]);
        w.set_quota_input("16");
        assert_eq!(
            w.gate().violations,
            vec![QuotaViolation::ExceedsRemaining { requested: 32, remaining: 30 }]
        );
        w.set_quota_input("15");
        assert!(w.gate().can_submit());
    }

    #[test]
    fn staging_consumes_remaining_quota() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[1]);
        w.set_quota_input("10");
        block_on(w.stage_selected(&api)).unwrap();
        pick(&mut w, &api, &[2]);
        w.set_quota_input("15");
        block_on(w.stage_selected(&api)).unwrap();
        assert_eq!(w.effective_remaining(), 5);

        pick(&mut w, &api, &[0]);
        w.set_quota_input("6");
        assert!(!w.gate().can_submit());
        assert!(block_on(w.stage_selected(&api)).is_err());
        w.set_quota_input("5");
        assert!(w.gate().can_submit());
        block_on(w.stage_selected(&api)).unwrap();
        assert_eq!(w.effective_remaining(), 0);
        assert!(w.quota_input().is_empty());
        assert!(w.cascade.teams().is_empty());
    }

    #[test]
    fn gate_flags_teams_already_staged() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[1]);
        w.set_quota_input("2");
        block_on(w.stage_selected(&api)).unwrap();
        pick(&mut w, &api, &[1, 2]);
        w.set_quota_input("2");
        let gate = w.gate();
        assert_eq!(gate.violations, vec![QuotaViolation::AlreadyAssigned { teams: vec!["Bravo".into()] }]);
    }

    #[test]
    fn switching_miqaat_during_count_fetch_voids_the_plan() {
        let mut api = api();
        api.miqaats.push(miqaat(2, 50, 1));
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[1]);
        w.set_quota_input("4");
        let plan = w.prepare_stage().unwrap();

        let f = w.select_miqaat(Some(miqaat(2, 50, 1)));
        block_on(w.cascade.settle(&api, f));
        w.cascade.select_location(Some(location(1, "Main Gate")));

        let err = w.finish_stage(plan, vec![(TeamId(2), Ok(20))]).unwrap_err();
        assert_eq!(err, StageError::Superseded);
        assert!(w.staging.is_empty());
        assert_eq!(w.cascade.miqaat().map(|m| m.id), Some(MiqaatId(2)));
    }

    #[test]
    fn clearing_the_miqaat_during_count_fetch_voids_the_plan() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[1]);
        w.set_quota_input("4");
        let plan = w.prepare_stage().unwrap();
        let _ = w.select_miqaat(None);
        assert_eq!(w.finish_stage(plan, Vec::new()), Err(StageError::Superseded));
    }

    #[test]
    fn new_miqaat_drops_staged_duties() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[1]);
        w.set_quota_input("2");
        block_on(w.stage_selected(&api)).unwrap();
        let _ = w.select_miqaat(None);
        assert!(w.staging.is_empty());
        assert_eq!(w.cascade.phase(), Phase::NoMiqaat);
    }

    #[test]
    fn unstage_goes_through_the_dialog() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[1]);
        w.set_quota_input("2");
        let id = block_on(w.stage_selected(&api)).unwrap()[0];
        w.request_unstage(id);
        assert!(w.confirm_unstage.is_open());
        w.confirm_unstage.cancel();
        assert!(!w.confirm_unstage());
        assert_eq!(w.staging.len(), 1);
        w.request_unstage(id);
        assert!(w.confirm_unstage());
        assert!(w.staging.is_empty());
    }

    #[test]
    fn commit_reports_partial_failure_and_refreshes_quota() {
        let api = api().with_outcomes(vec![
            Ok(Outcome::Success(ResultCode::Inserted)),
            Ok(Outcome::Duplicate("exists".into())),
            Ok(Outcome::Success(ResultCode::Inserted)),
        ]);
        let mut w = ready(&api, Permission::ALL);
        pick(&mut w, &api, &[0, 1, 2]);
        w.set_quota_input("2");
        block_on(w.stage_selected(&api)).unwrap();
        let (report, refresh) = block_on(w.commit(&api)).unwrap();
        assert_eq!((report.success_count, report.fail_count), (2, 1));
        assert_eq!(w.staging.items()[0].team.name, "Bravo");
        assert_eq!(refresh.len(), 2);
    }

    #[test]
    fn editing_checks_member_count_and_returns_original_quota() {
        let mut api = api();
        api.remaining = 0;
        let duty = Duty {
            id: DutyId(7),
            miqaat_id: MiqaatId(1),
            team_id: crate::ids::TeamId(1),
            team_name: "Alpha".into(),
            location_id: LocationId(1),
            location_name: "Main Gate".into(),
            quota: 4,
        };
        api.duties = vec![duty.clone()];
        let mut w = ready(&api, Permission::ALL);
        let f = w.begin_edit(duty).unwrap();
        block_on(w.cascade.settle(&api, f));
        assert_eq!(w.effective_remaining(), 4);

        w.set_quota_input("6");
        assert!(!w.gate().can_submit());
        w.set_quota_input("5");
        assert!(!w.gate().can_submit(), "5 > remaining 4");
        w.set_quota_input("3");
        assert!(w.gate().can_submit());

        block_on(w.save_edit(&api)).unwrap();
        let writes = api.writes();
        assert_eq!(writes[0].1, "/duty/7");
        assert!(w.cascade.editing().is_none());
    }

    #[test]
    fn edit_is_blocked_while_member_count_is_unknown() {
        let mut api = FakeApi::default();
        api.miqaats = vec![miqaat(1, 100, 1)];
        api.teams = vec![team(4, "Delta")];
        api.locations = vec![location(1, "Main Gate")];
        api.remaining = 100;
        let duty = Duty {
            id: DutyId(8),
            miqaat_id: MiqaatId(1),
            team_id: crate::ids::TeamId(4),
            team_name: "Delta".into(),
            location_id: LocationId(1),
            location_name: "Main Gate".into(),
            quota: 4,
        };
        api.duties = vec![duty.clone()];
        let mut w = ready(&api, Permission::ALL);
        let f = w.begin_edit(duty).unwrap();
        block_on(w.cascade.settle(&api, f));
        assert_eq!(w.cascade.member_count(crate::ids::TeamId(4)), None);

        w.set_quota_input("90");
        assert_eq!(w.gate().violations, vec![QuotaViolation::MemberCountUnknown]);
        assert!(w.edit_request().is_err());
        assert!(api.writes().is_empty());
    }

    #[test]
    fn delete_without_permission_never_reaches_the_backend() {
        let api = api();
        let rights = AccessRights::parse("[108]110");
        let perm = rights.permission(modules::DUTY);
        assert_eq!(perm, check_access("[108]110", "108", false));
        let mut w = ready(&api, perm);
        let duty = Duty {
            id: DutyId(1),
            miqaat_id: MiqaatId(1),
            team_id: crate::ids::TeamId(1),
            team_name: "Alpha".into(),
            location_id: LocationId(1),
            location_name: "Main Gate".into(),
            quota: 2,
        };
        let err = w.request_delete(&duty).unwrap_err();
        assert!(err.is_forbidden());
        assert!(!w.confirm_delete.is_open());

        let err = block_on(w.delete_saved(&api, crate::confirm::confirmed(DutyId(1)))).unwrap_err();
        assert!(err.is_forbidden());
        assert!(api.writes().is_empty());
    }

    #[test]
    fn view_only_users_cannot_stage_or_commit() {
        let api = api();
        let mut w = ready(&api, check_access("[108]000", "108", false));
        pick(&mut w, &api, &[1]);
        w.set_quota_input("2");
        assert!(matches!(block_on(w.stage_selected(&api)), Err(StageError::Denied(_))));
        assert!(block_on(w.commit(&api)).unwrap_err().is_forbidden());
        assert!(api.created().is_empty());
    }
}
