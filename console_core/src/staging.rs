//! Pending-duty staging list.
//!
//! Duties are staged locally, edited or removed freely, then saved in one
//! bulk pass. The bulk save is strictly sequential so the success and
//! failure counts always describe exactly what the server accepted.

use std::collections::HashMap;

use thiserror::Error;

use crate::api::{CatalogBackend, DutyBackend, Outcome};
use crate::confirm::Confirmed;
use crate::error::ConsoleError;
use crate::ids::{MiqaatId, TeamId, TempId};
use crate::model::{Duty, Location, PendingDuty, Team};
use crate::quota::{self, QuotaViolation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverMembers {
    pub team: String,
    pub member_count: u32,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum StageError {
    #[error("{0}")]
    Quota(QuotaViolation),
    #[error("Quota {quota} exceeds member count for: {}", format_over(.teams))]
    ExceedsMembers { quota: u32, teams: Vec<OverMembers> },
    #[error("Could not load member count for: {}", .teams.join(", "))]
    MemberCountUnavailable { teams: Vec<String> },
    #[error("Select a miqaat")]
    NoMiqaat,
    /// The miqaat changed or the list was cleared while counts were loading.
    #[error("The selection changed while member counts were loading; add the duty again")]
    Superseded,
    #[error(transparent)]
    Denied(ConsoleError),
}

fn format_over(teams: &[OverMembers]) -> String {
    teams
        .iter()
        .map(|t| format!("{} ({} members)", t.team, t.member_count))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<QuotaViolation> for StageError {
    fn from(v: QuotaViolation) -> Self {
        StageError::Quota(v)
    }
}

/// Server-side facts the staging checks run against.
#[derive(Clone, Copy, Debug)]
pub struct QuotaContext<'a> {
    pub miqaat_id: MiqaatId,
    pub server_remaining: i64,
    pub saved: &'a [Duty],
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageRequest {
    pub teams: Vec<Team>,
    pub location: Location,
    pub quota: u32,
}

/// A validated request waiting on member counts.
#[derive(Clone, Debug, PartialEq)]
pub struct StagePlan {
    miqaat_id: MiqaatId,
    generation: u64,
    request: StageRequest,
    missing: Vec<TeamId>,
}

impl StagePlan {
    pub fn missing_counts(&self) -> &[TeamId] {
        &self.missing
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CommitPolicy {
    /// Upper bound on requests per bulk save; `None` means unbounded.
    pub max_items: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemStatus {
    Saved,
    Duplicate(String),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemResult {
    pub temp_id: TempId,
    pub team: String,
    pub status: ItemStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitSummary {
    Nothing,
    AllSaved,
    Partial,
    AllFailed,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub duplicate_count: usize,
    /// Staged items left untouched because of the commit cap.
    pub deferred: usize,
    pub errors: Vec<(TempId, String)>,
    /// Set when the loop stopped early on an authentication failure.
    pub aborted: Option<ConsoleError>,
}

impl CommitReport {
    pub fn summary(&self) -> CommitSummary {
        match (self.success_count, self.fail_count) {
            (0, 0) => CommitSummary::Nothing,
            (_, 0) => CommitSummary::AllSaved,
            (0, _) => CommitSummary::AllFailed,
            _ => CommitSummary::Partial,
        }
    }

    pub fn message(&self) -> String {
        let mut msg = match self.summary() {
            CommitSummary::Nothing => "Nothing to save".to_string(),
            CommitSummary::AllSaved => format!("{} duties saved", self.success_count),
            CommitSummary::Partial => format!("{} saved, {} failed", self.success_count, self.fail_count),
            CommitSummary::AllFailed => format!("All {} duties failed to save", self.fail_count),
        };
        if self.deferred > 0 {
            msg.push_str(&format!(" ({} left for the next save)", self.deferred));
        }
        msg
    }
}

#[derive(Clone, Debug, Default)]
pub struct StagingList {
    items: Vec<PendingDuty>,
    next_id: u64,
    member_counts: HashMap<TeamId, u32>,
    /// Bumped by [`clear`](Self::clear); plans from an older list are void.
    generation: u64,
}

impl StagingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PendingDuty] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, temp_id: TempId) -> Option<&PendingDuty> {
        self.items.iter().find(|p| p.temp_id == temp_id)
    }

    pub fn staged_quota(&self) -> i64 {
        self.items.iter().map(|p| i64::from(p.quota)).sum()
    }

    pub fn cached_member_count(&self, team: TeamId) -> Option<u32> {
        self.member_counts.get(&team).copied()
    }

    pub fn remember_member_count(&mut self, team: TeamId, count: u32) {
        self.member_counts.insert(team, count);
    }

    /// Drops every staged record. The member-count cache survives; it is
    /// keyed by team, not by miqaat.
    pub fn clear(&mut self) {
        self.items.clear();
        self.generation += 1;
    }

    fn check_fits(&self, ctx: QuotaContext<'_>, request: &StageRequest) -> Result<(), StageError> {
        let dupes = quota::find_duplicates(&request.teams, &self.items, ctx.saved, None);
        if !dupes.is_empty() {
            return Err(QuotaViolation::AlreadyAssigned { teams: dupes }.into());
        }
        let effective = quota::effective_remaining(ctx.server_remaining, &self.items, None);
        quota::validate_add(request.teams.len(), request.quota, effective)?;
        Ok(())
    }

    /// Synchronous half of [`stage`](Self::stage): duplicate and remaining
    /// quota checks, plus the list of teams whose member count is unknown.
    pub fn prepare_stage(&self, ctx: QuotaContext<'_>, request: StageRequest) -> Result<StagePlan, StageError> {
        if request.teams.is_empty() {
            return Err(QuotaViolation::NoTeamSelected.into());
        }
        if request.quota == 0 {
            return Err(QuotaViolation::NotPositive.into());
        }
        self.check_fits(ctx, &request)?;

        let missing = request
            .teams
            .iter()
            .filter(|t| t.member_count.is_none() && !self.member_counts.contains_key(&t.id))
            .map(|t| t.id)
            .collect();
        Ok(StagePlan { miqaat_id: ctx.miqaat_id, generation: self.generation, request, missing })
    }

    /// Second half: applies fetched counts, re-checks the plan against the
    /// list as it is now, then either stages every team or rejects the
    /// whole batch.
    pub fn finish_stage(
        &mut self,
        ctx: QuotaContext<'_>,
        plan: StagePlan,
        fetched: Vec<(TeamId, Result<u32, ConsoleError>)>,
    ) -> Result<Vec<TempId>, StageError> {
        let mut unavailable = Vec::new();
        for (team, count) in fetched {
            match count {
                Ok(n) => {
                    self.member_counts.insert(team, n);
                }
                Err(err) => {
                    log::error!("member count for team {team} failed: {err}");
                    unavailable.push(team);
                }
            }
        }

        if plan.generation != self.generation || plan.miqaat_id != ctx.miqaat_id {
            log::debug!("dropped stage plan for miqaat {}", plan.miqaat_id);
            return Err(StageError::Superseded);
        }
        self.check_fits(ctx, &plan.request)?;

        let StagePlan { miqaat_id, request, .. } = plan;
        let counts: Vec<Option<u32>> = request
            .teams
            .iter()
            .map(|t| self.member_counts.get(&t.id).copied().or(t.member_count))
            .collect();

        let missing: Vec<String> = request
            .teams
            .iter()
            .zip(&counts)
            .filter(|(t, c)| c.is_none() || unavailable.contains(&t.id))
            .map(|(t, _)| t.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(StageError::MemberCountUnavailable { teams: missing });
        }

        let over: Vec<OverMembers> = request
            .teams
            .iter()
            .zip(&counts)
            .filter_map(|(t, c)| {
                let member_count = c.unwrap_or(0);
                (request.quota > member_count).then(|| OverMembers { team: t.name.clone(), member_count })
            })
            .collect();
        if !over.is_empty() {
            return Err(StageError::ExceedsMembers { quota: request.quota, teams: over });
        }

        let mut staged = Vec::with_capacity(request.teams.len());
        for (team, count) in request.teams.into_iter().zip(counts) {
            self.next_id += 1;
            let temp_id = TempId(self.next_id);
            self.items.push(PendingDuty {
                temp_id,
                miqaat_id,
                team,
                location: request.location.clone(),
                quota: request.quota,
                member_count: count.unwrap_or(0),
            });
            staged.push(temp_id);
        }
        log::debug!("staged {} duties, {} pending in total", staged.len(), self.items.len());
        Ok(staged)
    }

    pub async fn stage<C>(
        &mut self,
        catalog: &C,
        ctx: QuotaContext<'_>,
        request: StageRequest,
    ) -> Result<Vec<TempId>, StageError>
    where
        C: CatalogBackend + ?Sized,
    {
        let plan = self.prepare_stage(ctx, request)?;
        let mut fetched = Vec::with_capacity(plan.missing.len());
        for team in plan.missing.clone() {
            fetched.push((team, catalog.team_member_count(team).await));
        }
        self.finish_stage(ctx, plan, fetched)
    }

    /// In-place quota edit. Invalid values are ignored and `false` returned.
    pub fn update_quota(&mut self, temp_id: TempId, new_quota: u32, server_remaining: i64) -> bool {
        let others: i64 = self
            .items
            .iter()
            .filter(|p| p.temp_id != temp_id)
            .map(|p| i64::from(p.quota))
            .sum();
        let Some(item) = self.items.iter_mut().find(|p| p.temp_id == temp_id) else {
            return false;
        };
        if new_quota == 0 || new_quota > item.member_count || i64::from(new_quota) > server_remaining - others {
            log::debug!("ignored quota {new_quota} for staged {temp_id:?}");
            return false;
        }
        item.quota = new_quota;
        true
    }

    pub fn unstage(&mut self, confirmed: Confirmed<TempId>) -> Option<PendingDuty> {
        let temp_id = confirmed.into_inner();
        let idx = self.items.iter().position(|p| p.temp_id == temp_id)?;
        Some(self.items.remove(idx))
    }

    /// Snapshot of what the next bulk save will send, in staging order.
    pub fn commit_batch(&self, policy: CommitPolicy) -> Vec<PendingDuty> {
        let take = policy.max_items.unwrap_or(self.items.len());
        self.items.iter().take(take).cloned().collect()
    }

    /// Removes the saved records and turns per-item results into a report.
    pub fn settle(&mut self, results: Vec<ItemResult>, aborted: Option<ConsoleError>) -> CommitReport {
        let mut report = CommitReport { aborted, ..CommitReport::default() };
        for result in results {
            match result.status {
                ItemStatus::Saved => {
                    self.items.retain(|p| p.temp_id != result.temp_id);
                    report.success_count += 1;
                }
                ItemStatus::Duplicate(msg) => {
                    report.fail_count += 1;
                    report.duplicate_count += 1;
                    report.errors.push((result.temp_id, format!("{}: {msg}", result.team)));
                }
                ItemStatus::Failed(msg) => {
                    report.fail_count += 1;
                    report.errors.push((result.temp_id, format!("{}: {msg}", result.team)));
                }
            }
        }
        report.deferred = self.items.len().saturating_sub(report.fail_count);
        log::info!(
            "bulk save: {} saved, {} failed, {} deferred",
            report.success_count,
            report.fail_count,
            report.deferred
        );
        report
    }

    pub async fn commit_all<B>(&mut self, backend: &B, policy: CommitPolicy) -> CommitReport
    where
        B: DutyBackend + ?Sized,
    {
        let batch = self.commit_batch(policy);
        let (results, aborted) = run_commit(backend, &batch).await;
        self.settle(results, aborted)
    }
}

/// Posts each staged duty in order, awaiting each before the next.
/// Stops early only on an authentication failure.
pub async fn run_commit<B>(backend: &B, batch: &[PendingDuty]) -> (Vec<ItemResult>, Option<ConsoleError>)
where
    B: DutyBackend + ?Sized,
{
    let mut results = Vec::with_capacity(batch.len());
    for item in batch {
        let status = match backend.create_duty(&item.draft()).await {
            Ok(Outcome::Success(_)) => ItemStatus::Saved,
            Ok(Outcome::Duplicate(msg)) => ItemStatus::Duplicate(msg),
            Ok(Outcome::NotFound(msg)) | Ok(Outcome::Failure(msg)) => ItemStatus::Failed(msg),
            Err(err) if err.requires_logout() => {
                log::warn!("bulk save stopped: {err}");
                results.push(ItemResult {
                    temp_id: item.temp_id,
                    team: item.team.name.clone(),
                    status: ItemStatus::Failed(err.user_message()),
                });
                return (results, Some(err));
            }
            Err(err) => {
                log::error!("saving duty for {} failed: {err}", item.team.name);
                ItemStatus::Failed(err.user_message())
            }
        };
        results.push(ItemResult { temp_id: item.temp_id, team: item.team.name.clone(), status });
    }
    (results, None)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::api::ResultCode;
    use crate::confirm::confirmed;
    use crate::error::AuthError;
    use crate::ids::{DutyId, LocationId};
    use crate::testing::{location, team, FakeApi};

    fn ctx(saved: &[Duty], remaining: i64) -> QuotaContext<'_> {
        QuotaContext { miqaat_id: MiqaatId(1), server_remaining: remaining, saved }
    }

    fn request(teams: Vec<Team>, quota: u32) -> StageRequest {
        StageRequest { teams, location: location(1, "Main Gate"), quota }
    }

    #[test]
    fn quota_above_member_count_is_rejected() {
        let api = FakeApi::default().with_member_count(1, 5);
        let mut list = StagingList::new();

        let err = block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "Alpha")], 6))).unwrap_err();
        assert_eq!(
            err,
            StageError::ExceedsMembers { quota: 6, teams: vec![OverMembers { team: "Alpha".into(), member_count: 5 }] }
        );
        assert!(list.is_empty());

        let ids = block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "Alpha")], 5))).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(list.items()[0].member_count, 5);
    }

    #[test]
    fn remaining_quota_accounts_for_pending() {
        let api = FakeApi::default()
            .with_member_count(1, 50)
            .with_member_count(2, 50)
            .with_member_count(3, 50);
        let mut list = StagingList::new();
        block_on(list.stage(&api, ctx(&[], 30), request(vec![team(1, "A")], 10))).unwrap();
        block_on(list.stage(&api, ctx(&[], 30), request(vec![team(2, "B")], 15))).unwrap();
        assert_eq!(quota::effective_remaining(30, list.items(), None), 5);

        let err = block_on(list.stage(&api, ctx(&[], 30), request(vec![team(3, "C")], 6))).unwrap_err();
        assert_eq!(err, StageError::Quota(QuotaViolation::ExceedsRemaining { requested: 6, remaining: 5 }));
        block_on(list.stage(&api, ctx(&[], 30), request(vec![team(3, "C")], 5))).unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn one_bad_team_rejects_the_whole_batch() {
        let api = FakeApi::default().with_member_count(1, 10).with_member_count(2, 3);
        let mut list = StagingList::new();
        let err = block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "A"), team(2, "B")], 4))).unwrap_err();
        assert!(matches!(err, StageError::ExceedsMembers { ref teams, .. } if teams.len() == 1 && teams[0].team == "B"));
        assert!(list.is_empty());
    }

    #[test]
    fn member_counts_are_fetched_once() {
        let api = FakeApi::default().with_member_count(1, 10);
        let mut list = StagingList::new();
        block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "A")], 2))).unwrap();
        let first = list.items()[0].temp_id;
        list.unstage(confirmed(first));
        block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "A")], 3))).unwrap();
        assert_eq!(api.count_calls(), 1);
    }

    #[test]
    fn unavailable_member_count_blocks_staging() {
        let api = FakeApi::default();
        let mut list = StagingList::new();
        let err = block_on(list.stage(&api, ctx(&[], 100), request(vec![team(9, "Nine")], 2))).unwrap_err();
        assert_eq!(err, StageError::MemberCountUnavailable { teams: vec!["Nine".into()] });
    }

    #[test]
    fn staged_or_saved_teams_are_duplicates() {
        let api = FakeApi::default().with_member_count(1, 10).with_member_count(2, 10);
        let saved = vec![Duty {
            id: DutyId(3),
            miqaat_id: MiqaatId(1),
            team_id: crate::ids::TeamId(2),
            team_name: "B".into(),
            location_id: LocationId(4),
            location_name: "Hall".into(),
            quota: 2,
        }];
        let mut list = StagingList::new();
        block_on(list.stage(&api, ctx(&saved, 100), request(vec![team(1, "A")], 2))).unwrap();
        let err = block_on(list.stage(&api, ctx(&saved, 100), request(vec![team(1, "A"), team(2, "B")], 2))).unwrap_err();
        assert_eq!(err, StageError::Quota(QuotaViolation::AlreadyAssigned { teams: vec!["A".into(), "B".into()] }));
    }

    #[test]
    fn interleaved_plans_cannot_stage_a_team_twice() {
        let mut list = StagingList::new();
        let first = list.prepare_stage(ctx(&[], 30), request(vec![team(1, "A")], 20)).unwrap();
        let second = list.prepare_stage(ctx(&[], 30), request(vec![team(1, "A")], 20)).unwrap();

        list.finish_stage(ctx(&[], 30), first, vec![(TeamId(1), Ok(40))]).unwrap();
        let err = list.finish_stage(ctx(&[], 30), second, Vec::new()).unwrap_err();
        assert_eq!(err, StageError::Quota(QuotaViolation::AlreadyAssigned { teams: vec!["A".into()] }));
        assert_eq!(list.staged_quota(), 20);
    }

    #[test]
    fn interleaved_plans_cannot_overrun_remaining_quota() {
        let mut list = StagingList::new();
        let first = list.prepare_stage(ctx(&[], 30), request(vec![team(1, "A")], 20)).unwrap();
        let second = list.prepare_stage(ctx(&[], 30), request(vec![team(2, "B")], 20)).unwrap();

        list.finish_stage(ctx(&[], 30), first, vec![(TeamId(1), Ok(40))]).unwrap();
        let err = list.finish_stage(ctx(&[], 30), second, vec![(TeamId(2), Ok(40))]).unwrap_err();
        assert_eq!(err, StageError::Quota(QuotaViolation::ExceedsRemaining { requested: 20, remaining: 10 }));
        assert_eq!(list.len(), 1);
        // The count fetched for the rejected plan is still cached.
        assert_eq!(list.cached_member_count(TeamId(2)), Some(40));
    }

    #[test]
    fn plan_from_before_a_clear_is_dropped() {
        let mut list = StagingList::new();
        let plan = list.prepare_stage(ctx(&[], 30), request(vec![team(1, "A")], 2)).unwrap();
        list.clear();
        let err = list.finish_stage(ctx(&[], 30), plan, vec![(TeamId(1), Ok(10))]).unwrap_err();
        assert_eq!(err, StageError::Superseded);
        assert!(list.is_empty());
    }

    #[test]
    fn plan_for_another_miqaat_is_dropped() {
        let mut list = StagingList::new();
        let plan = list.prepare_stage(ctx(&[], 30), request(vec![team(1, "A")], 2)).unwrap();
        let now = QuotaContext { miqaat_id: MiqaatId(2), server_remaining: 30, saved: &[] };
        assert_eq!(list.finish_stage(now, plan, vec![(TeamId(1), Ok(10))]), Err(StageError::Superseded));
    }

    #[test]
    fn temp_ids_are_monotonic_and_unique() {
        let api = FakeApi::default().with_member_count(1, 10).with_member_count(2, 10);
        let mut list = StagingList::new();
        let a = block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "A")], 1))).unwrap();
        list.unstage(confirmed(a[0]));
        let b = block_on(list.stage(&api, ctx(&[], 100), request(vec![team(1, "A"), team(2, "B")], 1))).unwrap();
        assert!(b.iter().all(|id| *id > a[0]));
        assert_ne!(b[0], b[1]);
    }

    #[test]
    fn update_quota_ignores_invalid_values() {
        let api = FakeApi::default().with_member_count(1, 5).with_member_count(2, 50);
        let mut list = StagingList::new();
        let a = block_on(list.stage(&api, ctx(&[], 20), request(vec![team(1, "A")], 2))).unwrap()[0];
        block_on(list.stage(&api, ctx(&[], 20), request(vec![team(2, "B")], 10))).unwrap();

        assert!(!list.update_quota(a, 6, 20), "above member count");
        assert!(!list.update_quota(a, 0, 20), "zero");
        assert!(!list.update_quota(TempId(999), 1, 20), "unknown id");
        assert_eq!(list.get(a).unwrap().quota, 2);

        assert!(list.update_quota(a, 5, 20));
        assert_eq!(list.get(a).unwrap().quota, 5);
        assert!(!list.update_quota(a, 5, 14), "remaining would go negative");
    }

    #[test]
    fn unstage_needs_a_confirmation_token() {
        let api = FakeApi::default().with_member_count(1, 5);
        let mut list = StagingList::new();
        let id = block_on(list.stage(&api, ctx(&[], 20), request(vec![team(1, "A")], 2))).unwrap()[0];
        let removed = list.unstage(confirmed(id)).unwrap();
        assert_eq!(removed.team.name, "A");
        assert!(list.unstage(confirmed(id)).is_none());
    }

    fn stage_three(api: &FakeApi, list: &mut StagingList) {
        for (id, name) in [(1, "A"), (2, "B"), (3, "C")] {
            block_on(list.stage(api, ctx(&[], 100), request(vec![team(id, name)], 2))).unwrap();
        }
    }

    #[test]
    fn commit_keeps_only_failed_items() {
        let api = FakeApi::default()
            .with_member_count(1, 10)
            .with_member_count(2, 10)
            .with_member_count(3, 10)
            .with_outcomes(vec![
                Ok(Outcome::Success(ResultCode::Inserted)),
                Ok(Outcome::Duplicate("Duty already exists".into())),
                Ok(Outcome::Success(ResultCode::Inserted)),
            ]);
        let mut list = StagingList::new();
        stage_three(&api, &mut list);

        let report = block_on(list.commit_all(&api, CommitPolicy::default()));
        assert_eq!(report.success_count, 2);
        assert_eq!(report.fail_count, 1);
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.summary(), CommitSummary::Partial);
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].team.name, "B");
        assert_eq!(api.created().iter().map(|d| d.team_id.get()).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn transport_errors_count_as_failures() {
        let api = FakeApi::default()
            .with_member_count(1, 10)
            .with_member_count(2, 10)
            .with_member_count(3, 10)
            .with_outcomes(vec![
                Err(ConsoleError::Transport("reset".into())),
                Ok(Outcome::Success(ResultCode::Inserted)),
                Ok(Outcome::Failure("Invalid location".into())),
            ]);
        let mut list = StagingList::new();
        stage_three(&api, &mut list);
        let report = block_on(list.commit_all(&api, CommitPolicy::default()));
        assert_eq!((report.success_count, report.fail_count), (1, 2));
        assert_eq!(list.len(), 2);
        assert!(report.aborted.is_none());
    }

    #[test]
    fn auth_failure_stops_the_loop() {
        let api = FakeApi::default()
            .with_member_count(1, 10)
            .with_member_count(2, 10)
            .with_member_count(3, 10)
            .with_outcomes(vec![Ok(Outcome::Success(ResultCode::Inserted)), Err(AuthError::Rejected.into())]);
        let mut list = StagingList::new();
        stage_three(&api, &mut list);
        let report = block_on(list.commit_all(&api, CommitPolicy::default()));
        assert_eq!(api.created().len(), 2);
        assert_eq!(report.success_count, 1);
        assert!(report.aborted.as_ref().is_some_and(ConsoleError::requires_logout));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn commit_cap_defers_the_rest() {
        let api = FakeApi::default()
            .with_member_count(1, 10)
            .with_member_count(2, 10)
            .with_member_count(3, 10);
        let mut list = StagingList::new();
        stage_three(&api, &mut list);
        let report = block_on(list.commit_all(&api, CommitPolicy { max_items: Some(2) }));
        assert_eq!(report.success_count, 2);
        assert_eq!(report.deferred, 1);
        assert_eq!(report.summary(), CommitSummary::AllSaved);
        assert!(report.message().contains("1 left"));
        assert_eq!(list.items()[0].team.name, "C");
    }

    #[test]
    fn empty_commit_reports_nothing() {
        let api = FakeApi::default();
        let mut list = StagingList::new();
        let report = block_on(list.commit_all(&api, CommitPolicy::default()));
        assert_eq!(report.summary(), CommitSummary::Nothing);
        assert!(api.created().is_empty());
    }
}
