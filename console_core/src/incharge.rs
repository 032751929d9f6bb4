//! Incharge assignment: one member put in charge of one location for a
//! miqaat. Shares the dropdown cascade with duty assignment, down to the
//! member level.

use crate::access::{modules, Action, ModuleId, Permission};
use crate::api::{InchargeBackend, ResultCode};
use crate::cascade::{Cascade, Fetch, Mode};
use crate::confirm::{ConfirmDialog, Confirmed, Variant};
use crate::error::ConsoleError;
use crate::grid::{Cell, GridRow};
use crate::ids::{InchargeId, MiqaatId};
use crate::model::{Incharge, InchargeDraft, Miqaat, MiqaatHandoff};

/// Ticketed request for the incharge list of a miqaat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListFetch {
    pub miqaat: MiqaatId,
    generation: u64,
}

impl GridRow for Incharge {
    const COLUMNS: &'static [&'static str] = &["Location", "ITS", "Name"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::opt_text(Some(&self.location_name)),
            1 => Cell::text(self.its_id.as_str()),
            2 => Cell::opt_text(Some(&self.full_name)),
            _ => Cell::Empty,
        }
    }
}

pub struct InchargeAssignment {
    pub cascade: Cascade,
    pub confirm_delete: ConfirmDialog<InchargeId>,
    saved: Vec<Incharge>,
    list_generation: u64,
    permission: Permission,
}

impl InchargeAssignment {
    pub fn new(permission: Permission) -> Self {
        Self {
            cascade: Cascade::new(Mode::Incharge),
            confirm_delete: ConfirmDialog::new(Variant::Danger),
            saved: Vec::new(),
            list_generation: 0,
            permission,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    fn require(&self, action: Action) -> Result<(), ConsoleError> {
        if self.permission.allows(action) {
            Ok(())
        } else {
            Err(ConsoleError::Forbidden { module: ModuleId::from(modules::INCHARGE), action })
        }
    }

    pub fn saved(&self) -> &[Incharge] {
        &self.saved
    }

    pub fn select_miqaat(&mut self, miqaat: Option<Miqaat>) -> Vec<Fetch> {
        if self.cascade.is_locked() {
            return Vec::new();
        }
        self.saved.clear();
        self.list_generation += 1;
        self.cascade.select_miqaat(miqaat)
    }

    pub fn apply_handoff(&mut self, handoff: &MiqaatHandoff) -> Vec<Fetch> {
        let fetches = self.cascade.apply_handoff(handoff);
        if !fetches.is_empty() {
            self.saved.clear();
            self.list_generation += 1;
        }
        fetches
    }

    /// The list request for the selected miqaat, if any.
    pub fn list_fetch(&mut self) -> Option<ListFetch> {
        let miqaat = self.cascade.miqaat()?.id;
        self.list_generation += 1;
        Some(ListFetch { miqaat, generation: self.list_generation })
    }

    pub fn apply_list(&mut self, fetch: ListFetch, result: Result<Vec<Incharge>, ConsoleError>) -> bool {
        if fetch.generation != self.list_generation {
            return false;
        }
        match result {
            Ok(rows) => self.saved = rows,
            Err(err) => {
                log::error!("incharge list for miqaat {} failed: {err}", fetch.miqaat);
                self.saved.clear();
            }
        }
        true
    }

    pub async fn refresh<B>(&mut self, backend: &B)
    where
        B: InchargeBackend + ?Sized,
    {
        if let Some(fetch) = self.list_fetch() {
            let result = backend.incharges(fetch.miqaat).await;
            self.apply_list(fetch, result);
        }
    }

    /// Field errors; empty means the form can be submitted.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.cascade.miqaat().is_none() {
            errors.push("Select a miqaat".to_string());
        }
        if self.cascade.location().is_none() {
            errors.push("Select a location".to_string());
        }
        match self.cascade.member() {
            None => errors.push("Select a member".to_string()),
            Some(member) => {
                if let Some(location) = self.cascade.location() {
                    let taken = self
                        .saved
                        .iter()
                        .any(|i| i.its_id == member.its_id && i.location_id == location.id);
                    if taken {
                        errors.push(format!("{} is already incharge of {}", member.full_name, location.name));
                    }
                }
            }
        }
        errors
    }

    pub fn draft(&self) -> Result<InchargeDraft, ConsoleError> {
        self.require(Action::Add)?;
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ConsoleError::Validation(errors));
        }
        match (self.cascade.miqaat(), self.cascade.location(), self.cascade.member()) {
            (Some(m), Some(l), Some(member)) => {
                Ok(InchargeDraft { miqaat_id: m.id, location_id: l.id, its_id: member.its_id.clone() })
            }
            _ => Err(ConsoleError::Validation(vec!["Incomplete form".to_string()])),
        }
    }

    pub async fn save<B>(&mut self, backend: &B) -> Result<ResultCode, ConsoleError>
    where
        B: InchargeBackend + ?Sized,
    {
        let draft = self.draft()?;
        let code = backend.create_incharge(&draft).await?.into_result()?;
        log::info!("incharge {} assigned to location {}", draft.its_id, draft.location_id);
        if let Some(fetch) = self.after_save() {
            let result = backend.incharges(fetch.miqaat).await;
            self.apply_list(fetch, result);
        }
        Ok(code)
    }

    /// Clears the member pick and asks for a fresh list.
    pub fn after_save(&mut self) -> Option<ListFetch> {
        self.cascade.select_member(None);
        self.list_fetch()
    }

    pub fn request_delete(&mut self, incharge: &Incharge) -> Result<(), ConsoleError> {
        self.require(Action::Delete)?;
        let message = format!("Remove {} as incharge of {}?", incharge.full_name, incharge.location_name);
        self.confirm_delete.open(incharge.id, "Remove incharge", message);
        Ok(())
    }

    pub fn delete_target(&self, confirmed: Confirmed<InchargeId>) -> Result<InchargeId, ConsoleError> {
        self.require(Action::Delete)?;
        Ok(confirmed.into_inner())
    }

    pub fn remove_saved(&mut self, id: InchargeId) {
        self.saved.retain(|i| i.id != id);
    }

    pub async fn delete<B>(&mut self, backend: &B, confirmed: Confirmed<InchargeId>) -> Result<(), ConsoleError>
    where
        B: InchargeBackend + ?Sized,
    {
        let id = self.delete_target(confirmed)?;
        backend.delete_incharge(id).await?.into_result()?;
        self.remove_saved(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::api::Outcome;
    use crate::confirm::confirmed;
    use crate::ids::{ItsId, LocationId, TeamId};
    use crate::testing::{location, member, miqaat, team, FakeApi};

    fn api() -> FakeApi {
        let mut api = FakeApi::default();
        api.miqaats = vec![miqaat(1, 50, 1)];
        api.teams = vec![team(1, "Alpha")];
        api.locations = vec![location(1, "Main Gate"), location(2, "Hall")];
        api.members.insert(TeamId(1), vec![member("30123456", "Ali", 1), member("30654321", "Zahra", 1)]);
        api.incharges = vec![Incharge {
            id: InchargeId(9),
            miqaat_id: MiqaatId(1),
            location_id: LocationId(1),
            location_name: "Main Gate".into(),
            its_id: ItsId::parse("30123456").unwrap(),
            full_name: "Ali".into(),
        }];
        api
    }

    fn ready(api: &FakeApi, permission: Permission) -> InchargeAssignment {
        let mut w = InchargeAssignment::new(permission);
        let f = w.select_miqaat(Some(miqaat(1, 50, 1)));
        block_on(w.cascade.settle(api, f));
        block_on(w.refresh(api));
        let f = w.cascade.select_teams(vec![team(1, "Alpha")]);
        block_on(w.cascade.settle(api, f));
        w
    }

    #[test]
    fn team_selection_loads_members() {
        let api = api();
        let w = ready(&api, Permission::ALL);
        assert_eq!(w.cascade.member_options().len(), 2);
        assert_eq!(w.saved().len(), 1);
        assert!(w.cascade.remaining_quota().is_none());
    }

    #[test]
    fn same_member_cannot_hold_the_same_location_twice() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        w.cascade.select_location(Some(location(1, "Main Gate")));
        let ali = w.cascade.member_options()[0].clone();
        w.cascade.select_member(Some(ali));
        assert_eq!(w.validate().len(), 1);
        assert!(matches!(w.draft(), Err(ConsoleError::Validation(_))));

        w.cascade.select_location(Some(location(2, "Hall")));
        assert!(w.validate().is_empty());
        block_on(w.save(&api)).unwrap();
        assert_eq!(api.writes()[0].1, "/incharge");
        assert!(w.cascade.member().is_none());
    }

    #[test]
    fn stale_list_results_are_ignored() {
        let api = api();
        let mut w = ready(&api, Permission::ALL);
        let old = w.list_fetch().unwrap();
        let _ = w.select_miqaat(None);
        assert!(!w.apply_list(old, Ok(api.incharges.clone())));
        assert!(w.saved().is_empty());
    }

    #[test]
    fn delete_needs_permission_and_removes_the_row() {
        let api = api().with_outcomes(vec![Ok(Outcome::Success(ResultCode::Deleted))]);
        let mut w = ready(&api, Permission { can_delete: false, ..Permission::ALL });
        let row = w.saved()[0].clone();
        assert!(w.request_delete(&row).unwrap_err().is_forbidden());
        assert!(block_on(w.delete(&api, confirmed(row.id))).is_err());
        assert!(api.writes().is_empty());

        let mut w = ready(&api, Permission::ALL);
        w.request_delete(&row).unwrap();
        let token = w.confirm_delete.confirm().unwrap();
        block_on(w.delete(&api, token)).unwrap();
        assert!(w.saved().is_empty());
    }
}
