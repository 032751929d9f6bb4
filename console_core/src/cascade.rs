//! Dependent-dropdown cascade: Miqaat → Jamiaat → Team → Location → Member.
//!
//! The controller never performs I/O. Each selection returns the fetches
//! it needs as [`Fetch`] values; the caller runs them (independently, in
//! any order) and hands each result back to [`Cascade::apply`]. Every fetch
//! carries a ticket; a result whose ticket has been superseded by a later
//! selection is dropped, so a slow response can never overwrite newer
//! state.

use std::collections::HashMap;

use crate::api::CatalogBackend;
use crate::error::ConsoleError;
use crate::ids::{JamiaatId, MiqaatId, TeamId, VenueId};
use crate::model::{Duty, Jamiaat, Location, Member, Miqaat, MiqaatHandoff, Team};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Miqaats,
    Jamiaats,
    Teams,
    Locations,
    RemainingQuota,
    Duties,
    MemberCount(TeamId),
    Members,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Miqaats,
    Jamiaats,
    Teams(Option<JamiaatId>),
    Locations(VenueId),
    RemainingQuota(MiqaatId),
    Duties(MiqaatId),
    MemberCount(TeamId),
    Members(TeamId),
}

impl FetchKind {
    fn slot(&self) -> Slot {
        match self {
            FetchKind::Miqaats => Slot::Miqaats,
            FetchKind::Jamiaats => Slot::Jamiaats,
            FetchKind::Teams(_) => Slot::Teams,
            FetchKind::Locations(_) => Slot::Locations,
            FetchKind::RemainingQuota(_) => Slot::RemainingQuota,
            FetchKind::Duties(_) => Slot::Duties,
            FetchKind::MemberCount(team) => Slot::MemberCount(*team),
            FetchKind::Members(_) => Slot::Members,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetch {
    pub kind: FetchKind,
    pub ticket: Ticket,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Fetched {
    Miqaats(Vec<Miqaat>),
    Jamiaats(Vec<Jamiaat>),
    Teams(Vec<Team>),
    Locations(Vec<Location>),
    RemainingQuota(i64),
    Duties(Vec<Duty>),
    MemberCount(u32),
    Members(Vec<Member>),
}

/// Runs one fetch against the backend.
pub async fn run_fetch<C>(catalog: &C, kind: &FetchKind) -> Result<Fetched, ConsoleError>
where
    C: CatalogBackend + ?Sized,
{
    Ok(match kind {
        FetchKind::Miqaats => Fetched::Miqaats(catalog.miqaats().await?),
        FetchKind::Jamiaats => Fetched::Jamiaats(catalog.jamiaats().await?),
        FetchKind::Teams(jamiaat) => Fetched::Teams(catalog.teams(*jamiaat).await?),
        FetchKind::Locations(venue) => Fetched::Locations(catalog.locations(*venue).await?),
        FetchKind::RemainingQuota(miqaat) => Fetched::RemainingQuota(catalog.remaining_quota(*miqaat).await?),
        FetchKind::Duties(miqaat) => Fetched::Duties(catalog.duties(*miqaat).await?),
        FetchKind::MemberCount(team) => Fetched::MemberCount(catalog.team_member_count(*team).await?),
        FetchKind::Members(team) => Fetched::Members(catalog.team_members(*team).await?),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    /// Multi-select teams, stage then bulk save.
    Add,
    /// Overlay on one persisted duty; miqaat locked, single team.
    Edit { duty: Duty },
    /// Incharge assignment; single team, members fetched per team.
    Incharge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NoMiqaat,
    MiqaatSelected,
}

/// Borrowed snapshot of what a cascade form renders.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeState<'a> {
    pub phase: Phase,
    pub locked: bool,
    pub single_team: bool,
    pub editing: Option<&'a Duty>,
    pub miqaat: Option<&'a Miqaat>,
    pub jamiaat: Option<&'a Jamiaat>,
    pub teams: &'a [Team],
    pub location: Option<&'a Location>,
    pub member: Option<&'a Member>,
    pub remaining_quota: Option<i64>,
    pub loading: Vec<Slot>,
}

#[derive(Clone, Debug)]
pub struct Cascade {
    mode: Mode,
    locked: bool,
    handoff_consumed: bool,

    miqaat_options: Vec<Miqaat>,
    miqaat: Option<Miqaat>,
    jamiaat: Option<Jamiaat>,
    teams: Vec<Team>,
    location: Option<Location>,
    member: Option<Member>,

    jamiaat_options: Vec<Jamiaat>,
    team_options: Vec<Team>,
    location_options: Vec<Location>,
    member_options: Vec<Member>,
    remaining_quota: Option<i64>,
    duties: Vec<Duty>,
    member_counts: HashMap<TeamId, u32>,

    in_flight: HashMap<Slot, u64>,
    generation: u64,
}

impl Cascade {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            locked: false,
            handoff_consumed: false,
            miqaat_options: Vec::new(),
            miqaat: None,
            jamiaat: None,
            teams: Vec::new(),
            location: None,
            member: None,
            jamiaat_options: Vec::new(),
            team_options: Vec::new(),
            location_options: Vec::new(),
            member_options: Vec::new(),
            remaining_quota: None,
            duties: Vec::new(),
            member_counts: HashMap::new(),
            in_flight: HashMap::new(),
            generation: 0,
        }
    }

    /* ----------------------------- accessors ---------------------------- */

    pub fn phase(&self) -> Phase {
        if self.miqaat.is_some() {
            Phase::MiqaatSelected
        } else {
            Phase::NoMiqaat
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_single_team(&self) -> bool {
        !matches!(self.mode, Mode::Add)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn miqaat_options(&self) -> &[Miqaat] {
        &self.miqaat_options
    }

    pub fn miqaat(&self) -> Option<&Miqaat> {
        self.miqaat.as_ref()
    }

    pub fn jamiaat(&self) -> Option<&Jamiaat> {
        self.jamiaat.as_ref()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn member(&self) -> Option<&Member> {
        self.member.as_ref()
    }

    pub fn jamiaat_options(&self) -> &[Jamiaat] {
        &self.jamiaat_options
    }

    pub fn team_options(&self) -> &[Team] {
        &self.team_options
    }

    pub fn location_options(&self) -> &[Location] {
        &self.location_options
    }

    pub fn member_options(&self) -> &[Member] {
        &self.member_options
    }

    pub fn remaining_quota(&self) -> Option<i64> {
        self.remaining_quota
    }

    pub fn saved_duties(&self) -> &[Duty] {
        &self.duties
    }

    pub fn member_count(&self, team: TeamId) -> Option<u32> {
        self.member_counts.get(&team).copied()
    }

    pub fn is_loading(&self, slot: Slot) -> bool {
        self.in_flight.contains_key(&slot)
    }

    pub fn state(&self) -> CascadeState<'_> {
        let mut loading: Vec<Slot> = self.in_flight.keys().copied().collect();
        loading.sort();
        CascadeState {
            phase: self.phase(),
            locked: self.locked,
            single_team: self.is_single_team(),
            editing: self.editing(),
            miqaat: self.miqaat.as_ref(),
            jamiaat: self.jamiaat.as_ref(),
            teams: &self.teams,
            location: self.location.as_ref(),
            member: self.member.as_ref(),
            remaining_quota: self.remaining_quota,
            loading,
        }
    }

    /* ----------------------------- selections --------------------------- */

    pub fn load_miqaats(&mut self) -> Fetch {
        self.issue(FetchKind::Miqaats)
    }

    /// Selecting a miqaat, or clearing it, wipes every downstream selection
    /// and option list and invalidates all outstanding fetches.
    pub fn select_miqaat(&mut self, miqaat: Option<Miqaat>) -> Vec<Fetch> {
        if self.locked {
            log::warn!("miqaat is locked; ignoring re-selection");
            return Vec::new();
        }
        self.set_miqaat(miqaat)
    }

    fn set_miqaat(&mut self, miqaat: Option<Miqaat>) -> Vec<Fetch> {
        self.clear_downstream();
        let keep_miqaats = self.in_flight.get(&Slot::Miqaats).copied();
        self.in_flight.clear();
        if let Some(g) = keep_miqaats {
            self.in_flight.insert(Slot::Miqaats, g);
        }
        self.miqaat = miqaat;

        let Some(m) = self.miqaat.clone() else {
            return Vec::new();
        };
        log::debug!("miqaat {} selected", m.id);
        let mut fetches = vec![
            self.issue(FetchKind::Jamiaats),
            self.issue(FetchKind::Teams(None)),
            self.issue(FetchKind::Locations(m.venue_id)),
        ];
        if !matches!(self.mode, Mode::Incharge) {
            fetches.push(self.issue(FetchKind::RemainingQuota(m.id)));
            fetches.push(self.issue(FetchKind::Duties(m.id)));
        }
        fetches
    }

    fn clear_downstream(&mut self) {
        self.jamiaat = None;
        self.teams.clear();
        self.location = None;
        self.member = None;
        self.jamiaat_options.clear();
        self.team_options.clear();
        self.location_options.clear();
        self.member_options.clear();
        self.remaining_quota = None;
        self.duties.clear();
    }

    pub fn select_jamiaat(&mut self, jamiaat: Option<Jamiaat>) -> Vec<Fetch> {
        if self.miqaat.is_none() {
            return Vec::new();
        }
        self.jamiaat = jamiaat;
        self.teams.clear();
        self.member = None;
        self.team_options.clear();
        self.member_options.clear();
        self.in_flight.remove(&Slot::Members);
        let scope = self.jamiaat.as_ref().map(|j| j.id);
        vec![self.issue(FetchKind::Teams(scope))]
    }

    pub fn select_teams(&mut self, mut teams: Vec<Team>) -> Vec<Fetch> {
        if self.miqaat.is_none() {
            return Vec::new();
        }
        if self.is_single_team() {
            teams.truncate(1);
        }
        self.teams = teams;
        self.member = None;
        self.member_options.clear();
        self.in_flight.remove(&Slot::Members);

        let mut fetches = Vec::new();
        let wanted: Vec<TeamId> = self
            .teams
            .iter()
            .filter(|t| !self.member_counts.contains_key(&t.id) && t.member_count.is_none())
            .map(|t| t.id)
            .collect();
        for team in &self.teams {
            if let Some(n) = team.member_count {
                self.member_counts.insert(team.id, n);
            }
        }
        for team in wanted {
            fetches.push(self.issue(FetchKind::MemberCount(team)));
        }
        if matches!(self.mode, Mode::Incharge) {
            if let Some(team) = self.teams.first().map(|t| t.id) {
                fetches.push(self.issue(FetchKind::Members(team)));
            }
        }
        fetches
    }

    pub fn select_location(&mut self, location: Option<Location>) {
        self.location = location;
    }

    pub fn select_member(&mut self, member: Option<Member>) {
        self.member = member;
    }

    /// Re-reads the server's quota view after a save.
    pub fn refresh_quota(&mut self) -> Vec<Fetch> {
        match self.miqaat.as_ref().map(|m| m.id) {
            Some(id) if !matches!(self.mode, Mode::Incharge) => {
                vec![self.issue(FetchKind::RemainingQuota(id)), self.issue(FetchKind::Duties(id))]
            }
            _ => Vec::new(),
        }
    }

    /* ----------------------------- overlays ----------------------------- */

    /// Loads a persisted duty into the form. The miqaat is locked and the
    /// team picker becomes single-select.
    pub fn enter_edit(&mut self, duty: Duty, miqaat: Miqaat) -> Vec<Fetch> {
        self.locked = false;
        self.mode = Mode::Edit { duty: duty.clone() };
        let mut fetches = self.set_miqaat(Some(miqaat));
        self.locked = true;

        let team = Team { id: duty.team_id, name: duty.team_name.clone(), jamiaat_id: None, member_count: None };
        self.location = Some(Location {
            id: duty.location_id,
            name: duty.location_name.clone(),
            venue_id: None,
            reporting_time: None,
        });
        fetches.extend(self.select_teams(vec![team]));
        fetches
    }

    /// Leaves the edit overlay and clears the form.
    pub fn exit_edit(&mut self) {
        self.locked = false;
        self.mode = Mode::Add;
        self.set_miqaat(None);
    }

    pub fn editing(&self) -> Option<&Duty> {
        match &self.mode {
            Mode::Edit { duty } => Some(duty),
            _ => None,
        }
    }

    /// Consumes navigation state from the miqaat-creation flow, at most once.
    pub fn apply_handoff(&mut self, handoff: &MiqaatHandoff) -> Vec<Fetch> {
        if self.handoff_consumed || !handoff.from_miqaat_creation {
            return Vec::new();
        }
        self.handoff_consumed = true;
        let miqaat = self
            .miqaat_options
            .iter()
            .find(|m| m.id == handoff.miqaat_id)
            .cloned()
            .unwrap_or_else(|| Miqaat {
                id: handoff.miqaat_id,
                name: handoff.miqaat_name.clone(),
                quota: 0,
                venue_id: handoff.venue_id,
                start_date: None,
                end_date: None,
            });
        self.locked = false;
        let fetches = self.set_miqaat(Some(miqaat));
        self.locked = true;
        fetches
    }

    /// Form clear: everything but the miqaat option list.
    pub fn reset(&mut self) {
        self.locked = false;
        if matches!(self.mode, Mode::Edit { .. }) {
            self.mode = Mode::Add;
        }
        self.set_miqaat(None);
    }

    /* ----------------------------- results ------------------------------ */

    fn issue(&mut self, kind: FetchKind) -> Fetch {
        self.generation += 1;
        let ticket = Ticket { slot: kind.slot(), generation: self.generation };
        self.in_flight.insert(ticket.slot, ticket.generation);
        Fetch { kind, ticket }
    }

    /// Applies a fetch result. Returns `false` when the result was stale
    /// and discarded.
    pub fn apply(&mut self, ticket: Ticket, result: Result<Fetched, ConsoleError>) -> bool {
        if self.in_flight.get(&ticket.slot) != Some(&ticket.generation) {
            log::debug!("discarding stale {:?} result", ticket.slot);
            return false;
        }
        self.in_flight.remove(&ticket.slot);

        let fetched = match result {
            Ok(f) => f,
            Err(err) => {
                log::error!("{:?} fetch failed: {err}", ticket.slot);
                self.empty_slot(ticket.slot);
                return true;
            }
        };

        match fetched {
            Fetched::Miqaats(list) => {
                if let Some(current) = &self.miqaat {
                    if let Some(fresh) = list.iter().find(|m| m.id == current.id) {
                        self.miqaat = Some(fresh.clone());
                    }
                }
                self.miqaat_options = list;
            }
            Fetched::Jamiaats(list) => self.jamiaat_options = list,
            Fetched::Teams(list) => {
                for team in &list {
                    if let Some(n) = team.member_count {
                        self.member_counts.insert(team.id, n);
                    }
                }
                self.team_options = list;
            }
            Fetched::Locations(list) => self.location_options = list,
            Fetched::RemainingQuota(n) => self.remaining_quota = Some(n),
            Fetched::Duties(list) => self.duties = list,
            Fetched::MemberCount(n) => {
                if let Slot::MemberCount(team) = ticket.slot {
                    self.member_counts.insert(team, n);
                }
            }
            Fetched::Members(list) => self.member_options = list,
        }
        true
    }

    fn empty_slot(&mut self, slot: Slot) {
        match slot {
            Slot::Miqaats => self.miqaat_options.clear(),
            Slot::Jamiaats => self.jamiaat_options.clear(),
            Slot::Teams => self.team_options.clear(),
            Slot::Locations => self.location_options.clear(),
            Slot::RemainingQuota => self.remaining_quota = None,
            Slot::Duties => self.duties.clear(),
            Slot::MemberCount(team) => {
                self.member_counts.remove(&team);
            }
            Slot::Members => self.member_options.clear(),
        }
    }

    /// Runs the given fetches one after another and applies each result.
    /// The UI spawns them independently instead; this is for callers that
    /// simply want the cascade settled.
    pub async fn settle<C>(&mut self, catalog: &C, fetches: Vec<Fetch>)
    where
        C: CatalogBackend + ?Sized,
    {
        for fetch in fetches {
            let result = run_fetch(catalog, &fetch.kind).await;
            self.apply(fetch.ticket, result);
        }
    }
}

impl Default for Cascade {
    fn default() -> Self {
        Cascade::new(Mode::Add)
    }
}
