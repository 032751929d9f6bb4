//! Quota arithmetic for duty assignment.
//!
//! The server reports how much of a miqaat's quota is still unallocated.
//! Pending (unsaved) duties are subtracted locally; when editing a saved
//! duty its original quota is given back. Violations are values, not
//! errors: they disable submit and render next to the field.

use std::fmt;

use crate::ids::TeamId;
use crate::model::{Duty, PendingDuty, Team};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuotaViolation {
    Required,
    NotAnInteger,
    NotPositive,
    /// Add mode: `teams × quota` does not fit.
    ExceedsRemaining { requested: i64, remaining: i64 },
    ExceedsMemberCount { quota: u32, member_count: u32 },
    /// The team's member count is still loading or could not be fetched.
    MemberCountUnknown,
    AlreadyAssigned { teams: Vec<String> },
    NoTeamSelected,
    NoLocationSelected,
}

impl fmt::Display for QuotaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaViolation::Required => write!(f, "Quota is required"),
            QuotaViolation::NotAnInteger => write!(f, "Quota must be a whole number"),
            QuotaViolation::NotPositive => write!(f, "Quota must be greater than 0"),
            QuotaViolation::ExceedsRemaining { requested, remaining } => {
                write!(f, "Total quota {requested} exceeds remaining quota {remaining}")
            }
            QuotaViolation::ExceedsMemberCount { quota, member_count } => {
                write!(f, "Quota {quota} exceeds team member count {member_count}")
            }
            QuotaViolation::MemberCountUnknown => write!(f, "Team member count is not available yet"),
            QuotaViolation::AlreadyAssigned { teams } => {
                write!(f, "Already assigned for this miqaat: {}", teams.join(", "))
            }
            QuotaViolation::NoTeamSelected => write!(f, "Select at least one team"),
            QuotaViolation::NoLocationSelected => write!(f, "Select a location"),
        }
    }
}

pub fn parse_quota(raw: &str) -> Result<u32, QuotaViolation> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QuotaViolation::Required);
    }
    let value: i64 = raw.parse().map_err(|_| QuotaViolation::NotAnInteger)?;
    if value <= 0 {
        return Err(QuotaViolation::NotPositive);
    }
    u32::try_from(value).map_err(|_| QuotaViolation::NotAnInteger)
}

/// `server_remaining - Σ pending + editing_original`.
pub fn effective_remaining(server_remaining: i64, pending: &[PendingDuty], editing_original: Option<u32>) -> i64 {
    let staged: i64 = pending.iter().map(|p| i64::from(p.quota)).sum();
    server_remaining - staged + editing_original.map(i64::from).unwrap_or(0)
}

pub fn validate_add(team_count: usize, quota: u32, effective: i64) -> Result<(), QuotaViolation> {
    if team_count == 0 {
        return Err(QuotaViolation::NoTeamSelected);
    }
    let requested = team_count as i64 * i64::from(quota);
    if requested > effective {
        return Err(QuotaViolation::ExceedsRemaining { requested, remaining: effective });
    }
    Ok(())
}

pub fn validate_edit(quota: u32, effective: i64, member_count: Option<u32>) -> Result<(), QuotaViolation> {
    if i64::from(quota) > effective {
        return Err(QuotaViolation::ExceedsRemaining { requested: i64::from(quota), remaining: effective });
    }
    match member_count {
        None => Err(QuotaViolation::MemberCountUnknown),
        Some(member_count) if quota > member_count => Err(QuotaViolation::ExceedsMemberCount { quota, member_count }),
        Some(_) => Ok(()),
    }
}

/// Names of the selected teams that already hold a pending or saved duty.
/// `skip` excludes the duty being edited.
pub fn find_duplicates(teams: &[Team], pending: &[PendingDuty], saved: &[Duty], skip: Option<TeamId>) -> Vec<String> {
    teams
        .iter()
        .filter(|t| Some(t.id) != skip)
        .filter(|t| pending.iter().any(|p| p.team.id == t.id) || saved.iter().any(|d| d.team_id == t.id))
        .map(|t| t.name.clone())
        .collect()
}

/// Everything the duty form feeds into [`QuotaGate::evaluate`].
#[derive(Clone, Copy, Debug)]
pub struct GateInput<'a> {
    pub raw_quota: &'a str,
    pub location_selected: bool,
    pub teams: &'a [Team],
    pub pending: &'a [PendingDuty],
    pub saved: &'a [Duty],
    pub effective: i64,
    /// Edit mode: the duty being edited and its team's member count.
    pub editing: Option<(&'a Duty, Option<u32>)>,
}

/// What the form needs to decide whether submit is enabled.
#[derive(Clone, Debug, Default)]
pub struct QuotaGate {
    pub violations: Vec<QuotaViolation>,
}

impl QuotaGate {
    /// Collects every violation for the current form. An unparsable quota
    /// short-circuits; the rest are reported together.
    pub fn evaluate(input: GateInput<'_>) -> Self {
        let mut gate = Self::default();
        let quota = match parse_quota(input.raw_quota) {
            Ok(q) => q,
            Err(v) => {
                gate.violations.push(v);
                return gate;
            }
        };
        if !input.location_selected {
            gate.violations.push(QuotaViolation::NoLocationSelected);
        }

        let dupes = match input.editing {
            Some((duty, member_count)) => {
                if input.teams.is_empty() {
                    gate.violations.push(QuotaViolation::NoTeamSelected);
                }
                gate.push(validate_edit(quota, input.effective, member_count));
                let others: Vec<Duty> = input.saved.iter().filter(|d| d.id != duty.id).cloned().collect();
                find_duplicates(input.teams, input.pending, &others, None)
            }
            None => {
                gate.push(validate_add(input.teams.len(), quota, input.effective));
                find_duplicates(input.teams, input.pending, input.saved, None)
            }
        };
        if !dupes.is_empty() {
            gate.violations.push(QuotaViolation::AlreadyAssigned { teams: dupes });
        }
        gate
    }

    pub fn can_submit(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn first_message(&self) -> Option<String> {
        self.violations.first().map(ToString::to_string)
    }

    fn push(&mut self, result: Result<(), QuotaViolation>) {
        if let Err(v) = result {
            self.violations.push(v);
        }
    }
}
