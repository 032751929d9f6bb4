//! Report rows: duty allocation per team and attendance per team, with
//! per-member attendance as the drill-down.

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;
use crate::grid::{Cell, GridRow};
use crate::ids::{ItsId, MiqaatId, TeamId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyReportRow {
    #[serde(default)]
    pub miqaat_name: String,
    #[serde(default)]
    pub jamiaat_name: String,
    pub team_id: TeamId,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub location_name: String,
    pub quota: u32,
    #[serde(default)]
    pub assigned: u32,
}

impl GridRow for DutyReportRow {
    const COLUMNS: &'static [&'static str] = &["Miqaat", "Jamiaat", "Team", "Location", "Quota", "Assigned"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::opt_text(Some(&self.miqaat_name)),
            1 => Cell::opt_text(Some(&self.jamiaat_name)),
            2 => Cell::opt_text(Some(&self.team_name)),
            3 => Cell::opt_text(Some(&self.location_name)),
            4 => self.quota.into(),
            5 => self.assigned.into(),
            _ => Cell::Empty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub team_id: TeamId,
    #[serde(default)]
    pub team_name: String,
    pub total_members: u32,
    pub present: u32,
    #[serde(default)]
    pub absent: u32,
}

impl AttendanceRow {
    pub fn percentage(&self) -> f64 {
        attendance_percentage(self.present, self.total_members)
    }
}

impl GridRow for AttendanceRow {
    const COLUMNS: &'static [&'static str] = &["Team", "Members", "Present", "Absent", "Attendance %"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::opt_text(Some(&self.team_name)),
            1 => self.total_members.into(),
            2 => self.present.into(),
            3 => self.absent.into(),
            4 => self.percentage().into(),
            _ => Cell::Empty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceDetail {
    pub its_id: ItsId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub marked_at: Option<String>,
}

impl GridRow for AttendanceDetail {
    const COLUMNS: &'static [&'static str] = &["ITS", "Name", "Status", "Marked at"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(self.its_id.as_str()),
            1 => Cell::opt_text(Some(&self.full_name)),
            2 => Cell::text(if self.present { "Present" } else { "Absent" }),
            3 => Cell::opt_text(self.marked_at.as_deref()),
            _ => Cell::Empty,
        }
    }
}

/// Share of `present` in `total`, rounded to one decimal. Zero members is 0%.
pub fn attendance_percentage(present: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(present) * 1000.0 / f64::from(total)).round() / 10.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttendanceTotals {
    pub members: u32,
    pub present: u32,
    pub absent: u32,
    pub percentage: f64,
}

pub fn totals(rows: &[AttendanceRow]) -> AttendanceTotals {
    let members = rows.iter().map(|r| r.total_members).sum();
    let present = rows.iter().map(|r| r.present).sum();
    let absent = rows.iter().map(|r| r.absent).sum();
    AttendanceTotals { members, present, absent, percentage: attendance_percentage(present, members) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Duties,
    Attendance,
}

/// Identifies one report load; only the latest one may fill the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportTicket {
    pub miqaat: MiqaatId,
    pub kind: ReportKind,
    generation: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportRows {
    Duties(Vec<DutyReportRow>),
    Attendance(Vec<AttendanceRow>),
}

/// Rows on the reports screen for the selected miqaat. Changing the miqaat
/// or starting a new load supersedes every load still in flight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportView {
    miqaat: Option<MiqaatId>,
    pub duties: Vec<DutyReportRow>,
    pub attendance: Vec<AttendanceRow>,
    pub loading: bool,
    generation: u64,
}

impl ReportView {
    pub fn miqaat(&self) -> Option<MiqaatId> {
        self.miqaat
    }

    pub fn select_miqaat(&mut self, miqaat: Option<MiqaatId>) {
        self.generation += 1;
        self.miqaat = miqaat;
        self.duties.clear();
        self.attendance.clear();
        self.loading = false;
    }

    /// `None` until a miqaat is selected.
    pub fn begin_load(&mut self, kind: ReportKind) -> Option<ReportTicket> {
        let miqaat = self.miqaat?;
        self.generation += 1;
        self.loading = true;
        Some(ReportTicket { miqaat, kind, generation: self.generation })
    }

    /// `Ok(false)` when the ticket was superseded and the result dropped.
    pub fn resolve(&mut self, ticket: ReportTicket, result: Result<ReportRows, ConsoleError>) -> Result<bool, ConsoleError> {
        if ticket.generation != self.generation {
            log::debug!("dropped stale {:?} report for miqaat {}", ticket.kind, ticket.miqaat);
            return Ok(false);
        }
        self.loading = false;
        match result? {
            ReportRows::Duties(rows) => self.duties = rows,
            ReportRows::Attendance(rows) => self.attendance = rows,
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{apply, GridQuery};

    fn row(team: i64, name: &str, total: u32, present: u32) -> AttendanceRow {
        AttendanceRow { team_id: TeamId(team), team_name: name.into(), total_members: total, present, absent: total - present }
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(attendance_percentage(1, 3), 33.3);
        assert_eq!(attendance_percentage(2, 3), 66.7);
        assert_eq!(attendance_percentage(0, 0), 0.0);
        assert_eq!(attendance_percentage(5, 5), 100.0);
    }

    #[test]
    fn attendance_rows_sort_by_percentage() {
        let rows = vec![row(1, "Alpha", 10, 9), row(2, "Bravo", 3, 1), row(3, "Charlie", 4, 2)];
        let mut q = GridQuery::new(10);
        q.toggle_sort(4);
        q.toggle_sort(4);
        let view = apply(&rows, &q);
        let order: Vec<&str> = view.rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Charlie", "Bravo"]);
    }

    #[test]
    fn totals_sum_every_team() {
        let t = totals(&[row(1, "Alpha", 10, 9), row(2, "Bravo", 10, 1)]);
        assert_eq!((t.members, t.present, t.absent), (20, 10, 10));
        assert_eq!(t.percentage, 50.0);
    }

    #[test]
    fn detail_rows_decode_numeric_its_ids() {
        let d: AttendanceDetail =
            serde_json::from_str(r#"{"its_id":30123456,"full_name":"A B","present":true}"#).unwrap();
        assert_eq!(d.its_id.as_str(), "30123456");
        assert_eq!(d.cell(2), Cell::text("Present"));
        assert_eq!(d.cell(3), Cell::Empty);
    }

    #[test]
    fn duty_report_rows_are_searchable_by_team() {
        let rows: Vec<DutyReportRow> = serde_json::from_str(
            r#"[{"team_id":1,"team_name":"Alpha","quota":5,"assigned":3},
                {"team_id":"2","team_name":"Bravo","location_name":"Gate","quota":2}]"#,
        )
        .unwrap();
        let mut q = GridQuery::new(10);
        q.set_search("gate");
        let view = apply(&rows, &q);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].team_name, "Bravo");
    }

    #[test]
    fn report_for_a_previous_miqaat_is_dropped() {
        let mut view = ReportView::default();
        view.select_miqaat(Some(MiqaatId(1)));
        let first = view.begin_load(ReportKind::Attendance).unwrap();
        view.select_miqaat(Some(MiqaatId(2)));

        let stale = ReportRows::Attendance(vec![row(1, "Alpha", 10, 9)]);
        assert_eq!(view.resolve(first, Ok(stale)), Ok(false));
        assert!(view.attendance.is_empty());

        let second = view.begin_load(ReportKind::Attendance).unwrap();
        assert_eq!(second.miqaat, MiqaatId(2));
        assert!(view.loading);
        let fresh = ReportRows::Attendance(vec![row(2, "Bravo", 4, 2)]);
        assert_eq!(view.resolve(second, Ok(fresh)), Ok(true));
        assert!(!view.loading);
        assert_eq!(view.attendance[0].team_name, "Bravo");
    }

    #[test]
    fn only_the_latest_load_resolves() {
        let mut view = ReportView::default();
        assert!(view.begin_load(ReportKind::Duties).is_none());
        view.select_miqaat(Some(MiqaatId(1)));
        let a = view.begin_load(ReportKind::Duties).unwrap();
        let b = view.begin_load(ReportKind::Duties).unwrap();
        assert_eq!(view.resolve(a, Ok(ReportRows::Duties(Vec::new()))), Ok(false));
        assert!(view.loading);
        let err = ConsoleError::Rejected { code: 3, message: "boom".into() };
        assert_eq!(view.resolve(b, Err(err.clone())), Err(err));
        assert!(!view.loading);
    }
}
