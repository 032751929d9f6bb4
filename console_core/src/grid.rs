//! Client-side table model: search, sort, paging, and the drill-down slot.

use std::cmp::Ordering;

use crate::error::ConsoleError;

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn opt_text(s: Option<&str>) -> Self {
        match s {
            Some(s) if !s.trim().is_empty() => Cell::Text(s.to_string()),
            _ => Cell::Empty,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{n:.0}"),
            Cell::Number(n) => format!("{n:.1}"),
            Cell::Empty => "-".to_string(),
        }
    }

    /// Numbers numerically, text case-insensitively; empties first,
    /// numbers before text.
    fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => Ordering::Equal,
            (Cell::Empty, _) => Ordering::Less,
            (_, Cell::Empty) => Ordering::Greater,
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
            (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
            (Cell::Text(a), Cell::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Number(f64::from(n))
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A row the grid can render, search and sort.
pub trait GridRow {
    const COLUMNS: &'static [&'static str];

    fn cell(&self, col: usize) -> Cell;

    fn matches(&self, needle: &str) -> bool {
        (0..Self::COLUMNS.len()).any(|col| match self.cell(col) {
            Cell::Empty => false,
            cell => cell.display().to_lowercase().contains(needle),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: usize,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridQuery {
    pub search: String,
    pub sort: Option<Sort>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl GridQuery {
    pub fn new(page_size: usize) -> Self {
        Self { search: String::new(), sort: None, page: 1, page_size: page_size.max(1) }
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.page = 1;
    }

    /// Clicking a header: new column sorts ascending, same column flips.
    pub fn toggle_sort(&mut self, column: usize) {
        self.sort = match self.sort {
            Some(Sort { column: c, direction: Direction::Asc }) if c == column => {
                Some(Sort { column, direction: Direction::Desc })
            }
            _ => Some(Sort { column, direction: Direction::Asc }),
        };
    }

    pub fn goto(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

impl Default for GridQuery {
    fn default() -> Self {
        GridQuery::new(10)
    }
}

#[derive(Debug)]
pub struct PageView<'a, T> {
    pub rows: Vec<&'a T>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

pub fn apply<'a, T: GridRow>(rows: &'a [T], query: &GridQuery) -> PageView<'a, T> {
    let needle = query.search.trim().to_lowercase();
    let mut hits: Vec<&T> = rows.iter().filter(|r| needle.is_empty() || r.matches(&needle)).collect();

    if let Some(sort) = query.sort {
        if sort.column < T::COLUMNS.len() {
            hits.sort_by(|a, b| {
                let ord = a.cell(sort.column).compare(&b.cell(sort.column));
                match sort.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
    }

    let size = query.page_size.max(1);
    let total = hits.len();
    let page_count = total.div_ceil(size).max(1);
    let page = query.page.clamp(1, page_count);
    let rows = hits.into_iter().skip((page - 1) * size).take(size).collect();
    PageView { rows, page, page_count, total }
}

/* ------------------------------- drill-down ----------------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrillTicket(u64);

/// The single modal slot behind a drill-down table. Each `open` supersedes
/// whatever was loading before it.
#[derive(Clone, Debug, PartialEq)]
pub struct DrillDown<T> {
    pub title: String,
    pub row_key: Option<String>,
    pub loading: bool,
    pub rows: Vec<T>,
    pub error: Option<String>,
    current: u64,
}

impl<T> DrillDown<T> {
    pub fn new() -> Self {
        Self { title: String::new(), row_key: None, loading: false, rows: Vec::new(), error: None, current: 0 }
    }

    pub fn is_open(&self) -> bool {
        self.row_key.is_some()
    }

    pub fn open(&mut self, row_key: impl Into<String>, title: impl Into<String>) -> DrillTicket {
        self.current += 1;
        self.row_key = Some(row_key.into());
        self.title = title.into();
        self.loading = true;
        self.rows.clear();
        self.error = None;
        DrillTicket(self.current)
    }

    /// Returns `false` when a later click already owns the modal.
    pub fn resolve(&mut self, ticket: DrillTicket, result: Result<Vec<T>, ConsoleError>) -> bool {
        if ticket.0 != self.current || !self.is_open() {
            return false;
        }
        self.loading = false;
        match result {
            Ok(rows) => self.rows = rows,
            Err(err) => {
                log::error!("drill-down for {:?} failed: {err}", self.row_key);
                self.error = Some(err.user_message());
            }
        }
        true
    }

    pub fn close(&mut self) {
        self.current += 1;
        self.row_key = None;
        self.title.clear();
        self.loading = false;
        self.rows.clear();
        self.error = None;
    }
}

impl<T> Default for DrillDown<T> {
    fn default() -> Self {
        DrillDown::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, u32);

    impl GridRow for Row {
        const COLUMNS: &'static [&'static str] = &["Name", "Count"];

        fn cell(&self, col: usize) -> Cell {
            match col {
                0 => Cell::text(self.0),
                1 => self.1.into(),
                _ => Cell::Empty,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![Row("bravo", 9), Row("Alpha", 10), Row("charlie", 2), Row("alpine", 100)]
    }

    fn names(view: &PageView<'_, Row>) -> Vec<&'static str> {
        view.rows.iter().map(|r| r.0).collect()
    }

    #[test]
    fn numbers_sort_numerically_and_text_ignores_case() {
        let rows = rows();
        let mut q = GridQuery::new(10);
        q.toggle_sort(1);
        assert_eq!(names(&apply(&rows, &q)), vec!["charlie", "bravo", "Alpha", "alpine"]);
        q.toggle_sort(0);
        assert_eq!(names(&apply(&rows, &q)), vec!["Alpha", "alpine", "bravo", "charlie"]);
        q.toggle_sort(0);
        assert_eq!(names(&apply(&rows, &q)), vec!["charlie", "bravo", "alpine", "Alpha"]);
    }

    #[test]
    fn search_is_case_insensitive_and_resets_page() {
        let rows = rows();
        let mut q = GridQuery::new(1);
        q.goto(3);
        q.set_search("ALP");
        assert_eq!(q.page, 1);
        let view = apply(&rows, &q);
        assert_eq!(view.total, 2);
        assert_eq!(view.page_count, 2);
    }

    #[test]
    fn page_is_clamped_to_the_last_one() {
        let rows = rows();
        let mut q = GridQuery::new(3);
        q.goto(9);
        let view = apply(&rows, &q);
        assert_eq!(view.page, 2);
        assert_eq!(view.rows.len(), 1);

        let empty: Vec<Row> = Vec::new();
        let view = apply(&empty, &q);
        assert_eq!((view.page, view.page_count, view.total), (1, 1, 0));
    }

    #[test]
    fn latest_drill_down_click_wins() {
        let mut dd: DrillDown<u32> = DrillDown::new();
        let first = dd.open("team-1", "Alpha");
        let second = dd.open("team-2", "Bravo");
        assert!(!dd.resolve(first, Ok(vec![1, 1])));
        assert!(dd.loading);
        assert!(dd.resolve(second, Ok(vec![2])));
        assert_eq!(dd.rows, vec![2]);
        assert_eq!(dd.title, "Bravo");
    }

    #[test]
    fn results_after_close_are_dropped() {
        let mut dd: DrillDown<u32> = DrillDown::default();
        let t = dd.open("team-1", "Alpha");
        dd.close();
        assert!(!dd.resolve(t, Ok(vec![1])));
        assert!(dd.rows.is_empty());
    }

    #[test]
    fn failed_drill_down_keeps_modal_with_message() {
        let mut dd: DrillDown<u32> = DrillDown::new();
        let t = dd.open("team-1", "Alpha");
        dd.resolve(t, Err(ConsoleError::Transport("reset".into())));
        assert!(!dd.loading);
        assert!(dd.error.is_some());
        assert!(dd.is_open());
    }
}
