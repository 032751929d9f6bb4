//! Master-data CRUD: teams, venues, locations, roles, members, miqaats and
//! jamaats share one editor parameterised by the record type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::access::{modules, Action, ModuleId, Permission};
use crate::api::{Lenient, MasterBackend, Outcome, ResultCode, WriteMethod};
use crate::confirm::{ConfirmDialog, Confirmed, Variant};
use crate::error::ConsoleError;
use crate::grid::{self, Cell, GridQuery, GridRow, PageView};
use crate::model::{Jamaat, Location, Member, Miqaat, Role, Team, Venue};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

fn require_text(errors: &mut Vec<FieldError>, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    }
}

/// A master-data record the generic editor can list, validate and write.
pub trait MasterRecord: Clone + Serialize + DeserializeOwned + GridRow {
    const MODULE: &'static str;
    const PATH: &'static str;
    const LABEL: &'static str;
    /// The key is entered by the user instead of assigned by the server.
    const NATURAL_KEY: bool = false;

    /// Path segment identifying a persisted record.
    fn key(&self) -> String;

    fn title(&self) -> String;

    fn validate(&self) -> Vec<FieldError>;
}

/* ------------------------------- records -------------------------------- */

impl GridRow for Team {
    const COLUMNS: &'static [&'static str] = &["Name", "Members"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(&self.name),
            1 => self.member_count.map(Cell::from).unwrap_or(Cell::Empty),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Team {
    const MODULE: &'static str = modules::TEAM;
    const PATH: &'static str = "/team";
    const LABEL: &'static str = "Team";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Team name", &self.name);
        errors
    }
}

impl GridRow for Venue {
    const COLUMNS: &'static [&'static str] = &["Name", "Address"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(&self.name),
            1 => Cell::opt_text(self.address.as_deref()),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Venue {
    const MODULE: &'static str = modules::VENUE;
    const PATH: &'static str = "/venue";
    const LABEL: &'static str = "Venue";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Venue name", &self.name);
        errors
    }
}

impl GridRow for Location {
    const COLUMNS: &'static [&'static str] = &["Name", "Reporting time"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(&self.name),
            1 => Cell::opt_text(self.reporting_time.as_deref()),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Location {
    const MODULE: &'static str = modules::LOCATION;
    const PATH: &'static str = "/location";
    const LABEL: &'static str = "Location";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Location name", &self.name);
        if self.venue_id.is_none() {
            errors.push(FieldError::new("venue_id", "Venue is required"));
        }
        errors
    }
}

impl GridRow for Role {
    const COLUMNS: &'static [&'static str] = &["Name"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(&self.name),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Role {
    const MODULE: &'static str = modules::ROLE;
    const PATH: &'static str = "/role";
    const LABEL: &'static str = "Role";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Role name", &self.name);
        errors
    }
}

impl GridRow for Member {
    const COLUMNS: &'static [&'static str] = &["ITS", "Name", "Mobile"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(self.its_id.as_str()),
            1 => Cell::text(&self.full_name),
            2 => Cell::opt_text(self.mobile.as_deref()),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Member {
    const MODULE: &'static str = modules::MEMBER;
    const PATH: &'static str = "/member";
    const LABEL: &'static str = "Member";
    const NATURAL_KEY: bool = true;

    fn key(&self) -> String {
        self.its_id.to_string()
    }

    fn title(&self) -> String {
        self.full_name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "full_name", "Full name", &self.full_name);
        if let Some(mobile) = self.mobile.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            let digits = mobile.strip_prefix('+').unwrap_or(mobile);
            if digits.len() < 7 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                errors.push(FieldError::new("mobile", "Mobile must be digits only"));
            }
        }
        errors
    }
}

impl GridRow for Miqaat {
    const COLUMNS: &'static [&'static str] = &["Name", "Quota", "Start", "End"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(&self.name),
            1 => self.quota.into(),
            2 => Cell::opt_text(self.start_date.as_deref()),
            3 => Cell::opt_text(self.end_date.as_deref()),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Miqaat {
    const MODULE: &'static str = modules::MIQAAT;
    const PATH: &'static str = "/miqaat";
    const LABEL: &'static str = "Miqaat";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Miqaat name", &self.name);
        if self.quota == 0 {
            errors.push(FieldError::new("quota", "Quota must be greater than 0"));
        }
        // ISO dates compare correctly as strings.
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            if end < start {
                errors.push(FieldError::new("end_date", "End date is before start date"));
            }
        }
        errors
    }
}

impl GridRow for Jamaat {
    const COLUMNS: &'static [&'static str] = &["Name"];

    fn cell(&self, col: usize) -> Cell {
        match col {
            0 => Cell::text(&self.name),
            _ => Cell::Empty,
        }
    }
}

impl MasterRecord for Jamaat {
    const MODULE: &'static str = modules::JAMAAT;
    const PATH: &'static str = "/jamaat";
    const LABEL: &'static str = "Jamaat";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Jamaat name", &self.name);
        errors
    }
}

/* ------------------------------- editor --------------------------------- */

#[derive(Clone, Debug, PartialEq)]
pub enum Form<T> {
    Create(T),
    Edit { key: String, record: T },
}

impl<T> Form<T> {
    pub fn record(&self) -> &T {
        match self {
            Form::Create(r) | Form::Edit { record: r, .. } => r,
        }
    }

    pub fn record_mut(&mut self) -> &mut T {
        match self {
            Form::Create(r) | Form::Edit { record: r, .. } => r,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, Form::Edit { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListTicket(u64);

/// List, form and delete dialog for one master collection.
pub struct MasterEditor<T: MasterRecord> {
    pub query: GridQuery,
    pub confirm_delete: ConfirmDialog<String>,
    rows: Vec<T>,
    form: Option<Form<T>>,
    errors: Vec<FieldError>,
    permission: Permission,
    generation: u64,
}

impl<T: MasterRecord> MasterEditor<T> {
    pub fn new(permission: Permission, page_size: usize) -> Self {
        Self {
            query: GridQuery::new(page_size),
            confirm_delete: ConfirmDialog::new(Variant::Danger),
            rows: Vec::new(),
            form: None,
            errors: Vec::new(),
            permission,
            generation: 0,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    fn require(&self, action: Action) -> Result<(), ConsoleError> {
        if self.permission.allows(action) {
            Ok(())
        } else {
            Err(ConsoleError::Forbidden { module: ModuleId::from(T::MODULE), action })
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn view(&self) -> PageView<'_, T> {
        grid::apply(&self.rows, &self.query)
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn form(&self) -> Option<&Form<T>> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut Form<T>> {
        self.form.as_mut()
    }

    /* ---- list ---- */

    pub fn list_ticket(&mut self) -> ListTicket {
        self.generation += 1;
        ListTicket(self.generation)
    }

    pub fn apply_list(&mut self, ticket: ListTicket, result: Result<Value, ConsoleError>) -> Result<bool, ConsoleError> {
        if ticket.0 != self.generation {
            return Ok(false);
        }
        let Lenient(rows) = serde_json::from_value::<Lenient<T>>(result?)?;
        log::debug!("{} {} records loaded", rows.len(), T::LABEL);
        self.rows = rows;
        Ok(true)
    }

    pub async fn load<B>(&mut self, backend: &B) -> Result<(), ConsoleError>
    where
        B: MasterBackend + ?Sized,
    {
        let ticket = self.list_ticket();
        let result = backend.list_raw(T::PATH).await;
        self.apply_list(ticket, result).map(|_| ())
    }

    /* ---- form ---- */

    pub fn begin_create(&mut self, blank: T) -> Result<(), ConsoleError> {
        self.require(Action::Add)?;
        self.errors.clear();
        self.form = Some(Form::Create(blank));
        Ok(())
    }

    pub fn begin_edit(&mut self, record: &T) -> Result<(), ConsoleError> {
        self.require(Action::Edit)?;
        self.errors.clear();
        self.form = Some(Form::Edit { key: record.key(), record: record.clone() });
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.form = None;
        self.errors.clear();
    }

    /// The write the current form would issue. Validation failures are
    /// kept for display and returned; nothing is sent.
    pub fn submit_request(&mut self) -> Result<(WriteMethod, String, Value), ConsoleError> {
        let form = self
            .form
            .as_ref()
            .ok_or_else(|| ConsoleError::Validation(vec!["No form is open".to_string()]))?;
        let action = if form.is_edit() { Action::Edit } else { Action::Add };
        self.require(action)?;

        let errors = form.record().validate();
        if !errors.is_empty() {
            let messages = errors.iter().map(|e| e.message.clone()).collect();
            self.errors = errors;
            return Err(ConsoleError::Validation(messages));
        }
        self.errors.clear();

        let mut body = serde_json::to_value(form.record())?;
        Ok(match form {
            Form::Create(_) => {
                if let (false, Value::Object(map)) = (T::NATURAL_KEY, &mut body) {
                    map.remove("id");
                }
                (WriteMethod::Post, T::PATH.to_string(), body)
            }
            Form::Edit { key, .. } => (WriteMethod::Put, format!("{}/{key}", T::PATH), body),
        })
    }

    pub async fn submit<B>(&mut self, backend: &B) -> Result<ResultCode, ConsoleError>
    where
        B: MasterBackend + ?Sized,
    {
        let (method, path, body) = self.submit_request()?;
        let code = classify(backend.write_raw(method, &path, Some(body)).await?)?;
        log::info!("{} saved ({code:?})", T::LABEL);
        self.form = None;
        self.load(backend).await?;
        Ok(code)
    }

    /* ---- delete ---- */

    pub fn request_delete(&mut self, record: &T) -> Result<(), ConsoleError> {
        self.require(Action::Delete)?;
        let message = format!("Delete {} \"{}\"?", T::LABEL.to_lowercase(), record.title());
        self.confirm_delete.open(record.key(), format!("Delete {}", T::LABEL), message);
        Ok(())
    }

    /// Permission check on a confirmed delete; yields the record key and
    /// the path to send the DELETE to.
    pub fn delete_target(&self, confirmed: Confirmed<String>) -> Result<(String, String), ConsoleError> {
        self.require(Action::Delete)?;
        let key = confirmed.into_inner();
        let path = format!("{}/{key}", T::PATH);
        Ok((key, path))
    }

    pub fn remove_row(&mut self, key: &str) {
        self.rows.retain(|r| r.key() != key);
    }

    pub async fn delete<B>(&mut self, backend: &B, confirmed: Confirmed<String>) -> Result<(), ConsoleError>
    where
        B: MasterBackend + ?Sized,
    {
        let (key, path) = self.delete_target(confirmed)?;
        classify(backend.write_raw(WriteMethod::Delete, &path, None).await?)?;
        self.remove_row(&key);
        Ok(())
    }
}

/// Write outcome as a result; duplicates get their own wording.
pub fn classify(outcome: Outcome) -> Result<ResultCode, ConsoleError> {
    match outcome {
        Outcome::Duplicate(message) => Err(ConsoleError::Rejected { code: 4, message: format!("Duplicate: {message}") }),
        other => other.into_result(),
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::ids::{MiqaatId, RoleId, VenueId};
    use crate::testing::{member, miqaat, FakeApi};

    fn role(id: i64, name: &str) -> Role {
        Role { id: RoleId(id), name: name.into() }
    }

    #[test]
    fn records_validate_their_fields() {
        assert_eq!(role(1, "  ").validate()[0].field, "name");
        let mut m = miqaat(1, 0, 1);
        m.start_date = Some("2026-03-02".into());
        m.end_date = Some("2026-03-01".into());
        let fields: Vec<_> = m.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["quota", "end_date"]);

        let mut mem = member("30123456", "Ali", 1);
        mem.mobile = Some("12ab".into());
        assert_eq!(mem.validate()[0].field, "mobile");
        mem.mobile = Some("+919876543210".into());
        assert!(mem.validate().is_empty());
    }

    #[test]
    fn create_posts_without_id_and_edit_puts_to_the_record() {
        let mut ed: MasterEditor<Role> = MasterEditor::new(Permission::ALL, 10);
        ed.begin_create(role(0, "Captain")).unwrap();
        let (method, path, body) = ed.submit_request().unwrap();
        assert_eq!((method, path.as_str()), (WriteMethod::Post, "/role"));
        assert_eq!(body, json!({"name": "Captain"}));

        ed.begin_edit(&role(4, "Captain")).unwrap();
        ed.form_mut().unwrap().record_mut().name = "Vice Captain".into();
        let (method, path, _) = ed.submit_request().unwrap();
        assert_eq!((method, path.as_str()), (WriteMethod::Put, "/role/4"));
    }

    #[test]
    fn invalid_form_never_reaches_the_backend() {
        let api = FakeApi::default();
        let mut ed: MasterEditor<Venue> = MasterEditor::new(Permission::ALL, 10);
        ed.begin_create(Venue { id: VenueId(0), name: String::new(), address: None }).unwrap();
        assert!(matches!(block_on(ed.submit(&api)), Err(ConsoleError::Validation(_))));
        assert_eq!(ed.errors().len(), 1);
        assert!(api.writes().is_empty());
    }

    #[test]
    fn permissions_are_checked_before_any_request() {
        let api = FakeApi::default();
        let view_only = Permission { has_access: true, ..Permission::NONE };
        let mut ed: MasterEditor<Miqaat> = MasterEditor::new(view_only, 10);
        assert!(ed.begin_create(miqaat(0, 10, 1)).unwrap_err().is_forbidden());
        assert!(ed.begin_edit(&miqaat(1, 10, 1)).unwrap_err().is_forbidden());
        assert!(ed.request_delete(&miqaat(1, 10, 1)).unwrap_err().is_forbidden());
        let token = crate::confirm::confirmed(MiqaatId(1).to_string());
        assert!(block_on(ed.delete(&api, token)).unwrap_err().is_forbidden());
        assert!(api.writes().is_empty());
    }

    #[test]
    fn duplicate_outcome_is_reported_as_rejection() {
        let api = FakeApi::default().with_outcomes(vec![Ok(Outcome::Duplicate("Role exists".into()))]);
        let mut ed: MasterEditor<Role> = MasterEditor::new(Permission::ALL, 10);
        ed.begin_create(role(0, "Captain")).unwrap();
        let err = block_on(ed.submit(&api)).unwrap_err();
        assert_eq!(err, ConsoleError::Rejected { code: 4, message: "Duplicate: Role exists".into() });
        assert!(ed.form().is_some(), "form stays open after a rejection");
    }

    #[test]
    fn delete_removes_the_row_after_confirmation() {
        let api = FakeApi::default().with_outcomes(vec![Ok(Outcome::Success(ResultCode::Deleted))]);
        let mut ed: MasterEditor<Role> = MasterEditor::new(Permission::ALL, 10);
        let t = ed.list_ticket();
        ed.apply_list(t, Ok(json!([{"id": 1, "name": "Captain"}, {"id": "2", "name": "Scout"}]))).unwrap();
        ed.request_delete(&role(2, "Scout")).unwrap();
        let token = ed.confirm_delete.confirm().unwrap();
        block_on(ed.delete(&api, token)).unwrap();
        assert_eq!(ed.rows(), &[role(1, "Captain")]);
        assert_eq!(api.writes()[0].1, "/role/2");
    }

    #[test]
    fn stale_list_is_dropped_and_bad_payload_is_a_decode_error() {
        let mut ed: MasterEditor<Role> = MasterEditor::new(Permission::ALL, 10);
        let old = ed.list_ticket();
        let new = ed.list_ticket();
        assert_eq!(ed.apply_list(old, Ok(json!([{"id": 1, "name": "x"}]))), Ok(false));
        assert!(matches!(ed.apply_list(new, Ok(json!({"oops": true}))), Err(ConsoleError::Decode(_))));
        assert!(ed.rows().is_empty());
    }

    #[test]
    fn members_are_keyed_by_its_id() {
        let mut ed: MasterEditor<Member> = MasterEditor::new(Permission::ALL, 10);
        ed.begin_create(member("30123456", "Ali", 1)).unwrap();
        let (_, _, body) = ed.submit_request().unwrap();
        assert_eq!(body["its_id"], "30123456");
        ed.begin_edit(&member("30123456", "Ali", 1)).unwrap();
        assert_eq!(ed.submit_request().unwrap().1, "/member/30123456");
    }
}
