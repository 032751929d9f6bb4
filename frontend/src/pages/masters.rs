use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::str::FromStr;

use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use console_core::api::MasterBackend;
use console_core::ids::{ItsId, JamaatId, JamiaatId, LocationId, MiqaatId, RoleId, TeamId, VenueId};
use console_core::masters::{classify, FieldError, Form, MasterEditor, MasterRecord};
use console_core::model::{Jamaat, Location, Member, Miqaat, MiqaatHandoff, Role, Team, Venue};

use crate::components::{ConfirmDeleteModal, DataGrid, StandardModal};
use crate::Route;

use super::{use_screen, Screen};

/* ---------------- form fields ---------------- */

pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub input: &'static str,
    /// Part of the record's key, so only editable while creating.
    pub key: bool,
}

const fn field(name: &'static str, label: &'static str, input: &'static str) -> Field {
    Field { name, label, input, key: false }
}

pub type Values = BTreeMap<&'static str, String>;

/// Form binding for a master record: raw input text in, typed record out.
pub trait MasterForm: MasterRecord + PartialEq + 'static {
    const FIELDS: &'static [Field];

    fn read(&self, field: &str) -> String;

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>>;
}

fn text(values: &Values, name: &str) -> String {
    values.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn opt_text(values: &Values, name: &str) -> Option<String> {
    Some(text(values, name)).filter(|v| !v.is_empty())
}

fn opt_number<N: FromStr>(values: &Values, name: &'static str, errors: &mut Vec<FieldError>) -> Option<N> {
    let raw = opt_text(values, name)?;
    match raw.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(name, format!("\"{raw}\" is not a number")));
            None
        }
    }
}

fn number<N: FromStr>(values: &Values, name: &'static str, label: &str, errors: &mut Vec<FieldError>) -> Option<N> {
    let parsed = opt_number(values, name, errors);
    if parsed.is_none() && opt_text(values, name).is_none() {
        errors.push(FieldError::new(name, format!("{label} is required")));
    }
    parsed
}

fn opt_show<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn done<T>(record: Option<T>, errors: Vec<FieldError>) -> Result<T, Vec<FieldError>> {
    match record {
        Some(r) if errors.is_empty() => Ok(r),
        _ => Err(errors),
    }
}

impl MasterForm for Team {
    const FIELDS: &'static [Field] = &[field("name", "Team name", "text"), field("jamiaat_id", "Jamiaat ID", "number")];

    fn read(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            "jamiaat_id" => opt_show(self.jamiaat_id),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let jamiaat_id = opt_number(values, "jamiaat_id", &mut errors).map(JamiaatId);
        let team = Team {
            id: original.map_or(TeamId(0), |o| o.id),
            name: text(values, "name"),
            jamiaat_id,
            member_count: original.and_then(|o| o.member_count),
        };
        done(Some(team), errors)
    }
}

impl MasterForm for Venue {
    const FIELDS: &'static [Field] = &[field("name", "Venue name", "text"), field("address", "Address", "text")];

    fn read(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            "address" => self.address.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        Ok(Venue {
            id: original.map_or(VenueId(0), |o| o.id),
            name: text(values, "name"),
            address: opt_text(values, "address"),
        })
    }
}

impl MasterForm for Location {
    const FIELDS: &'static [Field] = &[
        field("name", "Location name", "text"),
        field("venue_id", "Venue ID", "number"),
        field("reporting_time", "Reporting time", "time"),
    ];

    fn read(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            "venue_id" => opt_show(self.venue_id),
            "reporting_time" => self.reporting_time.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let venue_id = opt_number(values, "venue_id", &mut errors).map(VenueId);
        let location = Location {
            id: original.map_or(LocationId(0), |o| o.id),
            name: text(values, "name"),
            venue_id,
            reporting_time: opt_text(values, "reporting_time"),
        };
        done(Some(location), errors)
    }
}

impl MasterForm for Role {
    const FIELDS: &'static [Field] = &[field("name", "Role name", "text")];

    fn read(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        Ok(Role { id: original.map_or(RoleId(0), |o| o.id), name: text(values, "name") })
    }
}

impl MasterForm for Member {
    const FIELDS: &'static [Field] = &[
        Field { name: "its_id", label: "ITS ID", input: "text", key: true },
        field("full_name", "Full name", "text"),
        field("mobile", "Mobile", "tel"),
        field("team_id", "Team ID", "number"),
        field("role_id", "Role ID", "number"),
    ];

    fn read(&self, field: &str) -> String {
        match field {
            "its_id" => self.its_id.to_string(),
            "full_name" => self.full_name.clone(),
            "mobile" => self.mobile.clone().unwrap_or_default(),
            "team_id" => opt_show(self.team_id),
            "role_id" => opt_show(self.role_id),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let its_id = match original {
            Some(o) => Some(o.its_id.clone()),
            None => {
                let parsed = ItsId::parse(&text(values, "its_id"));
                if parsed.is_none() {
                    errors.push(FieldError::new("its_id", "ITS ID must be 8 digits"));
                }
                parsed
            }
        };
        let team_id = opt_number(values, "team_id", &mut errors).map(TeamId);
        let role_id = opt_number(values, "role_id", &mut errors).map(RoleId);
        let member = its_id.map(|its_id| Member {
            its_id,
            full_name: text(values, "full_name"),
            team_id,
            role_id,
            mobile: opt_text(values, "mobile"),
        });
        done(member, errors)
    }
}

impl MasterForm for Miqaat {
    const FIELDS: &'static [Field] = &[
        field("name", "Miqaat name", "text"),
        field("quota", "Quota", "number"),
        field("venue_id", "Venue ID", "number"),
        field("start_date", "Start date", "date"),
        field("end_date", "End date", "date"),
    ];

    fn read(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            "quota" => self.quota.to_string(),
            "venue_id" => self.venue_id.to_string(),
            "start_date" => self.start_date.clone().unwrap_or_default(),
            "end_date" => self.end_date.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let quota = number(values, "quota", "Quota", &mut errors);
        let venue_id = number(values, "venue_id", "Venue", &mut errors).map(VenueId);
        let miqaat = quota.zip(venue_id).map(|(quota, venue_id)| Miqaat {
            id: original.map_or(MiqaatId(0), |o| o.id),
            name: text(values, "name"),
            quota,
            venue_id,
            start_date: opt_text(values, "start_date"),
            end_date: opt_text(values, "end_date"),
        });
        done(miqaat, errors)
    }
}

impl MasterForm for Jamaat {
    const FIELDS: &'static [Field] = &[field("name", "Jamaat name", "text"), field("jamiaat_id", "Jamiaat ID", "number")];

    fn read(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            "jamiaat_id" => self.jamiaat_id.to_string(),
            _ => String::new(),
        }
    }

    fn build(values: &Values, original: Option<&Self>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let jamiaat_id = number(values, "jamiaat_id", "Jamiaat", &mut errors).map(JamiaatId);
        let jamaat = jamiaat_id.map(|jamiaat_id| Jamaat {
            id: original.map_or(JamaatId(0), |o| o.id),
            name: text(values, "name"),
            jamiaat_id,
        });
        done(jamaat, errors)
    }
}

/* ---------------- page ---------------- */

struct FormState {
    values: Values,
    parse_errors: Vec<FieldError>,
    /// A create form is open; the record only exists once the input parses.
    creating: bool,
}

fn reload<T: MasterForm>(screen: &Screen, editor: &Rc<RefCell<MasterEditor<T>>>, loading: &UseStateHandle<bool>) {
    let ticket = editor.borrow_mut().list_ticket();
    loading.set(true);
    let (screen, editor, loading) = (screen.clone(), editor.clone(), loading.clone());
    spawn_local(async move {
        let result = screen.backend.list_raw(T::PATH).await;
        let applied = editor.borrow_mut().apply_list(ticket, result);
        match applied {
            Ok(true) => loading.set(false),
            Ok(false) => {}
            Err(err) => {
                loading.set(false);
                screen.fail(err);
            }
        }
        screen.redraw.force_update();
    });
}

#[derive(Properties, PartialEq)]
pub struct MasterPageProps<T: PartialEq> {
    /// Extra buttons per row, after edit and delete.
    #[prop_or_default]
    pub extra_actions: Option<Callback<T, Html>>,
}

#[function_component(MasterPage)]
pub fn master_page<T>(props: &MasterPageProps<T>) -> Html
where
    T: MasterForm,
{
    let screen = use_screen();
    let permission = screen.session.as_ref().map(|s| s.permission(T::MODULE)).unwrap_or_default();
    let page_size = crate::config::load().page_size;
    let editor = use_mut_ref(|| MasterEditor::<T>::new(permission, page_size));
    let form = use_mut_ref(|| FormState { values: Values::new(), parse_errors: Vec::new(), creating: false });
    let loading = use_state(|| false);
    let saving = use_state(|| false);

    {
        let (screen, editor, loading) = (screen.clone(), editor.clone(), loading.clone());
        use_effect_with((), move |_| {
            reload(&screen, &editor, &loading);
            || ()
        });
    }

    let on_new = {
        let (screen, editor, form) = (screen.clone(), editor.clone(), form.clone());
        Callback::from(move |_: MouseEvent| {
            editor.borrow_mut().cancel();
            let mut f = form.borrow_mut();
            f.values.clear();
            f.parse_errors.clear();
            f.creating = true;
            drop(f);
            screen.redraw.force_update();
        })
    };

    let on_edit = {
        let (screen, editor, form) = (screen.clone(), editor.clone(), form.clone());
        Callback::from(move |record: T| {
            let opened = editor.borrow_mut().begin_edit(&record);
            match opened {
                Ok(()) => {
                    let mut f = form.borrow_mut();
                    f.creating = false;
                    f.values = T::FIELDS.iter().map(|fd| (fd.name, record.read(fd.name))).collect();
                    f.parse_errors.clear();
                }
                Err(err) => screen.fail(err),
            }
            screen.redraw.force_update();
        })
    };

    let on_close = {
        let (screen, editor, form) = (screen.clone(), editor.clone(), form.clone());
        Callback::from(move |_: ()| {
            form.borrow_mut().creating = false;
            editor.borrow_mut().cancel();
            screen.redraw.force_update();
        })
    };

    let on_submit = {
        let (screen, editor, form, saving, loading) =
            (screen.clone(), editor.clone(), form.clone(), saving.clone(), loading.clone());
        Callback::from(move |_: ()| {
            let built = {
                let e = editor.borrow();
                let original = match e.form() {
                    Some(Form::Edit { record, .. }) => Some(record.clone()),
                    _ => None,
                };
                T::build(&form.borrow().values, original.as_ref())
            };
            let record = match built {
                Ok(r) => r,
                Err(errors) => {
                    form.borrow_mut().parse_errors = errors;
                    return screen.redraw.force_update();
                }
            };
            form.borrow_mut().parse_errors.clear();
            let creating = form.borrow().creating;
            let request = {
                let mut e = editor.borrow_mut();
                let opened = if creating {
                    e.begin_create(record)
                } else {
                    if let Some(f) = e.form_mut() {
                        *f.record_mut() = record;
                    }
                    Ok(())
                };
                opened.and_then(|()| e.submit_request())
            };
            let (method, path, body) = match request {
                Ok(r) => r,
                // Field errors are already on the form.
                Err(err) if matches!(err, console_core::ConsoleError::Validation(_)) => {
                    return screen.redraw.force_update();
                }
                Err(err) => return screen.fail(err),
            };
            saving.set(true);
            let (screen, editor, form, saving, loading) =
                (screen.clone(), editor.clone(), form.clone(), saving.clone(), loading.clone());
            spawn_local(async move {
                let result = screen.backend.write_raw(method, &path, Some(body)).await.and_then(classify);
                saving.set(false);
                match result {
                    Ok(code) => {
                        log::info!("{} saved ({code:?})", T::LABEL);
                        form.borrow_mut().creating = false;
                        editor.borrow_mut().cancel();
                        screen.notify(format!("{} saved", T::LABEL));
                        reload(&screen, &editor, &loading);
                    }
                    Err(err) => screen.fail(err),
                }
                screen.redraw.force_update();
            });
        })
    };

    let on_request_delete = {
        let (screen, editor) = (screen.clone(), editor.clone());
        Callback::from(move |record: T| {
            let opened = editor.borrow_mut().request_delete(&record);
            if let Err(err) = opened {
                screen.fail(err);
            }
            screen.redraw.force_update();
        })
    };
    let on_confirm_delete = {
        let (screen, editor, saving) = (screen.clone(), editor.clone(), saving.clone());
        Callback::from(move |_: ()| {
            let token = editor.borrow_mut().confirm_delete.confirm();
            let Some(token) = token else { return };
            let target = editor.borrow().delete_target(token);
            let (key, path) = match target {
                Ok(t) => t,
                Err(err) => return screen.fail(err),
            };
            saving.set(true);
            let (screen, editor, saving) = (screen.clone(), editor.clone(), saving.clone());
            spawn_local(async move {
                let result = screen
                    .backend
                    .write_raw(console_core::api::WriteMethod::Delete, &path, None)
                    .await
                    .and_then(classify);
                saving.set(false);
                match result {
                    Ok(_) => {
                        editor.borrow_mut().remove_row(&key);
                        screen.notify(format!("{} deleted", T::LABEL));
                    }
                    Err(err) => screen.fail(err),
                }
                screen.redraw.force_update();
            });
        })
    };
    let on_cancel_delete = {
        let (screen, editor) = (screen.clone(), editor.clone());
        Callback::from(move |_: ()| {
            editor.borrow_mut().confirm_delete.cancel();
            screen.redraw.force_update();
        })
    };

    let row_actions = {
        let (on_edit, on_request_delete) = (on_edit.clone(), on_request_delete.clone());
        let extra = props.extra_actions.clone();
        Callback::from(move |record: T| {
            let edit = {
                let (cb, r) = (on_edit.clone(), record.clone());
                Callback::from(move |_: MouseEvent| cb.emit(r.clone()))
            };
            let delete = {
                let (cb, r) = (on_request_delete.clone(), record.clone());
                Callback::from(move |_: MouseEvent| cb.emit(r.clone()))
            };
            html! {
                <>
                    if permission.can_edit {
                        <button class="btn btn-sm btn-outline-primary me-1" onclick={edit}>{"Edit"}</button>
                    }
                    if permission.can_delete {
                        <button class="btn btn-sm btn-outline-danger me-1" onclick={delete}>{"Delete"}</button>
                    }
                    { extra.as_ref().map(|cb| cb.emit(record.clone())).unwrap_or_default() }
                </>
            }
        })
    };

    let e = editor.borrow();
    let f = form.borrow();
    let editing = e.form().map(Form::is_edit).unwrap_or(false);
    let field_error = |name: &str| -> Option<String> {
        f.parse_errors
            .iter()
            .chain(e.errors().iter())
            .find(|err| err.field == name)
            .map(|err| err.message.clone())
    };
    let inputs = T::FIELDS.iter().map(|fd| {
        let form = form.clone();
        let name = fd.name;
        let oninput = Callback::from(move |ev: InputEvent| {
            let input: HtmlInputElement = ev.target_unchecked_into();
            form.borrow_mut().values.insert(name, input.value());
        });
        let error = field_error(fd.name);
        html! {
            <div class="mb-3" key={fd.name}>
                <label class="form-label">{ fd.label }</label>
                <input
                    class={classes!("form-control", error.is_some().then_some("is-invalid"))}
                    type={fd.input}
                    value={f.values.get(fd.name).cloned().unwrap_or_default()}
                    disabled={fd.key && editing}
                    {oninput}
                />
                if let Some(msg) = error {
                    <div class="invalid-feedback">{ msg }</div>
                }
            </div>
        }
    });
    let title = format!("{} {}", if editing { "Edit" } else { "New" }, T::LABEL.to_lowercase());

    html! {
        <div class="masters">
            <div class="d-flex justify-content-between align-items-center mb-3">
                <h2>{ format!("{}s", T::LABEL) }</h2>
                if permission.can_add {
                    <button class="btn btn-primary" onclick={on_new}>{ format!("Add {}", T::LABEL.to_lowercase()) }</button>
                }
            </div>
            { screen.alert_view() }
            <DataGrid<T> rows={Rc::new(e.rows().to_vec())} page_size={page_size} loading={*loading} actions={Some(row_actions)} />

            <StandardModal
                show={f.creating || e.form().is_some()}
                {title}
                on_close={on_close}
                on_confirm={Some(on_submit)}
                confirm_label="Save"
                loading={*saving}
            >
                { for inputs }
            </StandardModal>
            <ConfirmDeleteModal
                show={e.confirm_delete.is_open()}
                variant={e.confirm_delete.variant}
                title={e.confirm_delete.title.clone()}
                message={e.confirm_delete.message.clone()}
                loading={*saving}
                on_confirm={on_confirm_delete}
                on_cancel={on_cancel_delete}
            />
            { screen.toast_view() }
        </div>
    }
}

/* ---------------- miqaats: hand off to assignment screens ---------------- */

#[function_component(MiqaatsPage)]
pub fn miqaats_page() -> Html {
    let navigator = use_navigator();
    let extra = Callback::from(move |m: Miqaat| {
        let handoff = MiqaatHandoff {
            from_miqaat_creation: true,
            miqaat_id: m.id,
            miqaat_name: m.name.clone(),
            venue_id: m.venue_id,
        };
        let to = |route: Route| {
            let (navigator, handoff) = (navigator.clone(), handoff.clone());
            Callback::from(move |_: MouseEvent| {
                if let Some(nav) = &navigator {
                    nav.push_with_state(&route, handoff.clone());
                }
            })
        };
        html! {
            <>
                <button class="btn btn-sm btn-outline-success me-1" onclick={to(Route::Duties)}>{"Duties"}</button>
                <button class="btn btn-sm btn-outline-success" onclick={to(Route::Incharges)}>{"Incharges"}</button>
            </>
        }
    });
    html! { <MasterPage<Miqaat> extra_actions={Some(extra)} /> }
}
