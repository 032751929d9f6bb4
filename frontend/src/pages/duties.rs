use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use console_core::access::modules;
use console_core::api::{CatalogBackend, DutyBackend};
use console_core::cascade::Slot;
use console_core::ids::TempId;
use console_core::model::{Duty, Jamiaat, Location, Miqaat, MiqaatHandoff, Team};
use console_core::staging::{run_commit, CommitSummary, StageError};
use console_core::workflow::DutyAssignment;

use crate::components::select::Choice;
use crate::components::{ConfirmDeleteModal, DataGrid, Select};

use crate::Route;

use super::{spawn_fetches, use_screen};

fn choices<T: Clone>(items: &[T], label: impl Fn(&T) -> String) -> Vec<Choice<T>> {
    items.iter().map(|i| Choice { label: label(i), value: i.clone() }).collect()
}

fn position<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Vec<usize> {
    items.iter().position(pred).into_iter().collect()
}

#[function_component(Duties)]
pub fn duties() -> Html {
    let screen = use_screen();
    let permission = screen
        .session
        .as_ref()
        .map(|s| s.permission(modules::DUTY))
        .unwrap_or_default();
    let state = use_mut_ref(|| DutyAssignment::new(permission, crate::config::load().commit_policy()));
    let location = use_location();
    let saving = use_state(|| false);
    let staging = use_state(|| false);
    let navigator = use_navigator();

    /* ---------------- mount: miqaat list + optional handoff ---------------- */
    {
        let screen = screen.clone();
        let state = state.clone();
        let handoff: Option<Rc<MiqaatHandoff>> = location.as_ref().and_then(|l| l.state::<MiqaatHandoff>());
        use_effect_with((), move |_| {
            let mut fetches = vec![state.borrow_mut().cascade.load_miqaats()];
            if let Some(h) = handoff {
                let locked = state.borrow_mut().cascade.apply_handoff(&h);
                fetches.extend(locked);
                // Drop the history state so a reload or back/forward does not lock again.
                if let Some(nav) = navigator {
                    nav.replace(&Route::Duties);
                }
            }
            spawn_fetches(&screen, &state, fetches);
            || ()
        });
    }

    /* ---------------- cascade selections ---------------- */
    let on_miqaat = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |picked: Vec<Miqaat>| {
            let fetches = state.borrow_mut().select_miqaat(picked.into_iter().next());
            spawn_fetches(&screen, &state, fetches);
            screen.redraw.force_update();
        })
    };
    let on_jamiaat = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |picked: Vec<Jamiaat>| {
            let fetches = state.borrow_mut().cascade.select_jamiaat(picked.into_iter().next());
            spawn_fetches(&screen, &state, fetches);
            screen.redraw.force_update();
        })
    };
    let on_teams = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |picked: Vec<Team>| {
            let fetches = state.borrow_mut().cascade.select_teams(picked);
            spawn_fetches(&screen, &state, fetches);
            screen.redraw.force_update();
        })
    };
    let on_location = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |picked: Vec<Location>| {
            state.borrow_mut().cascade.select_location(picked.into_iter().next());
            screen.redraw.force_update();
        })
    };
    let on_quota = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            state.borrow_mut().set_quota_input(&input.value());
            screen.redraw.force_update();
        })
    };

    /* ---------------- staging ---------------- */
    let on_stage = {
        let (screen, state, staging) = (screen.clone(), state.clone(), staging.clone());
        Callback::from(move |_: MouseEvent| {
            if *staging {
                return;
            }
            let plan = state.borrow_mut().prepare_stage();
            let plan = match plan {
                Ok(plan) => plan,
                Err(StageError::Denied(err)) => return screen.fail(err),
                Err(err) => return screen.alert.set(Some(err.to_string())),
            };
            staging.set(true);
            let (screen, state, staging) = (screen.clone(), state.clone(), staging.clone());
            spawn_local(async move {
                let mut fetched = Vec::new();
                for team in plan.missing_counts().to_vec() {
                    fetched.push((team, screen.backend.team_member_count(team).await));
                }
                staging.set(false);
                let staged = state.borrow_mut().finish_stage(plan, fetched);
                match staged {
                    Ok(ids) => screen.notify(format!("{} duties added to the list", ids.len())),
                    Err(err) => screen.alert.set(Some(err.to_string())),
                }
                screen.redraw.force_update();
            });
        })
    };
    let on_pending_quota = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |(temp_id, raw): (TempId, String)| {
            let ok = state.borrow_mut().update_staged_quota(temp_id, &raw);
            if !ok {
                screen.alert.set(Some("Quota must be positive and fit the team and the remaining quota".into()));
            }
            screen.redraw.force_update();
        })
    };
    let on_request_unstage = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |temp_id: TempId| {
            state.borrow_mut().request_unstage(temp_id);
            screen.redraw.force_update();
        })
    };
    let on_confirm_unstage = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |_: ()| {
            state.borrow_mut().confirm_unstage();
            screen.redraw.force_update();
        })
    };
    let on_cancel_unstage = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |_: ()| {
            state.borrow_mut().confirm_unstage.cancel();
            screen.redraw.force_update();
        })
    };

    /* ---------------- bulk save ---------------- */
    let on_commit = {
        let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
        Callback::from(move |_: MouseEvent| {
            let batch = state.borrow().commit_batch();
            let batch = match batch {
                Ok(batch) if !batch.is_empty() => batch,
                Ok(_) => return,
                Err(err) => return screen.fail(err),
            };
            saving.set(true);
            let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
            spawn_local(async move {
                let (results, aborted) = run_commit(&*screen.backend, &batch).await;
                let (report, refresh) = state.borrow_mut().settle_commit(results, aborted);
                saving.set(false);
                match report.summary() {
                    CommitSummary::AllSaved => screen.notify(report.message()),
                    CommitSummary::Nothing => {}
                    CommitSummary::Partial | CommitSummary::AllFailed => {
                        let details: Vec<String> = report.errors.iter().map(|(_, e)| e.clone()).collect();
                        screen.alert.set(Some(format!("{}: {}", report.message(), details.join("; "))));
                    }
                }
                if let Some(err) = report.aborted {
                    screen.fail(err);
                }
                spawn_fetches(&screen, &state, refresh);
                screen.redraw.force_update();
            });
        })
    };
    let on_clear = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            state.borrow_mut().clear();
            screen.redraw.force_update();
        })
    };

    /* ---------------- edit / delete saved ---------------- */
    let on_edit = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |duty: Duty| {
            let fetches = state.borrow_mut().begin_edit(duty);
            match fetches {
                Ok(fetches) => spawn_fetches(&screen, &state, fetches),
                Err(err) => screen.fail(err),
            }
            screen.redraw.force_update();
        })
    };
    let on_cancel_edit = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            state.borrow_mut().cancel_edit();
            screen.redraw.force_update();
        })
    };
    let on_update = {
        let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
        Callback::from(move |_: MouseEvent| {
            let request = state.borrow().edit_request();
            let (id, draft) = match request {
                Ok(r) => r,
                Err(err) => return screen.fail(err),
            };
            let miqaat = state.borrow().cascade.miqaat().cloned();
            saving.set(true);
            let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
            spawn_local(async move {
                let result = screen.backend.update_duty(id, &draft).await.and_then(|o| o.into_result());
                saving.set(false);
                match result {
                    Ok(_) => {
                        let fetches = {
                            let mut s = state.borrow_mut();
                            s.cancel_edit();
                            s.select_miqaat(miqaat)
                        };
                        spawn_fetches(&screen, &state, fetches);
                        screen.notify("Duty updated");
                    }
                    Err(err) => screen.fail(err),
                }
                screen.redraw.force_update();
            });
        })
    };
    let on_request_delete = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |duty: Duty| {
            let opened = state.borrow_mut().request_delete(&duty);
            if let Err(err) = opened {
                screen.fail(err);
            }
            screen.redraw.force_update();
        })
    };
    let on_confirm_delete = {
        let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
        Callback::from(move |_: ()| {
            let token = state.borrow_mut().confirm_delete.confirm();
            let Some(token) = token else { return };
            let target = state.borrow().delete_target(token);
            let id = match target {
                Ok(id) => id,
                Err(err) => return screen.fail(err),
            };
            saving.set(true);
            let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
            spawn_local(async move {
                let result = screen.backend.delete_duty(id).await.and_then(|o| o.into_result());
                saving.set(false);
                match result {
                    Ok(_) => {
                        let refresh = state.borrow_mut().cascade.refresh_quota();
                        spawn_fetches(&screen, &state, refresh);
                        screen.notify("Duty deleted");
                    }
                    Err(err) => screen.fail(err),
                }
                screen.redraw.force_update();
            });
        })
    };
    let on_cancel_delete = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |_: ()| {
            state.borrow_mut().confirm_delete.cancel();
            screen.redraw.force_update();
        })
    };

    /* ---------------- render ---------------- */
    let s = state.borrow();
    let c = &s.cascade;
    let gate = s.gate();
    let editing = c.editing().is_some();

    let miqaat_id = c.miqaat().map(|m| m.id);
    let jamiaat_id = c.jamiaat().map(|j| j.id);
    let location_id = c.location().map(|l| l.id);
    let team_ids: Vec<_> = c.teams().iter().map(|t| t.id).collect();
    let team_selected: Vec<usize> = c
        .team_options()
        .iter()
        .enumerate()
        .filter(|(_, t)| team_ids.contains(&t.id))
        .map(|(i, _)| i)
        .collect();

    let pending_rows = s.staging.items().iter().map(|p| {
        let temp_id = p.temp_id;
        let on_quota = on_pending_quota.clone();
        let onchange = Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_quota.emit((temp_id, input.value()));
        });
        let on_remove = on_request_unstage.clone();
        let onclick = Callback::from(move |_: MouseEvent| on_remove.emit(temp_id));
        html! {
            <tr key={temp_id.0.to_string()}>
                <td>{ &p.team.name }</td>
                <td>{ &p.location.name }</td>
                <td><input class="form-control form-control-sm" type="number" min="1" value={p.quota.to_string()} {onchange} /></td>
                <td>{ p.member_count }</td>
                <td><button class="btn btn-sm btn-outline-danger" {onclick}>{"Remove"}</button></td>
            </tr>
        }
    });

    let row_actions = {
        let on_edit = on_edit.clone();
        let on_request_delete = on_request_delete.clone();
        Callback::from(move |duty: Duty| {
            let edit = {
                let (cb, d) = (on_edit.clone(), duty.clone());
                Callback::from(move |_: MouseEvent| cb.emit(d.clone()))
            };
            let delete = {
                let (cb, d) = (on_request_delete.clone(), duty.clone());
                Callback::from(move |_: MouseEvent| cb.emit(d.clone()))
            };
            html! {
                <>
                    if permission.can_edit {
                        <button class="btn btn-sm btn-outline-primary me-1" onclick={edit}>{"Edit"}</button>
                    }
                    if permission.can_delete {
                        <button class="btn btn-sm btn-outline-danger" onclick={delete}>{"Delete"}</button>
                    }
                </>
            }
        })
    };

    html! {
        <div class="duties">
            <h2>{ if editing { "Edit duty" } else { "Duty assignment" } }</h2>
            { screen.alert_view() }

            <div class="card mb-4"><div class="card-body">
                <Select<Miqaat>
                    label="Miqaat"
                    options={choices(c.miqaat_options(), |m| m.name.clone())}
                    selected={position(c.miqaat_options(), |m| Some(m.id) == miqaat_id)}
                    disabled={c.is_locked()}
                    loading={c.is_loading(Slot::Miqaats)}
                    on_change={on_miqaat}
                />
                <Select<Jamiaat>
                    label="Jamiaat"
                    options={choices(c.jamiaat_options(), |j| j.name.clone())}
                    selected={position(c.jamiaat_options(), |j| Some(j.id) == jamiaat_id)}
                    disabled={miqaat_id.is_none()}
                    loading={c.is_loading(Slot::Jamiaats)}
                    on_change={on_jamiaat}
                />
                <Select<Team>
                    label={if c.is_single_team() { "Team" } else { "Teams" }}
                    options={choices(c.team_options(), |t| match t.member_count {
                        Some(n) => format!("{} ({n})", t.name),
                        None => t.name.clone(),
                    })}
                    selected={team_selected}
                    multiple={!c.is_single_team()}
                    disabled={miqaat_id.is_none()}
                    loading={c.is_loading(Slot::Teams)}
                    on_change={on_teams}
                />
                <Select<Location>
                    label="Location"
                    options={choices(c.location_options(), |l| l.name.clone())}
                    selected={position(c.location_options(), |l| Some(l.id) == location_id)}
                    disabled={miqaat_id.is_none()}
                    loading={c.is_loading(Slot::Locations)}
                    on_change={on_location}
                />

                <div class="mb-3">
                    <label class="form-label">{"Quota per team"}</label>
                    <input
                        class={classes!("form-control", (!gate.can_submit() && !s.quota_input().is_empty()).then_some("is-invalid"))}
                        type="number"
                        min="1"
                        value={s.quota_input().to_string()}
                        oninput={on_quota}
                    />
                    if let Some(msg) = gate.first_message().filter(|_| !s.quota_input().is_empty()) {
                        <div class="invalid-feedback d-block">{ msg }</div>
                    }
                    <small class="text-muted">
                        { match c.remaining_quota() {
                            Some(_) => format!("Remaining quota: {}", s.effective_remaining()),
                            None if c.is_loading(Slot::RemainingQuota) => "Loading remaining quota…".to_string(),
                            None => String::new(),
                        } }
                    </small>
                </div>

                if editing {
                    <button class="btn btn-primary me-2" disabled={!gate.can_submit() || *saving} onclick={on_update}>{"Update"}</button>
                    <button class="btn btn-secondary" onclick={on_cancel_edit}>{"Cancel"}</button>
                } else {
                    <button class="btn btn-primary me-2" disabled={!gate.can_submit() || !permission.can_add || *staging} onclick={on_stage}>
                        { if *staging { "Adding…" } else { "Add to list" } }
                    </button>
                    <button class="btn btn-outline-secondary" onclick={on_clear}>{"Clear"}</button>
                }
            </div></div>

            if !s.staging.is_empty() {
                <div class="card mb-4"><div class="card-body">
                    <h4>{ format!("Pending duties ({}, quota {})", s.staging.len(), s.staging.staged_quota()) }</h4>
                    <table class="table table-sm">
                        <thead><tr><th>{"Team"}</th><th>{"Location"}</th><th>{"Quota"}</th><th>{"Members"}</th><th /></tr></thead>
                        <tbody>{ for pending_rows }</tbody>
                    </table>
                    <button class="btn btn-success" disabled={*saving || !permission.can_add} onclick={on_commit}>
                        { if *saving { "Saving…" } else { "Save all" } }
                    </button>
                </div></div>
            }

            if miqaat_id.is_some() && !editing {
                <h4>{"Assigned duties"}</h4>
                <DataGrid<Duty>
                    rows={Rc::new(c.saved_duties().to_vec())}
                    loading={c.is_loading(Slot::Duties)}
                    actions={Some(row_actions)}
                />
            }

            <ConfirmDeleteModal
                show={s.confirm_unstage.is_open()}
                variant={s.confirm_unstage.variant}
                title={s.confirm_unstage.title.clone()}
                message={s.confirm_unstage.message.clone()}
                confirm_label={Some(AttrValue::Static("Remove"))}
                on_confirm={on_confirm_unstage}
                on_cancel={on_cancel_unstage}
            />
            <ConfirmDeleteModal
                show={s.confirm_delete.is_open()}
                variant={s.confirm_delete.variant}
                title={s.confirm_delete.title.clone()}
                message={s.confirm_delete.message.clone()}
                loading={*saving}
                on_confirm={on_confirm_delete}
                on_cancel={on_cancel_delete}
            />
            { screen.toast_view() }
        </div>
    }
}
