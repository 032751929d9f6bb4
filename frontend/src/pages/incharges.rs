use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::prelude::*;

use console_core::access::modules;
use console_core::api::InchargeBackend;
use console_core::cascade::Slot;
use console_core::incharge::{InchargeAssignment, ListFetch};
use console_core::model::{Incharge, Jamiaat, Location, Member, Miqaat, MiqaatHandoff, Team};

use crate::components::select::Choice;
use crate::components::{ConfirmDeleteModal, DataGrid, Select};

use crate::Route;

use super::{spawn_fetches, use_screen, Screen};

fn choices<T: Clone>(items: &[T], label: impl Fn(&T) -> String) -> Vec<Choice<T>> {
    items.iter().map(|i| Choice { label: label(i), value: i.clone() }).collect()
}

fn position<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Vec<usize> {
    items.iter().position(pred).into_iter().collect()
}

fn load_list(screen: &Screen, state: &Rc<std::cell::RefCell<InchargeAssignment>>, fetch: Option<ListFetch>) {
    let Some(fetch) = fetch else { return };
    let (screen, state) = (screen.clone(), state.clone());
    spawn_local(async move {
        let result = screen.backend.incharges(fetch.miqaat).await;
        if let Err(err) = &result {
            if err.requires_logout() {
                return screen.fail(err.clone());
            }
        }
        if state.borrow_mut().apply_list(fetch, result) {
            screen.redraw.force_update();
        }
    });
}

#[function_component(Incharges)]
pub fn incharges() -> Html {
    let screen = use_screen();
    let permission = screen
        .session
        .as_ref()
        .map(|s| s.permission(modules::INCHARGE))
        .unwrap_or_default();
    let state = use_mut_ref(|| InchargeAssignment::new(permission));
    let route_state = use_location();
    let saving = use_state(|| false);
    let navigator = use_navigator();

    {
        let screen = screen.clone();
        let state = state.clone();
        let handoff: Option<Rc<MiqaatHandoff>> = route_state.as_ref().and_then(|l| l.state::<MiqaatHandoff>());
        use_effect_with((), move |_| {
            let mut fetches = vec![state.borrow_mut().cascade.load_miqaats()];
            let mut list = None;
            if let Some(h) = handoff {
                let locked = state.borrow_mut().apply_handoff(&h);
                if !locked.is_empty() {
                    list = state.borrow_mut().list_fetch();
                }
                fetches.extend(locked);
                if let Some(nav) = navigator {
                    nav.replace(&Route::Incharges);
                }
            }
            spawn_fetches(&screen, &state, fetches);
            load_list(&screen, &state, list);
            || ()
        });
    }

    let on_miqaat = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |picked: Vec<Miqaat>| {
            let (fetches, list) = {
                let mut s = state.borrow_mut();
                let fetches = s.select_miqaat(picked.into_iter().next());
                (fetches, s.list_fetch())
            };
            spawn_fetches(&screen, &state, fetches);
            load_list(&screen, &state, list);
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
    let on_team = {
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
    let on_member = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |picked: Vec<Member>| {
            state.borrow_mut().cascade.select_member(picked.into_iter().next());
            screen.redraw.force_update();
        })
    };

    let on_save = {
        let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
        Callback::from(move |_: MouseEvent| {
            let draft = state.borrow().draft();
            let draft = match draft {
                Ok(d) => d,
                Err(err) => return screen.fail(err),
            };
            saving.set(true);
            let (screen, state, saving) = (screen.clone(), state.clone(), saving.clone());
            spawn_local(async move {
                let result = screen.backend.create_incharge(&draft).await.and_then(|o| o.into_result());
                saving.set(false);
                match result {
                    Ok(_) => {
                        log::info!("incharge {} assigned to location {}", draft.its_id, draft.location_id);
                        let list = state.borrow_mut().after_save();
                        load_list(&screen, &state, list);
                        screen.notify("Incharge assigned");
                    }
                    Err(err) => screen.fail(err),
                }
                screen.redraw.force_update();
            });
        })
    };

    let on_request_delete = {
        let (screen, state) = (screen.clone(), state.clone());
        Callback::from(move |row: Incharge| {
            let opened = state.borrow_mut().request_delete(&row);
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
                let result = screen.backend.delete_incharge(id).await.and_then(|o| o.into_result());
                saving.set(false);
                match result {
                    Ok(_) => {
                        state.borrow_mut().remove_saved(id);
                        screen.notify("Incharge removed");
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

    let s = state.borrow();
    let c = &s.cascade;
    let miqaat_id = c.miqaat().map(|m| m.id);
    let jamiaat_id = c.jamiaat().map(|j| j.id);
    let team_id = c.teams().first().map(|t| t.id);
    let location_id = c.location().map(|l| l.id);
    let its = c.member().map(|m| m.its_id.clone());
    let errors = s.validate();
    let touched = c.member().is_some() && c.location().is_some();

    let row_actions = permission.can_delete.then(|| {
        let on_request_delete = on_request_delete.clone();
        Callback::from(move |row: Incharge| {
            let cb = on_request_delete.clone();
            let onclick = Callback::from(move |_: MouseEvent| cb.emit(row.clone()));
            html! { <button class="btn btn-sm btn-outline-danger" {onclick}>{"Remove"}</button> }
        })
    });

    html! {
        <div class="incharges">
            <h2>{"Incharge assignment"}</h2>
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
                    label="Team"
                    options={choices(c.team_options(), |t| t.name.clone())}
                    selected={position(c.team_options(), |t| Some(t.id) == team_id)}
                    disabled={miqaat_id.is_none()}
                    loading={c.is_loading(Slot::Teams)}
                    on_change={on_team}
                />
                <Select<Member>
                    label="Member"
                    options={choices(c.member_options(), |m| format!("{} ({})", m.full_name, m.its_id))}
                    selected={position(c.member_options(), |m| Some(&m.its_id) == its.as_ref())}
                    disabled={team_id.is_none()}
                    loading={c.is_loading(Slot::Members)}
                    on_change={on_member}
                />
                <Select<Location>
                    label="Location"
                    options={choices(c.location_options(), |l| l.name.clone())}
                    selected={position(c.location_options(), |l| Some(l.id) == location_id)}
                    disabled={miqaat_id.is_none()}
                    loading={c.is_loading(Slot::Locations)}
                    on_change={on_location}
                />
                if touched {
                    { for errors.iter().map(|e| html! { <div class="text-danger small">{ e }</div> }) }
                }
                <button
                    class="btn btn-primary"
                    disabled={!errors.is_empty() || *saving || !permission.can_add}
                    onclick={on_save}
                >
                    { if *saving { "Saving…" } else { "Assign incharge" } }
                </button>
            </div></div>

            if miqaat_id.is_some() {
                <h4>{"Assigned incharges"}</h4>
                <DataGrid<Incharge> rows={Rc::new(s.saved().to_vec())} actions={row_actions} />
            }

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
