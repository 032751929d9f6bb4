use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use console_core::api::{CatalogBackend, ReportBackend};
use console_core::grid::DrillDown;
use console_core::model::Miqaat;
use console_core::reports::{self, AttendanceDetail, AttendanceRow, DutyReportRow, ReportKind, ReportRows, ReportView};

use crate::components::select::Choice;
use crate::components::{DataGrid, DrillDownModal, Select};

use super::use_screen;

#[function_component(Reports)]
pub fn reports() -> Html {
    let screen = use_screen();
    let miqaats = use_state(Vec::<Miqaat>::new);
    let selected = use_state(|| None::<Miqaat>);
    let tab = use_state(|| ReportKind::Duties);
    let view = use_mut_ref(ReportView::default);
    let drill = use_mut_ref(DrillDown::<AttendanceDetail>::new);

    {
        let (screen, miqaats) = (screen.clone(), miqaats.clone());
        use_effect_with((), move |_| {
            spawn_local(async move {
                match screen.backend.miqaats().await {
                    Ok(list) => miqaats.set(list),
                    Err(err) => screen.fail(err),
                }
            });
            || ()
        });
    }

    let on_miqaat = {
        let (selected, view) = (selected.clone(), view.clone());
        Callback::from(move |picked: Vec<Miqaat>| {
            let picked = picked.into_iter().next();
            view.borrow_mut().select_miqaat(picked.as_ref().map(|m| m.id));
            selected.set(picked);
        })
    };

    // A newer load or miqaat change supersedes whatever is in flight.
    let on_load = {
        let (screen, tab, view) = (screen.clone(), tab.clone(), view.clone());
        Callback::from(move |_: MouseEvent| {
            let ticket = view.borrow_mut().begin_load(*tab);
            let Some(ticket) = ticket else {
                return screen.alert.set(Some("Select a miqaat".into()));
            };
            screen.redraw.force_update();
            let (screen, view) = (screen.clone(), view.clone());
            spawn_local(async move {
                let result = match ticket.kind {
                    ReportKind::Duties => screen.backend.duty_report(ticket.miqaat).await.map(ReportRows::Duties),
                    ReportKind::Attendance => {
                        screen.backend.attendance_report(ticket.miqaat).await.map(ReportRows::Attendance)
                    }
                };
                if let Err(err) = &result {
                    if err.requires_logout() {
                        return screen.fail(err.clone());
                    }
                }
                let applied = view.borrow_mut().resolve(ticket, result);
                match applied {
                    Ok(true) => screen.redraw.force_update(),
                    Ok(false) => {}
                    Err(err) => {
                        screen.fail(err);
                        screen.redraw.force_update();
                    }
                }
            });
        })
    };

    let switch_tab = |to: ReportKind| {
        let tab = tab.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            tab.set(to);
        })
    };

    // Latest click owns the modal; earlier detail loads are dropped.
    let on_team_click = {
        let (screen, selected, drill) = (screen.clone(), selected.clone(), drill.clone());
        Callback::from(move |row: AttendanceRow| {
            let Some(miqaat) = (*selected).clone() else { return };
            let ticket = drill
                .borrow_mut()
                .open(row.team_id.to_string(), format!("{} attendance", row.team_name));
            screen.redraw.force_update();
            let (screen, drill) = (screen.clone(), drill.clone());
            spawn_local(async move {
                let result = screen.backend.attendance_detail(miqaat.id, row.team_id).await;
                if let Err(err) = &result {
                    if err.requires_logout() {
                        return screen.fail(err.clone());
                    }
                }
                if drill.borrow_mut().resolve(ticket, result) {
                    screen.redraw.force_update();
                }
            });
        })
    };

    let on_drill_close = {
        let (screen, drill) = (screen.clone(), drill.clone());
        Callback::from(move |_: ()| {
            drill.borrow_mut().close();
            screen.redraw.force_update();
        })
    };

    let options: Vec<Choice<Miqaat>> =
        miqaats.iter().map(|m| Choice { label: m.name.clone(), value: m.clone() }).collect();
    let selected_ix: Vec<usize> =
        miqaats.iter().position(|m| Some(m.id) == selected.as_ref().map(|s| s.id)).into_iter().collect();
    let v = view.borrow();
    let loading = v.loading;
    let duty_rows = Rc::new(v.duties.clone());
    let attendance_rows = Rc::new(v.attendance.clone());
    let sums = reports::totals(&attendance_rows);
    let drill_state = Rc::new(drill.borrow().clone());
    let tab_class = |t: ReportKind| classes!("nav-link", (*tab == t).then_some("active"));

    html! {
        <div class="reports">
            <h2>{"Reports"}</h2>
            { screen.alert_view() }
            <div class="card mb-4"><div class="card-body">
                <Select<Miqaat> label="Miqaat" {options} selected={selected_ix} on_change={on_miqaat} />
                <ul class="nav nav-tabs mb-3">
                    <li class="nav-item">
                        <a class={tab_class(ReportKind::Duties)} href="#" onclick={switch_tab(ReportKind::Duties)}>{"Duties"}</a>
                    </li>
                    <li class="nav-item">
                        <a class={tab_class(ReportKind::Attendance)} href="#" onclick={switch_tab(ReportKind::Attendance)}>{"Attendance"}</a>
                    </li>
                </ul>
                <button class="btn btn-primary" disabled={selected.is_none() || loading} onclick={on_load}>
                    { if loading { "Loading…" } else { "Load report" } }
                </button>
            </div></div>

            if *tab == ReportKind::Duties {
                <DataGrid<DutyReportRow> rows={duty_rows} {loading} />
            } else {
                <div class="row mb-3">
                    <div class="col">{ format!("Members: {}", sums.members) }</div>
                    <div class="col">{ format!("Present: {}", sums.present) }</div>
                    <div class="col">{ format!("Absent: {}", sums.absent) }</div>
                    <div class="col">{ format!("Attendance: {:.1}%", sums.percentage) }</div>
                </div>
                <DataGrid<AttendanceRow>
                    rows={attendance_rows}
                    {loading}
                    on_row_click={Some(on_team_click)}
                />
            }

            <DrillDownModal<AttendanceDetail> state={drill_state} on_close={on_drill_close} />
        </div>
    }
}
