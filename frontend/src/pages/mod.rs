use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use console_core::cascade::{run_fetch, Cascade, Fetch};
use console_core::error::ConsoleError;
use console_core::incharge::InchargeAssignment;
use console_core::workflow::DutyAssignment;

use crate::api::{surface, use_backend, HttpBackend};
use crate::session::{use_session, SessionHandle};

pub mod dashboard;
pub mod duties;
pub mod incharges;
pub mod masters;
pub mod reports;

/* ---------------- per-screen plumbing ---------------- */

/// What every screen needs to talk to the API and report back.
#[derive(Clone)]
pub struct Screen {
    pub backend: Rc<HttpBackend>,
    pub session: SessionHandle,
    pub redraw: UseForceUpdateHandle,
    pub alert: UseStateHandle<Option<String>>,
    pub toast: UseStateHandle<Option<String>>,
}

impl Screen {
    pub fn fail(&self, err: ConsoleError) {
        if let Some(msg) = surface(err, &self.session) {
            self.alert.set(Some(msg));
        }
    }

    pub fn notify(&self, msg: impl Into<String>) {
        self.toast.set(Some(msg.into()));
    }

    pub fn alert_view(&self) -> Html {
        let Some(msg) = (*self.alert).clone() else {
            return Html::default();
        };
        let alert = self.alert.clone();
        let onclick = Callback::from(move |_: MouseEvent| alert.set(None));
        html! {
            <div class="alert alert-danger alert-dismissible" role="alert">
                { msg }
                <button type="button" class="btn-close" {onclick} />
            </div>
        }
    }

    pub fn toast_view(&self) -> Html {
        let toast = self.toast.clone();
        let on_close = Callback::from(move |_: ()| toast.set(None));
        html! {
            <crate::components::SuccessToaster
                show={self.toast.is_some()}
                message={(*self.toast).clone().unwrap_or_default()}
                duration_ms={crate::config::load().toast_duration_ms}
                {on_close}
            />
        }
    }
}

#[hook]
pub fn use_screen() -> Screen {
    Screen {
        backend: use_backend(),
        session: use_session(),
        redraw: use_force_update(),
        alert: use_state(|| None),
        toast: use_state(|| None),
    }
}

/* ---------------- cascade fetches ---------------- */

pub trait HasCascade {
    fn cascade_mut(&mut self) -> &mut Cascade;
}

impl HasCascade for DutyAssignment {
    fn cascade_mut(&mut self) -> &mut Cascade {
        &mut self.cascade
    }
}

impl HasCascade for InchargeAssignment {
    fn cascade_mut(&mut self) -> &mut Cascade {
        &mut self.cascade
    }
}

/// Fires each fetch on its own; results land through the ticket check, so
/// whichever finishes last for a slot only wins if it is still current.
pub fn spawn_fetches<S: HasCascade + 'static>(screen: &Screen, state: &Rc<RefCell<S>>, fetches: Vec<Fetch>) {
    for fetch in fetches {
        let screen = screen.clone();
        let state = state.clone();
        spawn_local(async move {
            let result = run_fetch(&*screen.backend, &fetch.kind).await;
            if let Err(err) = &result {
                if err.requires_logout() {
                    screen.fail(err.clone());
                    return;
                }
            }
            let applied = state.borrow_mut().cascade_mut().apply(fetch.ticket, result);
            if applied {
                screen.redraw.force_update();
            }
        });
    }
}
