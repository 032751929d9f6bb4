use gloo::storage::{LocalStorage, Storage};
use yew::prelude::*;

use console_core::session::{KeyValueStore, LoginGrant, Session, SessionManager};

/* ---------------- browser-local store ---------------- */

/// `localStorage`, raw strings (no JSON wrapping) so the keys stay readable
/// by anything else sharing the origin.
#[derive(Clone, Copy, Default)]
pub struct LocalStore;

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if LocalStorage::raw().set_item(key, value).is_err() {
            log::error!("localStorage refused {key}");
        }
    }

    fn remove(&self, key: &str) {
        let _ = LocalStorage::raw().remove_item(key);
    }
}

pub fn manager() -> SessionManager<LocalStore> {
    SessionManager::new(LocalStore)
}

pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/* ---------------- context ---------------- */

pub type SessionHandle = UseStateHandle<Option<Session>>;

#[hook]
pub fn use_session() -> SessionHandle {
    use_context::<SessionHandle>().unwrap_or_else(|| panic!("SessionProvider missing"))
}

pub fn sign_in(handle: &SessionHandle, grant: LoginGrant) {
    let session = manager().login(grant);
    log::info!("signed in as {}", session.its_id());
    handle.set(Some(session));
}

pub fn sign_out(handle: &SessionHandle) {
    manager().logout();
    handle.set(None);
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    #[prop_or_default]
    pub children: Children,
}

/// Restores the stored session once, synchronously, before the first render.
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let session = use_state(|| match manager().restore(now_ms()) {
        Ok(s) => Some(s),
        Err(reason) => {
            log::info!("no session restored: {reason}");
            None
        }
    });

    html! {
        <ContextProvider<SessionHandle> context={session}>
            { for props.children.iter() }
        </ContextProvider<SessionHandle>>
    }
}
