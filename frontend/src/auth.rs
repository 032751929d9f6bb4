use yew::prelude::*;
use yew_router::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;

use console_core::ids::ItsId;

use crate::api::HttpBackend;
use crate::session::{sign_in, use_session};
use crate::Route;

#[function_component(LoginForm)]
pub fn login_form() -> Html {
    let session = use_session();
    let navigator = use_navigator();
    let its_ref = use_node_ref();
    let password_ref = use_node_ref();
    let message = use_state(String::new);
    let busy = use_state(|| false);

    if session.is_some() {
        return html!(<Redirect<Route> to={Route::Dashboard} />);
    }

    let onsubmit = {
        let its_ref = its_ref.clone();
        let password_ref = password_ref.clone();
        let message = message.clone();
        let busy = busy.clone();

        Callback::from(move |ev: SubmitEvent| {
            ev.prevent_default();
            let (Some(its_input), Some(pw_input)) =
                (its_ref.cast::<HtmlInputElement>(), password_ref.cast::<HtmlInputElement>())
            else {
                return;
            };
            let Some(its_id) = ItsId::parse(&its_input.value()) else {
                message.set("ITS ID must be 8 digits".into());
                return;
            };
            let password = pw_input.value();

            busy.set(true);
            let message = message.clone();
            let busy = busy.clone();
            let session = session.clone();
            let navigator = navigator.clone();
            spawn_local(async move {
                let backend = HttpBackend::new(&crate::config::load(), None);
                match backend.login(&its_id, &password).await {
                    Ok(grant) => {
                        sign_in(&session, grant);
                        if let Some(nav) = navigator {
                            nav.push(&Route::Dashboard);
                        }
                    }
                    Err(err) => {
                        log::warn!("login failed for {its_id}: {err}");
                        message.set(err.user_message());
                    }
                }
                busy.set(false);
            });
        })
    };

    html! {
        <div class="login-container">
            <h2>{"Burhani Guards"}</h2>
            <form {onsubmit}>
                <input ref={its_ref} type="text" inputmode="numeric" maxlength="8" placeholder="ITS ID" />
                <input ref={password_ref} type="password" placeholder="Password" />
                <button type="submit" disabled={*busy}>{ if *busy { "Signing in…" } else { "Sign in" } }</button>
            </form>
            if !message.is_empty() {
                <p class="text-danger">{ &*message }</p>
            }
        </div>
    }
}
