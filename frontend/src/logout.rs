use yew::prelude::*;
use yew_router::prelude::*;

use crate::session::{sign_out, use_session};
use crate::Route;

#[function_component(Logout)]
pub fn logout() -> Html {
    let session = use_session();
    let navigator = use_navigator();

    let onclick = Callback::from(move |_: MouseEvent| {
        sign_out(&session);
        if let Some(nav) = &navigator {
            nav.replace(&Route::Login);
        }
    });

    html! { <button class="btn btn-outline-light btn-sm" {onclick}>{ "Logout" }</button> }
}
