use yew::prelude::*;
use yew_router::prelude::*;

use console_core::access::Action;
use console_core::error::ConsoleError;

use crate::session::{now_ms, sign_out, use_session};
use crate::Route;

#[derive(Properties, PartialEq)]
pub struct GuardProps {
    /// Module id the screen belongs to; `None` only needs a live session.
    #[prop_or_default]
    pub module: Option<&'static str>,
    #[prop_or(Action::View)]
    pub action: Action,
    #[prop_or_default]
    pub children: Children,
}

#[derive(Clone, Copy, PartialEq)]
enum Verdict {
    Allowed,
    SignedOut,
    Expired,
    Forbidden,
}

#[function_component(Guard)]
pub fn guard(props: &GuardProps) -> Html {
    let session = use_session();

    let verdict = match (&*session, props.module) {
        (None, _) => Verdict::SignedOut,
        (Some(s), _) if s.is_expired(now_ms()) => Verdict::Expired,
        (Some(_), None) => Verdict::Allowed,
        (Some(s), Some(module)) => match s.authorize(module, props.action, now_ms()) {
            Ok(()) => Verdict::Allowed,
            Err(ConsoleError::Forbidden { .. }) => Verdict::Forbidden,
            Err(_) => Verdict::Expired,
        },
    };

    {
        let session = session.clone();
        use_effect_with(verdict, move |verdict| {
            match verdict {
                Verdict::Expired => sign_out(&session),
                Verdict::Forbidden => gloo_dialogs::alert("You do not have access to this page."),
                _ => {}
            }
            || ()
        });
    }

    match verdict {
        Verdict::Allowed => html! { for props.children.iter() },
        Verdict::SignedOut | Verdict::Expired => html!(<Redirect<Route> to={Route::Login} />),
        Verdict::Forbidden => html!(<Redirect<Route> to={Route::Dashboard} />),
    }
}
