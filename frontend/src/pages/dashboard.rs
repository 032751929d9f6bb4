use yew::prelude::*;
use yew_router::prelude::*;

use crate::layout::NAV;
use crate::session::use_session;
use crate::Route;

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let session = use_session();
    let Some(s) = &*session else {
        return Html::default();
    };

    let cards = NAV
        .iter()
        .filter_map(|(module, label, route)| {
            let p = s.permission(module);
            p.has_access.then(|| {
                let rights: Vec<&str> = [(p.can_add, "add"), (p.can_edit, "edit"), (p.can_delete, "delete")]
                    .into_iter()
                    .filter_map(|(ok, name)| ok.then_some(name))
                    .collect();
                let rights = if rights.is_empty() { "view only".to_string() } else { rights.join(" · ") };
                html! {
                    <div class="col-md-4 mb-3" key={*module}>
                        <div class="card h-100"><div class="card-body">
                            <h5 class="card-title">
                                <Link<Route> to={route.clone()}>{ *label }</Link<Route>>
                            </h5>
                            <p class="card-text text-muted small">{ rights }</p>
                        </div></div>
                    </div>
                }
            })
        })
        .collect::<Vec<_>>();

    html! {
        <div class="dashboard">
            <h2>{ format!("Welcome, {}", s.full_name()) }</h2>
            <p class="text-muted">{ format!("ITS {}", s.its_id()) }</p>
            if cards.is_empty() {
                <div class="alert alert-info">{"No modules are assigned to your account."}</div>
            } else {
                <div class="row">{ for cards }</div>
            }
        </div>
    }
}
