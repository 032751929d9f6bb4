use yew::prelude::*;
use yew_router::prelude::*;

use console_core::access::modules;

use crate::logout::Logout;
use crate::session::use_session;
use crate::Route;

pub(crate) const NAV: &[(&str, &str, Route)] = &[
    (modules::MIQAAT, "Miqaats", Route::Miqaats),
    (modules::TEAM, "Teams", Route::Teams),
    (modules::VENUE, "Venues", Route::Venues),
    (modules::LOCATION, "Locations", Route::Locations),
    (modules::ROLE, "Roles", Route::Roles),
    (modules::MEMBER, "Members", Route::Members),
    (modules::JAMAAT, "Jamaats", Route::Jamaats),
    (modules::DUTY, "Duties", Route::Duties),
    (modules::INCHARGE, "Incharges", Route::Incharges),
    (modules::REPORTS, "Reports", Route::Reports),
];

#[derive(Properties, PartialEq)]
pub struct MainLayoutProps {
    #[prop_or_default]
    pub children: Children,
}

#[function_component(MainLayout)]
pub fn main_layout(props: &MainLayoutProps) -> Html {
    let session = use_session();
    let Some(s) = &*session else {
        return html!(<Redirect<Route> to={Route::Login} />);
    };

    let links = NAV
        .iter()
        .filter(|(module, _, _)| s.permission(module).has_access)
        .map(|(_, label, route)| {
            html! {
                <li class="nav-item"><Link<Route> to={route.clone()}>{ *label }</Link<Route>></li>
            }
        })
        .collect::<Html>();

    html! {
        <>
            <header class="header">
                <div class="header-title">{"Burhani Guards"}</div>
                <div class="header-user">{ s.full_name() }</div>
                <div class="header-logout"><Logout /></div>
            </header>

            <nav class="nav">
                <ul class="nav-list">
                    <li class="nav-item"><Link<Route> to={Route::Dashboard}>{"Dashboard"}</Link<Route>></li>
                    { links }
                </ul>
            </nav>

            <main class="main-content">
                { for props.children.iter() }
            </main>
        </>
    }
}
