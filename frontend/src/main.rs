use yew::prelude::*;
use yew_router::prelude::*;

use console_core::access::modules;

mod api;
mod auth;
mod components;
mod config;
mod guard;
mod layout;
mod logout;
mod pages;
mod session;

use console_core::model::{Jamaat, Location, Member, Role, Team, Venue};

use crate::guard::Guard;
use crate::layout::MainLayout;
use crate::pages::masters::{MasterPage, MiqaatsPage};

/* -------------------- routing -------------------- */

#[derive(Routable, Clone, PartialEq)]
pub enum Route {
    #[at("/")]
    Login,
    #[at("/dashboard")]
    Dashboard,
    #[at("/miqaats")]
    Miqaats,
    #[at("/teams")]
    Teams,
    #[at("/venues")]
    Venues,
    #[at("/locations")]
    Locations,
    #[at("/roles")]
    Roles,
    #[at("/members")]
    Members,
    #[at("/jamaats")]
    Jamaats,
    #[at("/duties")]
    Duties,
    #[at("/incharges")]
    Incharges,
    #[at("/reports")]
    Reports,
    #[not_found]
    #[at("/404")]
    NotFound,
}

fn guarded(module: Option<&'static str>, page: Html) -> Html {
    html! {
        <Guard {module}>
            <MainLayout>{ page }</MainLayout>
        </Guard>
    }
}

fn switch(route: Route) -> Html {
    match route {
        Route::Login => html!(<auth::LoginForm />),
        Route::Dashboard => guarded(None, html!(<pages::dashboard::Dashboard />)),
        Route::Miqaats => guarded(Some(modules::MIQAAT), html!(<MiqaatsPage />)),
        Route::Teams => guarded(Some(modules::TEAM), html!(<MasterPage<Team> />)),
        Route::Venues => guarded(Some(modules::VENUE), html!(<MasterPage<Venue> />)),
        Route::Locations => guarded(Some(modules::LOCATION), html!(<MasterPage<Location> />)),
        Route::Roles => guarded(Some(modules::ROLE), html!(<MasterPage<Role> />)),
        Route::Members => guarded(Some(modules::MEMBER), html!(<MasterPage<Member> />)),
        Route::Jamaats => guarded(Some(modules::JAMAAT), html!(<MasterPage<Jamaat> />)),
        Route::Duties => guarded(Some(modules::DUTY), html!(<pages::duties::Duties />)),
        Route::Incharges => guarded(Some(modules::INCHARGE), html!(<pages::incharges::Incharges />)),
        Route::Reports => guarded(Some(modules::REPORTS), html!(<pages::reports::Reports />)),
        Route::NotFound => html!(<h1>{"404 – Not Found"}</h1>),
    }
}

/* -------------------- entry point ---------------- */

#[function_component(App)]
fn app() -> Html {
    html! {
        <BrowserRouter>
            <session::SessionProvider>
                <Switch<Route> render={switch} />
            </session::SessionProvider>
        </BrowserRouter>
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    console_error_panic_hook::set_once();
    log::info!("console starting, api base {}", config::load().api_base);
    yew::Renderer::<App>::new().render();
}
