use yew::prelude::*;
use yew_router::prelude::*;

mod api;
mod auth;
mod config;
mod dashboard;
mod events;
mod format;
mod guard;
mod jwt;
mod layout;
mod logout;
mod models;
mod pages;
mod pagination;
mod session;
mod storage;
mod validation;
mod widgets;

use api::ApiClient;
use guard::Guard;
use session::SessionProvider;

/* -------------------- routing -------------------- */

#[derive(Routable, Clone, Debug, PartialEq)]
pub enum Route {
    #[at("/")]
    Root,
    #[at("/login")]
    Login,
    #[at("/dashboards")]
    Dashboards,
    #[at("/dashboards/home")]
    Home,
    #[at("/dashboards/pasar")]
    Pasar,
    #[at("/dashboards/bahanpokok")]
    BahanPokok,
    #[at("/dashboards/inputharga")]
    InputHarga,
    #[at("/dashboards/daftar-petugas")]
    DaftarPetugas,
    #[not_found]
    #[at("/404")]
    NotFound,
}

fn protected(route: Route, page: Html) -> Html {
    html! {
        <Guard {route}>
            <layout::MainLayout>{ page }</layout::MainLayout>
        </Guard>
    }
}

fn switch(route: Route) -> Html {
    match route {
        Route::Root | Route::Dashboards => html!(<Redirect<Route> to={Route::Home} />),
        Route::Login => html!(<auth::LoginForm />),
        Route::Home => protected(route, html!(<pages::home::Home />)),
        Route::Pasar => protected(route, html!(<pages::pasar::PasarPage />)),
        Route::BahanPokok => protected(route, html!(<pages::bahan_pokok::BahanPokokPage />)),
        Route::InputHarga => protected(route, html!(<pages::harga_bapok::InputHargaPage />)),
        Route::DaftarPetugas => protected(route, html!(<pages::petugas::DaftarPetugasPage />)),
        Route::NotFound => html!(<h1>{"404 – Halaman tidak ditemukan"}</h1>),
    }
}

/* -------------------- entry point ---------------- */

#[function_component(App)]
fn app() -> Html {
    let client = use_state(|| ApiClient::new(config::API_BASE));

    html! {
        <ContextProvider<ApiClient> context={(*client).clone()}>
            <SessionProvider>
                <BrowserRouter>
                    <Switch<Route> render={switch} />
                </BrowserRouter>
            </SessionProvider>
        </ContextProvider<ApiClient>>
    }
}

fn main() {
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));
    yew::Renderer::<App>::new().render();
}
