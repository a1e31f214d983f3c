use yew::prelude::*;
use yew_router::prelude::*;

use crate::logout;
use crate::session::use_session;
use crate::Route;

struct NavEntry {
    route: Route,
    label: &'static str,
    admin_only: bool,
}

static NAV: [NavEntry; 5] = [
    NavEntry { route: Route::Home, label: "Beranda", admin_only: false },
    NavEntry { route: Route::Pasar, label: "Pasar", admin_only: false },
    NavEntry { route: Route::DaftarPetugas, label: "Petugas", admin_only: true },
    NavEntry { route: Route::InputHarga, label: "Input Harga", admin_only: false },
    NavEntry { route: Route::BahanPokok, label: "Bahan Pokok", admin_only: false },
];

/// Sidebar entries a user with `is_admin` may see.
fn visible_entries(is_admin: bool) -> impl Iterator<Item = &'static NavEntry> {
    NAV.iter().filter(move |entry| is_admin || !entry.admin_only)
}

#[derive(Properties, PartialEq)]
pub struct MainLayoutProps {
    #[prop_or_default]
    pub children: Children,
}

#[function_component(MainLayout)]
pub fn main_layout(props: &MainLayoutProps) -> Html {
    let session = use_session();
    let current = use_route::<Route>();

    let (name, role) = session
        .user
        .as_ref()
        .map(|u| (u.name.clone(), u.role_label()))
        .unwrap_or_default();

    html! {
        <>
            <header class="header">
                <div class="header-left">
                    <img src="/logo-bantul.png" alt="Logo Kabupaten Bantul" class="header-logo" />
                </div>
                <div class="header-title">{"Harga Bahan Pokok"}</div>
                <div class="header-user">
                    <span class="header-user-name">{ name }</span>
                    <span class="header-user-role">{ role }</span>
                </div>
                <div class="header-logout">
                    <logout::Logout />
                </div>
            </header>

            <nav class="nav">
                <ul class="nav-list">
                    { for visible_entries(session.is_admin()).map(|entry| {
                        let active = current.as_ref() == Some(&entry.route);
                        html! {
                            <li class={classes!("nav-item", active.then_some("active"))}>
                                <Link<Route> to={entry.route.clone()}>{ entry.label }</Link<Route>>
                            </li>
                        }
                    }) }
                </ul>
            </nav>

            <main class="main-content">
                { for props.children.iter() }
            </main>
        </>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn officer_list_is_hidden_from_non_admins() {
        let labels: Vec<&str> = visible_entries(false).map(|e| e.label).collect();
        assert_eq!(labels, ["Beranda", "Pasar", "Input Harga", "Bahan Pokok"]);
    }

    #[test]
    fn admins_see_every_entry_in_order() {
        let labels: Vec<&str> = visible_entries(true).map(|e| e.label).collect();
        assert_eq!(labels, ["Beranda", "Pasar", "Petugas", "Input Harga", "Bahan Pokok"]);
    }
}
