use log::warn;
use serde::{Deserialize, Serialize};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::config::{HOME_PATH, LOGIN_PATH};
use crate::session::{use_session, Session};
use crate::Route;

/* ---------------- métadonnées de route ---------------- */

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub admin_only: bool,
}

pub fn route_meta(route: &Route) -> RouteMeta {
    RouteMeta {
        admin_only: matches!(route, Route::DaftarPetugas),
    }
}

/* ---------------- cible de retour après login ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl LoginQuery {
    pub fn to(path: &str) -> Self {
        Self {
            redirect: Some(path.to_string()),
        }
    }

    /// Where to go once logged in. Only site-relative paths are honoured.
    pub fn target(&self) -> String {
        match self.redirect.as_deref() {
            Some(path) if is_internal_path(path) => path.to_string(),
            _ => HOME_PATH.to_string(),
        }
    }
}

fn is_internal_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && path != LOGIN_PATH
        && !path.starts_with(&format!("{LOGIN_PATH}?"))
}

/* ---------------- décision ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Stored token not checked yet.
    Pending,
    RedirectToLogin { redirect: String },
    RoleDenied,
    Allow,
}

impl GuardDecision {
    /// Query attached to `/login` when the decision is a login redirect.
    pub fn login_query(&self) -> Option<LoginQuery> {
        match self {
            GuardDecision::RedirectToLogin { redirect } => Some(LoginQuery::to(redirect)),
            _ => None,
        }
    }
}

pub fn decide(session: &Session, path: &str, meta: RouteMeta) -> GuardDecision {
    if !session.is_initialized {
        GuardDecision::Pending
    } else if !session.is_authenticated {
        GuardDecision::RedirectToLogin {
            redirect: path.to_string(),
        }
    } else if meta.admin_only && !session.is_admin() {
        GuardDecision::RoleDenied
    } else {
        GuardDecision::Allow
    }
}

/* ---------------- composant ---------------- */

#[derive(Properties, PartialEq)]
pub struct GuardProps {
    pub route: Route,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(Guard)]
pub fn guard(props: &GuardProps) -> Html {
    let session = use_session();
    let navigator = use_navigator();
    let path = use_location()
        .map(|l| l.path().to_string())
        .unwrap_or_else(|| props.route.to_path());

    let decision = decide(&session, &path, route_meta(&props.route));

    use_effect_with(decision.clone(), move |decision| {
        if let Some(navigator) = navigator {
            if let Some(query) = decision.login_query() {
                if let Err(e) = navigator.replace_with_query(&Route::Login, &query) {
                    warn!("redirect to login failed: {e:?}");
                }
            } else if *decision == GuardDecision::RoleDenied {
                warn!("admin-only route refused");
                navigator.replace(&Route::Home);
            }
        }
        || ()
    });

    match decision {
        GuardDecision::Allow => html! { for props.children.iter() },
        GuardDecision::Pending => html!(<div class="loading-screen"><p>{"Memuat…"}</p></div>),
        GuardDecision::RedirectToLogin { .. } | GuardDecision::RoleDenied => Html::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn session(initialized: bool, authenticated: bool, admin: bool) -> Session {
        Session {
            is_initialized: initialized,
            is_authenticated: authenticated,
            user: authenticated.then(|| User {
                is_admin: admin,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn pending_until_initialized_whatever_the_auth_flag() {
        for authenticated in [false, true] {
            let d = decide(&session(false, authenticated, true), "/dashboards/pasar", RouteMeta::default());
            assert_eq!(d, GuardDecision::Pending);
            assert_eq!(d.login_query(), None);
        }
    }

    #[test]
    fn unauthenticated_goes_to_login_with_encoded_return_path() {
        let d = decide(&session(true, false, false), "/dashboards/pasar", route_meta(&Route::Pasar));
        let query = d.login_query().unwrap();
        assert_eq!(
            serde_urlencoded::to_string(&query).unwrap(),
            "redirect=%2Fdashboards%2Fpasar"
        );
        assert_eq!(Route::Login.to_path(), "/login");
    }

    #[test]
    fn non_admin_is_sent_home_from_officer_list() {
        let d = decide(
            &session(true, true, false),
            "/dashboards/daftar-petugas",
            route_meta(&Route::DaftarPetugas),
        );
        assert_eq!(d, GuardDecision::RoleDenied);
        assert_eq!(d.login_query(), None);
    }

    #[test]
    fn admin_and_regular_routes_are_allowed() {
        let admin = session(true, true, true);
        assert_eq!(
            decide(&admin, "/dashboards/daftar-petugas", route_meta(&Route::DaftarPetugas)),
            GuardDecision::Allow
        );
        let officer = session(true, true, false);
        assert_eq!(
            decide(&officer, "/dashboards/inputharga", route_meta(&Route::InputHarga)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn only_the_officer_list_is_admin_only() {
        assert!(route_meta(&Route::DaftarPetugas).admin_only);
        for route in [Route::Home, Route::Pasar, Route::BahanPokok, Route::InputHarga] {
            assert!(!route_meta(&route).admin_only);
        }
    }

    #[test]
    fn redirect_targets_must_stay_on_site() {
        assert_eq!(LoginQuery::to("/dashboards/pasar").target(), "/dashboards/pasar");
        assert_eq!(LoginQuery::to("https://evil.example").target(), HOME_PATH);
        assert_eq!(LoginQuery::to("//evil.example").target(), HOME_PATH);
        assert_eq!(LoginQuery::to("/login").target(), HOME_PATH);
        assert_eq!(LoginQuery::default().target(), HOME_PATH);
    }

    #[test]
    fn login_query_round_trips_through_the_url() {
        let d = decide(&session(true, false, false), "/dashboards/bahanpokok", RouteMeta::default());
        let encoded = serde_urlencoded::to_string(d.login_query().unwrap()).unwrap();
        let parsed: LoginQuery = serde_urlencoded::from_str(&encoded).unwrap();
        assert_eq!(parsed.redirect.as_deref(), Some("/dashboards/bahanpokok"));
    }
}
