use std::ops::Deref;
use std::rc::Rc;

use log::{error, info, warn};
use serde_json::Value;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{use_api, ApiError, AuthBackend};
use crate::config::LOGIN_PATH;
use crate::jwt;
use crate::models::{LoginBody, User};
use crate::storage::{Credentials, KeyValueStore};

/* ---------------- structure session ---------------- */

/// In-memory session. Only the token outlives a page load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub is_initialized: bool,
    pub is_loading: bool,
    pub user: Option<User>,
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    Initialize { user: Option<User> },
    LoginRequest,
    LoginSuccess { user: User },
    LoginError { message: String },
    Logout,
}

impl Session {
    pub fn apply(&self, action: SessionAction) -> Self {
        match action {
            SessionAction::Initialize { user } => Self {
                is_authenticated: user.is_some(),
                is_initialized: true,
                user,
                ..self.clone()
            },
            SessionAction::LoginRequest => Self {
                is_loading: true,
                ..self.clone()
            },
            SessionAction::LoginSuccess { user } => Self {
                is_authenticated: true,
                is_loading: false,
                user: Some(user),
                error_message: None,
                ..self.clone()
            },
            SessionAction::LoginError { message } => Self {
                is_loading: false,
                error_message: Some(message),
                ..self.clone()
            },
            SessionAction::Logout => Self {
                is_authenticated: false,
                user: None,
                ..self.clone()
            },
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

impl Reducible for Session {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        Rc::new(self.apply(action))
    }
}

/* ---------------- décodage des réponses ---------------- */

/// Profile payloads come as `{data: {..}}`, `{user: {..}}` or a bare object.
pub fn profile_from(value: Value) -> Result<User, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ApiError::InvalidResponse("profile is not an object".into()))?;

    let inner = ["data", "user"]
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| v.is_object()))
        .unwrap_or(&value);

    if !matches!(inner, Value::Object(o) if !o.is_empty()) {
        return Err(ApiError::InvalidResponse("empty profile".into()));
    }
    Ok(serde_json::from_value(inner.clone())?)
}

/// Accepts `{access_token: string, user: object}` and nothing else.
pub fn parse_login_response(value: &Value) -> Result<(String, User), String> {
    let token = value
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());
    let user = value.get("user").filter(|u| u.is_object());

    match (token, user) {
        (Some(token), Some(user)) => serde_json::from_value::<User>(user.clone())
            .map(|user| (token.to_string(), user))
            .map_err(|e| format!("Invalid response format: {e}")),
        _ => Err("Invalid response format".into()),
    }
}

fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Email atau password salah.".into(),
        ApiError::Validation(msg) if !msg.is_empty() => msg.clone(),
        other => other.to_string(),
    }
}

/* ---------------- transitions asynchrones ---------------- */

/// Startup check of the stored token. Always resolves to `Initialize`.
pub async fn initialize<B, S>(backend: &B, credentials: &Credentials<S>, now: i64) -> SessionAction
where
    B: AuthBackend + ?Sized,
    S: KeyValueStore,
{
    let Some(token) = credentials
        .read()
        .filter(|t| jwt::is_valid_at(Some(t.as_str()), now))
    else {
        credentials.clear();
        return SessionAction::Initialize { user: None };
    };

    credentials.save(&token);
    match backend.current_user().await.and_then(profile_from) {
        Ok(mut user) => {
            if user.role.is_none() {
                user.role = credentials.read_role();
            }
            credentials.save_role(&user.role_key());
            info!("session restored for {}", user.email);
            SessionAction::Initialize { user: Some(user) }
        }
        Err(e) => {
            warn!("profile fetch failed, dropping stored credentials: {e}");
            credentials.clear();
            SessionAction::Initialize { user: None }
        }
    }
}

/// Posts credentials. Resolves to `LoginSuccess` or `LoginError`, never panics.
pub async fn login<B, S>(backend: &B, credentials: &Credentials<S>, body: &LoginBody) -> SessionAction
where
    B: AuthBackend + ?Sized,
    S: KeyValueStore,
{
    let response = match backend.login(body).await {
        Ok(response) => response,
        Err(e) => {
            warn!("login failed for {}: {e}", body.email);
            return SessionAction::LoginError {
                message: login_error_message(&e),
            };
        }
    };

    match parse_login_response(&response) {
        Ok((token, user)) => {
            credentials.save(&token);
            credentials.save_role(&user.role_key());
            info!("logged in as {}", user.email);
            SessionAction::LoginSuccess { user }
        }
        Err(message) => {
            error!("login response rejected: {message}");
            SessionAction::LoginError { message }
        }
    }
}

pub fn logout<S: KeyValueStore>(credentials: &Credentials<S>) -> SessionAction {
    credentials.clear();
    SessionAction::Logout
}

/* ---------------- contexte partagé ---------------- */

/// What every view sees: the session plus its two actions.
#[derive(Clone, PartialEq)]
pub struct SessionContext {
    state: UseReducerHandle<Session>,
    pub login: Callback<LoginBody>,
    pub logout: Callback<()>,
}

impl Deref for SessionContext {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.state
    }
}

#[hook]
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionProvider manquant")
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    #[prop_or_default]
    pub children: Children,
}

fn reload_shell() {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.location().set_href(LOGIN_PATH) {
        error!("reload after logout failed: {e:?}");
    }
}

#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let client = use_api();
    let state = use_reducer(Session::default);

    {
        let dispatcher = state.dispatcher();
        let client = client.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let credentials = Credentials::browser(client.clone());
                let action = initialize(&client, &credentials, jwt::now_secs()).await;
                dispatcher.dispatch(action);
            });
            || ()
        });
    }

    let on_login = {
        let dispatcher = state.dispatcher();
        let client = client.clone();
        Callback::from(move |body: LoginBody| {
            dispatcher.dispatch(SessionAction::LoginRequest);
            let dispatcher = dispatcher.clone();
            let client = client.clone();
            spawn_local(async move {
                let credentials = Credentials::browser(client.clone());
                dispatcher.dispatch(login(&client, &credentials, &body).await);
            });
        })
    };

    let on_logout = {
        let dispatcher = state.dispatcher();
        let client = client.clone();
        Callback::from(move |_: ()| {
            let credentials = Credentials::browser(client.clone());
            let token = credentials.read();
            dispatcher.dispatch(logout(&credentials));

            let client = client.clone();
            spawn_local(async move {
                if let Some(token) = token {
                    if let Err(e) = client.revoke(&token).await {
                        warn!("server-side logout failed: {e}");
                    }
                }
                reload_shell();
            });
        })
    };

    let context = SessionContext {
        state,
        login: on_login,
        logout: on_logout,
    };

    html! {
        <ContextProvider<SessionContext> {context}>
            { for props.children.iter() }
        </ContextProvider<SessionContext>>
    }
}
