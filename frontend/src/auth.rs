use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::guard::LoginQuery;
use crate::models::LoginBody;
use crate::session::use_session;
use crate::validation::{validate_login, LoginErrors};
use crate::Route;

/* -------------------------------------------------------------------------- */
/*                               composant login                               */
/* -------------------------------------------------------------------------- */

#[function_component(LoginForm)]
pub fn login_form() -> Html {
    let session = use_session();
    let navigator = use_navigator();
    let query = use_location()
        .and_then(|l| l.query::<LoginQuery>().ok())
        .unwrap_or_default();

    let email_ref = use_node_ref();
    let password_ref = use_node_ref();
    let field_errors = use_state(LoginErrors::default);

    /* ------------- déjà connecté : on repart vers la cible ------------- */
    {
        let target = query.target();
        use_effect_with(session.is_authenticated, move |authenticated| {
            if *authenticated {
                if let Some(navigator) = navigator {
                    navigator.push(&Route::recognize(&target).unwrap_or(Route::Home));
                }
            }
            || ()
        });
    }

    /* ------------------ callback du <form onsubmit=…> --------------------- */
    let onsubmit = {
        let email_ref = email_ref.clone();
        let password_ref = password_ref.clone();
        let field_errors = field_errors.clone();
        let login = session.login.clone();

        Callback::from(move |ev: SubmitEvent| {
            ev.prevent_default();

            let read = |node: &NodeRef| {
                node.cast::<HtmlInputElement>()
                    .map(|input| input.value())
                    .unwrap_or_default()
            };
            let email = read(&email_ref);
            let password = read(&password_ref);

            let errors = validate_login(&email, &password);
            let valid = errors.is_empty();
            field_errors.set(errors);
            if valid {
                login.emit(LoginBody {
                    email: email.trim().to_string(),
                    password,
                });
            }
        })
    };

    let field_error = |message: Option<&'static str>| match message {
        Some(message) => html!(<small class="field-error">{ message }</small>),
        None => Html::default(),
    };

    /* ---------------------------- rendu ---------------------------------- */
    html! {
        <div class="login-container">
            <img src="/logo-bantul.png" alt="Logo Kabupaten Bantul" class="login-logo" />
            <h2>{"Dashboard Harga Bahan Pokok"}</h2>

            <form {onsubmit} novalidate=true>
                <input ref={email_ref} type="email" placeholder="Email" disabled={session.is_loading} />
                { field_error(field_errors.email) }
                <input ref={password_ref} type="password" placeholder="Password" disabled={session.is_loading} />
                { field_error(field_errors.password) }
                <button type="submit" disabled={session.is_loading}>
                    { if session.is_loading { "Memproses…" } else { "Masuk" } }
                </button>
            </form>

            {
                match &session.error_message {
                    Some(message) => html!(<p class="login-error">{ message }</p>),
                    None => Html::default(),
                }
            }
        </div>
    }
}
