use yew::prelude::*;

use crate::session::use_session;

#[function_component(Logout)]
pub fn logout() -> Html {
    let session = use_session();

    // revocation, storage purge and return to /login happen in the provider
    let onclick = Callback::from(move |_: MouseEvent| session.logout.emit(()));

    html! { <button class="logout-btn" {onclick}>{ "Logout" }</button> }
}
