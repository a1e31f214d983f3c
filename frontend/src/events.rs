//! "Data updated" broadcast between the CRUD views and the home dashboard.

use gloo::events::EventListener;
use gloo::utils::document;
use log::warn;
use web_sys::CustomEvent;
use yew::prelude::*;

pub const DATA_UPDATED: &str = "dashboardDataUpdated";

/// Tells every subscriber that backend data changed.
pub fn notify_data_updated() {
    match CustomEvent::new(DATA_UPDATED) {
        Ok(event) => {
            if let Err(e) = document().dispatch_event(&event) {
                warn!("dispatching {DATA_UPDATED} failed: {e:?}");
            }
        }
        Err(e) => warn!("cannot build {DATA_UPDATED} event: {e:?}"),
    }
}

/// Runs `on_update` on every notification while the component is mounted.
#[hook]
pub fn use_data_updates(on_update: Callback<()>) {
    use_effect_with((), move |_| {
        let listener = EventListener::new(&document(), DATA_UPDATED, move |_| on_update.emit(()));
        move || drop(listener)
    });
}
