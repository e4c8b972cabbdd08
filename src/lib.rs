//! Snow Effect - falling snowflake overlay in WASM

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod config;
pub mod console;
pub mod constants;
pub mod controller;
pub mod dom;
pub mod effect;
pub mod emitter;
pub mod error;
pub mod fetch;
pub mod flake;
pub mod stage;

pub use config::{MergeReport, Rejection, SettingsIssue, SnowSettings};
pub use constants::*;
pub use controller::{Controller, Reconciliation, Refresh};
pub use effect::SnowEffect;
pub use emitter::{Emitter, EmitterState, Fired};
pub use error::SnowError;
pub use flake::{Flake, FlakeId, Viewport};
pub use stage::{Stage, Timer};

#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    console::log("WASM loaded");
}

/// Creates an effect and boots it once the DOM is ready: one `init`, then a
/// visibility-gated refresh every `POLL_INTERVAL_MS` when `config_url` is set.
#[wasm_bindgen]
pub fn mount(config_url: Option<String>) -> Result<SnowEffect, JsValue> {
    let effect = SnowEffect::new(JsValue::UNDEFINED)?;
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("Failed to get document")?;

    if still_loading(&document.ready_state()) {
        let deferred = effect.clone();
        let on_ready = Closure::once_into_js(move || {
            if let Err(err) = deferred.boot(config_url) {
                console::warn(&format!("Boot failed: {err:?}"));
            }
        });
        document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
    } else {
        effect.boot(config_url)?;
    }

    Ok(effect)
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

/// `document.readyState` before `DOMContentLoaded` has fired.
fn still_loading(ready_state: &str) -> bool {
    ready_state == "loading"
}
