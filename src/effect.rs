//! Exported snow effect handle

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Promise;
use serde_json::Map;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{VisibilityState, Window};

use crate::config::{object_from_js, SnowSettings};
use crate::console;
use crate::constants::POLL_INTERVAL_MS;
use crate::controller::{Controller, Reconciliation, Refresh};
use crate::dom::{DomStage, SharedController};
use crate::fetch::fetch_settings;

/// Repeating settings refresh. Dropping it clears the interval.
pub struct PollTask {
    window: Window,
    handle: i32,
    _tick: Closure<dyn FnMut()>,
}

impl PollTask {
    /// Ticks are skipped, not queued, while the page is hidden.
    pub fn spawn(
        window: Window,
        controller: Weak<RefCell<Controller<DomStage>>>,
        url: String,
        interval_ms: u32,
    ) -> Result<Self, JsValue> {
        let document = window.document().ok_or("Failed to get document")?;

        let tick = Closure::<dyn FnMut()>::new(move || {
            if document.visibility_state() != VisibilityState::Visible {
                return;
            }
            let Some(controller) = controller.upgrade() else {
                return;
            };
            let url = url.clone();
            spawn_local(async move {
                refresh(&controller, Some(&url)).await;
            });
        });

        let interval = i32::try_from(interval_ms).unwrap_or(i32::MAX);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            interval,
        )?;

        Ok(Self {
            window,
            handle,
            _tick: tick,
        })
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.handle);
    }
}

/// Fetches `url` when given, merges it and reconciles the run state.
/// Every failure is logged; the previous settings stay in effect.
pub async fn refresh(controller: &SharedController, url: Option<&str>) {
    let fetched = match url {
        Some(url) => {
            let window = controller.borrow().stage().window().clone();
            fetch_settings(&window, url).await
        }
        None => Ok(Map::new()),
    };

    let outcome = controller.borrow_mut().refresh(fetched);
    log_refresh(&outcome);
}

fn log_refresh(outcome: &Refresh) {
    if let Some(err) = &outcome.failure {
        console::warn(&format!("Settings not applied: {err}"));
    }
    if outcome.changed {
        if let Some(report) = &outcome.report {
            console::log(&format!("Settings updated: {}", report.applied.join(", ")));
            if !report.ignored.is_empty() {
                let keys: Vec<&str> = report.ignored.iter().map(|(k, _)| k.as_str()).collect();
                console::log(&format!("Ignored settings: {}", keys.join(", ")));
            }
        }
    }
    for issue in &outcome.issues {
        console::warn(&issue.to_string());
    }
    match &outcome.action {
        Ok(Reconciliation::Started) => console::log("Started"),
        Ok(Reconciliation::Stopped) => console::log("Stopped"),
        Ok(Reconciliation::Unchanged) => {}
        Err(err) => console::warn(&format!("Start failed: {err}")),
    }
}

#[wasm_bindgen]
#[derive(Clone)]
pub struct SnowEffect {
    controller: SharedController,
    poll: Rc<RefCell<Option<PollTask>>>,
}

#[wasm_bindgen]
impl SnowEffect {
    /// Creates a stopped effect. `initial` is an optional settings object.
    #[wasm_bindgen(constructor)]
    pub fn new(initial: JsValue) -> Result<SnowEffect, JsValue> {
        let window = web_sys::window().ok_or("Failed to get window")?;
        let document = window.document().ok_or("Failed to get document")?;

        let mut settings = SnowSettings::default();
        settings.merge(&object_from_js(&initial)?);

        let controller = Rc::new_cyclic(|owner| {
            RefCell::new(Controller::new(
                DomStage::new(window, document, owner.clone()),
                settings,
            ))
        });

        Ok(Self {
            controller,
            poll: Rc::new(RefCell::new(None)),
        })
    }

    /// Loads settings from `config_url` (if any) and reconciles. Never rejects.
    pub fn init(&self, config_url: Option<String>) -> Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            refresh(&controller, config_url.as_deref()).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Merges a local settings object and reconciles. Invalid input is logged.
    pub fn configure(&self, overrides: JsValue) {
        let outcome = self
            .controller
            .borrow_mut()
            .refresh(object_from_js(&overrides));
        log_refresh(&outcome);
    }

    /// Failures are logged, never thrown; `isRunning` stays false.
    pub fn start(&self) {
        let result = self.controller.borrow_mut().start();
        if let Err(err) = result {
            console::warn(&format!("Start failed: {err}"));
        }
    }

    pub fn restart(&self) {
        let result = self.controller.borrow_mut().restart();
        if let Err(err) = result {
            console::warn(&format!("Restart failed: {err}"));
        }
    }

    pub fn stop(&self) {
        self.controller.borrow_mut().stop();
    }

    /// Snapshot of the current settings.
    #[wasm_bindgen(getter)]
    pub fn settings(&self) -> Result<JsValue, JsValue> {
        self.controller.borrow().settings().to_js()
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.controller.borrow().emitter().is_running()
    }

    #[wasm_bindgen(getter, js_name = activeCount)]
    pub fn active_count(&self) -> u32 {
        self.controller.borrow().emitter().active_count() as u32
    }

    /// Refreshes from `config_url` every `interval_ms` (default 5s) while visible.
    /// Replaces any previous watch.
    pub fn watch(&self, config_url: String, interval_ms: Option<u32>) -> Result<(), JsValue> {
        let window = self.controller.borrow().stage().window().clone();
        let task = PollTask::spawn(
            window,
            Rc::downgrade(&self.controller),
            config_url,
            interval_ms.unwrap_or(POLL_INTERVAL_MS),
        )?;
        self.poll.replace(Some(task));
        Ok(())
    }

    pub fn unwatch(&self) {
        self.poll.replace(None);
    }
}

impl SnowEffect {
    /// Runs `init` once, then keeps refreshing from the same URL.
    pub(crate) fn boot(&self, config_url: Option<String>) -> Result<(), JsValue> {
        let _ = self.init(config_url.clone());
        if let Some(url) = config_url {
            self.watch(url, None)?;
        }
        Ok(())
    }
}
