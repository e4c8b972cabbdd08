//! Browser stage: overlay `div`, `span` flakes, `setTimeout` timers

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::{Date, Math};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, Window};

use crate::config::SnowSettings;
use crate::console;
use crate::constants::{BLUR_FILTER, OVERLAY_CLASS};
use crate::controller::Controller;
use crate::error::SnowError;
use crate::flake::{Flake, FlakeId, Viewport};
use crate::stage::{Stage, Timer};

pub type SharedController = Rc<RefCell<Controller<DomStage>>>;

pub struct DomStage {
    window: Window,
    document: Document,
    overlay: Option<HtmlElement>,
    flakes: HashMap<FlakeId, HtmlElement>,
    owner: Weak<RefCell<Controller<DomStage>>>,
}

fn dom_err(value: JsValue) -> SnowError {
    SnowError::from_js(SnowError::Dom, &value)
}

fn styled(document: &Document, tag: &str, props: &[(&str, &str)]) -> Result<HtmlElement, SnowError> {
    let element: HtmlElement = document
        .create_element(tag)
        .map_err(dom_err)?
        .dyn_into()
        .map_err(|_| SnowError::Dom(format!("<{tag}> is not an HTML element")))?;

    let style = element.style();
    for (name, value) in props {
        style.set_property(name, value).map_err(dom_err)?;
    }
    Ok(element)
}

impl DomStage {
    pub fn new(window: Window, document: Document, owner: Weak<RefCell<Controller<DomStage>>>) -> Self {
        Self {
            window,
            document,
            overlay: None,
            flakes: HashMap::new(),
            owner,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Stage for DomStage {
    fn now(&self) -> f64 {
        Date::now()
    }

    fn viewport(&self) -> Viewport {
        let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport {
            width: read(self.window.inner_width()),
            height: read(self.window.inner_height()),
        }
    }

    fn random(&mut self) -> f64 {
        Math::random()
    }

    fn mount_overlay(&mut self, settings: &SnowSettings) -> Result<(), SnowError> {
        let body = self
            .document
            .body()
            .ok_or_else(|| SnowError::Dom("document has no body".into()))?;

        let z_index = settings.z_index.to_string();
        let overlay = styled(
            &self.document,
            "div",
            &[
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("right", "0"),
                ("bottom", "0"),
                ("pointer-events", "none"),
                ("overflow", settings.overflow.as_str()),
                ("z-index", z_index.as_str()),
            ],
        )?;
        overlay.set_class_name(OVERLAY_CLASS);
        body.append_child(&overlay).map_err(dom_err)?;

        self.overlay = Some(overlay);
        Ok(())
    }

    fn unmount_overlay(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            overlay.remove();
        }
        self.flakes.clear();
    }

    fn add_flake(&mut self, flake: &Flake, settings: &SnowSettings) -> Result<(), SnowError> {
        let overlay = self
            .overlay
            .as_ref()
            .ok_or_else(|| SnowError::Dom("overlay is not mounted".into()))?;

        let top = format!("{}px", -flake.font_size);
        let left = format!("{}px", flake.start_x);
        let font_size = format!("{}px", flake.font_size);
        let opacity = flake.start_opacity.to_string();
        let transition = flake.transition();

        let mut props = vec![
            ("position", "absolute"),
            ("top", top.as_str()),
            ("left", left.as_str()),
            ("color", settings.color.as_str()),
            ("font-size", font_size.as_str()),
            ("opacity", opacity.as_str()),
            ("transition", transition.as_str()),
        ];
        if settings.blur {
            props.push(("filter", BLUR_FILTER));
        }

        let node = styled(&self.document, "span", &props)?;
        node.set_text_content(Some(&settings.character));
        overlay.append_child(&node).map_err(dom_err)?;

        // Styles set in the same frame as insertion would skip the transition.
        let falling = node.clone();
        let transform = flake.end_transform();
        let end_opacity = flake.end_opacity.to_string();
        let launch = Closure::once_into_js(move || {
            let style = falling.style();
            let _ = style.set_property("transform", &transform);
            let _ = style.set_property("opacity", &end_opacity);
        });
        if let Err(err) = self.window.request_animation_frame(launch.unchecked_ref()) {
            node.remove();
            return Err(dom_err(err));
        }

        self.flakes.insert(flake.id, node);
        Ok(())
    }

    fn remove_flake(&mut self, id: FlakeId) {
        if let Some(node) = self.flakes.remove(&id) {
            node.remove();
        }
    }

    fn schedule(&mut self, delay_ms: u32, timer: Timer) -> Result<(), SnowError> {
        let owner = self.owner.clone();
        let callback = Closure::once_into_js(move || {
            let Some(controller) = owner.upgrade() else {
                return;
            };
            let result = controller.borrow_mut().fire(timer);
            if let Err(err) = result {
                console::warn(&err.to_string());
            }
        });

        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
            .map_err(dom_err)?;
        Ok(())
    }
}
