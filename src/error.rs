//! Error types

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error, PartialEq)]
pub enum SnowError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Settings request returned HTTP {0}")]
    Status(u16),

    #[error("Settings body is not valid JSON: {0}")]
    Parse(String),

    #[error("Settings document is not a flat object")]
    NotAnObject,

    #[error("DOM error: {0}")]
    Dom(String),
}

impl SnowError {
    /// Wraps a rejected JS value, keeping its message when it has one.
    pub fn from_js(kind: fn(String) -> Self, value: &JsValue) -> Self {
        let text = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(value, &"message".into())
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        kind(text)
    }
}

impl From<serde_json::Error> for SnowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<SnowError> for JsValue {
    fn from(err: SnowError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
