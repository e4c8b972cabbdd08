//! Snow effect settings

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use wasm_bindgen::prelude::*;

use crate::constants::*;
use crate::error::SnowError;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowSettings {
    pub character: String,
    /// Fall duration of one flake, in milliseconds.
    pub speed: u32,
    /// Delay between spawn ticks, in milliseconds.
    pub frequency: u32,
    pub color: String,
    pub blur: bool,
    pub enabled: bool,
    pub small: f64,
    pub large: f64,
    pub wind: f64,
    pub wind_variance: f64,
    pub start_opacity: f64,
    pub end_opacity: f64,
    pub overflow: String,
    pub z_index: u32,
}

impl Default for SnowSettings {
    fn default() -> Self {
        Self {
            character: DEFAULT_CHARACTER.into(),
            speed: DEFAULT_SPEED_MS,
            frequency: DEFAULT_FREQUENCY_MS,
            color: DEFAULT_COLOR.into(),
            blur: DEFAULT_BLUR,
            enabled: DEFAULT_ENABLED,
            small: DEFAULT_SMALL_PX,
            large: DEFAULT_LARGE_PX,
            wind: DEFAULT_WIND,
            wind_variance: DEFAULT_WIND_VARIANCE,
            start_opacity: DEFAULT_START_OPACITY,
            end_opacity: DEFAULT_END_OPACITY,
            overflow: DEFAULT_OVERFLOW.into(),
            z_index: DEFAULT_Z_INDEX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Unknown,
    Null,
    WrongType,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeReport {
    pub applied: Vec<String>,
    pub ignored: Vec<(String, Rejection)>,
}

impl MergeReport {
    pub fn accepted_any(&self) -> bool {
        !self.applied.is_empty()
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SettingsIssue {
    #[error("small ({small}px) is larger than large ({large}px)")]
    InvertedSizeRange { small: f64, large: f64 },

    #[error("frequency is 0ms, spawn ticks will run back to back")]
    ZeroFrequency,
}

trait SettingValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl SettingValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl SettingValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl SettingValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().filter(|n| n.is_finite() && *n >= 0.0)
    }
}

impl SettingValue for u32 {
    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value)
            .filter(|n| *n <= u32::MAX as f64)
            .map(|n| n.round() as u32)
    }
}

impl SnowSettings {
    /// Overwrites every known, non-null, well-typed field present in `candidate`.
    /// Fields absent from `candidate` keep their current value.
    pub fn merge(&mut self, candidate: &Map<String, Value>) -> MergeReport {
        let mut report = MergeReport::default();

        for (key, value) in candidate {
            match self.assign(key, value) {
                Ok(()) => report.applied.push(key.clone()),
                Err(reason) => report.ignored.push((key.clone(), reason)),
            }
        }
        report
    }

    /// Unknown keys fall through to `Rejection::Unknown`, whatever their value.
    fn assign(&mut self, key: &str, value: &Value) -> Result<(), Rejection> {
        macro_rules! set {
            ($field:ident) => {{
                if value.is_null() {
                    return Err(Rejection::Null);
                }
                self.$field = SettingValue::from_value(value).ok_or(Rejection::WrongType)?;
                Ok(())
            }};
        }

        match key {
            "character" => set!(character),
            "speed" => set!(speed),
            "frequency" => set!(frequency),
            "color" => set!(color),
            "blur" => set!(blur),
            "enabled" => set!(enabled),
            "small" => set!(small),
            "large" => set!(large),
            "wind" => set!(wind),
            "windVariance" => set!(wind_variance),
            "startOpacity" => set!(start_opacity),
            "endOpacity" => set!(end_opacity),
            "overflow" => set!(overflow),
            "zIndex" => set!(z_index),
            _ => Err(Rejection::Unknown),
        }
    }

    /// Relationships the merge does not enforce. Reported, never rejected.
    pub fn validate(&self) -> Vec<SettingsIssue> {
        let mut issues = Vec::new();
        if self.small > self.large {
            issues.push(SettingsIssue::InvertedSizeRange {
                small: self.small,
                large: self.large,
            });
        }
        if self.frequency == 0 {
            issues.push(SettingsIssue::ZeroFrequency);
        }
        issues
    }

    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        let text = serde_json::to_string(self).map_err(SnowError::from)?;
        js_sys::JSON::parse(&text)
    }
}

/// Parses a settings document. Only a top-level JSON object is accepted.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, SnowError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(SnowError::NotAnObject),
    }
}

/// Reads a plain JS object into a settings candidate.
pub fn object_from_js(value: &JsValue) -> Result<Map<String, Value>, SnowError> {
    if value.is_undefined() || value.is_null() {
        return Ok(Map::new());
    }
    if !value.is_object() {
        return Err(SnowError::NotAnObject);
    }
    let text = js_sys::JSON::stringify(value)
        .map_err(|e| SnowError::from_js(SnowError::Parse, &e))?;
    parse_object(&String::from(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_match_reference_values() {
        let s = SnowSettings::default();
        assert_eq!(s.character, "❄");
        assert_eq!(s.speed, 40_000);
        assert_eq!(s.frequency, 500);
        assert!(s.enabled);
        assert!(!s.blur);
        assert_eq!((s.small, s.large), (16.0, 32.0));
        assert_eq!(s.z_index, 9999);
        assert!(s.validate().is_empty());
    }

    #[test]
    fn merge_overwrites_present_fields_only() {
        let mut s = SnowSettings::default();
        let report = s.merge(&object(json!({ "speed": 1000, "color": "#fff" })));

        assert_eq!(s.speed, 1000);
        assert_eq!(s.color, "#fff");
        assert_eq!(s.frequency, DEFAULT_FREQUENCY_MS);
        assert_eq!(s.character, DEFAULT_CHARACTER);
        assert_eq!(report.applied.len(), 2);
        assert!(report.ignored.is_empty());
    }

    #[test]
    fn merge_drops_unknown_and_null_keys() {
        let mut s = SnowSettings::default();
        let before = s.clone();
        let report = s.merge(&object(json!({
            "gravity": 9.8,
            "enabled": null,
            "__proto__": { "enabled": false },
        })));

        assert_eq!(s, before);
        assert!(!report.accepted_any());
        assert!(report.ignored.contains(&("gravity".into(), Rejection::Unknown)));
        assert!(report.ignored.contains(&("enabled".into(), Rejection::Null)));

        let serialized = serde_json::to_value(&s).unwrap();
        assert!(serialized.get("gravity").is_none());
    }

    #[test]
    fn merge_rejects_mistyped_and_negative_values() {
        let mut s = SnowSettings::default();
        let report = s.merge(&object(json!({
            "enabled": "false",
            "speed": -5,
            "wind": "strong",
            "small": 8,
        })));

        assert!(s.enabled);
        assert_eq!(s.speed, DEFAULT_SPEED_MS);
        assert_eq!(s.wind, DEFAULT_WIND);
        assert_eq!(s.small, 8.0);
        assert_eq!(report.applied, vec!["small".to_string()]);
        assert_eq!(
            report
                .ignored
                .iter()
                .filter(|(_, r)| *r == Rejection::WrongType)
                .count(),
            3
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let candidate = object(json!({ "frequency": 250, "blur": true, "zIndex": 10 }));
        let mut once = SnowSettings::default();
        once.merge(&candidate);
        let mut twice = once.clone();
        twice.merge(&candidate);
        assert_eq!(once, twice);
    }

    #[test]
    fn fractional_durations_round_to_whole_ms() {
        let mut s = SnowSettings::default();
        s.merge(&object(json!({ "speed": 1500.6 })));
        assert_eq!(s.speed, 1501);
    }

    #[test]
    fn inverted_size_range_is_reported_not_rejected() {
        let mut s = SnowSettings::default();
        let report = s.merge(&object(json!({ "small": 40, "large": 10 })));
        assert!(report.ignored.is_empty());
        assert_eq!(
            s.validate(),
            vec![SettingsIssue::InvertedSizeRange {
                small: 40.0,
                large: 10.0
            }]
        );
    }

    #[test]
    fn parse_object_requires_top_level_object() {
        assert!(parse_object(r#"{"enabled": false}"#).is_ok());
        assert_eq!(parse_object("[1, 2]"), Err(SnowError::NotAnObject));
        assert!(matches!(parse_object("<html>"), Err(SnowError::Parse(_))));
    }

    #[test]
    fn serialized_keys_merge_back_cleanly() {
        let mut tuned = SnowSettings::default();
        tuned.merge(&object(json!({ "windVariance": 12, "zIndex": 5, "blur": true })));

        let serialized = object(serde_json::to_value(&tuned).unwrap());
        let mut s = SnowSettings::default();
        let report = s.merge(&serialized);

        assert!(report.ignored.is_empty(), "{:?}", report.ignored);
        assert_eq!(report.applied.len(), 14);
        assert_eq!(s, tuned);
    }

    #[test]
    fn null_for_unknown_key_is_reported_unknown() {
        let mut s = SnowSettings::default();
        let report = s.merge(&object(json!({ "sparkle": null })));
        assert_eq!(report.ignored, vec![("sparkle".to_string(), Rejection::Unknown)]);
    }
}
