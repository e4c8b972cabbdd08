//! Remote settings document

use serde_json::{Map, Value};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};

use crate::config::parse_object;
use crate::error::SnowError;

/// GETs `url` and parses the body as a flat settings object.
/// Non-2xx responses and non-object bodies are errors.
pub async fn fetch_settings(window: &Window, url: &str) -> Result<Map<String, Value>, SnowError> {
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| SnowError::from_js(SnowError::Fetch, &e))?
        .dyn_into()
        .map_err(|e| SnowError::from_js(SnowError::Fetch, &e))?;

    check_status(response.status())?;

    let body = response
        .text()
        .map_err(|e| SnowError::from_js(SnowError::Fetch, &e))?;
    let text = JsFuture::from(body)
        .await
        .map_err(|e| SnowError::from_js(SnowError::Fetch, &e))?
        .as_string();

    settings_from_body(text.as_deref())
}

pub fn check_status(status: u16) -> Result<(), SnowError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(SnowError::Status(status))
    }
}

/// `None` when the body did not resolve to a string.
pub fn settings_from_body(body: Option<&str>) -> Result<Map<String, Value>, SnowError> {
    let text = body.ok_or_else(|| SnowError::Parse("response body is not text".into()))?;
    parse_object(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_2xx_passes() {
        assert_eq!(check_status(200), Ok(()));
        assert_eq!(check_status(204), Ok(()));
        assert_eq!(check_status(302), Err(SnowError::Status(302)));
        assert_eq!(check_status(404), Err(SnowError::Status(404)));
        assert_eq!(check_status(503), Err(SnowError::Status(503)));
    }

    #[test]
    fn flat_object_body_parses() {
        let map = settings_from_body(Some(r#"{"enabled": false, "speed": 1200}"#)).unwrap();
        assert_eq!(map.get("enabled"), Some(&Value::Bool(false)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn html_error_page_is_a_parse_error() {
        let err = settings_from_body(Some("<html><body>Moved</body></html>")).unwrap_err();
        assert!(matches!(err, SnowError::Parse(_)));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert_eq!(settings_from_body(Some("42")), Err(SnowError::NotAnObject));
        assert_eq!(settings_from_body(Some("\"on\"")), Err(SnowError::NotAnObject));
    }

    #[test]
    fn missing_text_is_a_parse_error() {
        assert_eq!(
            settings_from_body(None),
            Err(SnowError::Parse("response body is not text".into()))
        );
    }
}
