//! Inbound training requests.
//!
//! Callers send `csvUrl` (or `csv_url` / `csvurl`), `email` and an optional
//! `callbackUrl` (or `callback_url`). Every value is normalized by trimming
//! whitespace, stripping leading dashes and trimming again, so that values
//! pasted from shell history such as `--https://...` still work.

use crate::error::RequestError;
use serde::Serialize;
use serde_json::{Map, Value};

const CSV_URL_KEYS: [&str; 3] = ["csvUrl", "csv_url", "csvurl"];
const EMAIL_KEYS: [&str; 1] = ["email"];
const CALLBACK_URL_KEYS: [&str; 2] = ["callbackUrl", "callback_url"];

/// A validated request to train on one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRequest {
    pub csv_url: String,
    /// Identity of the requester, echoed in the result record.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

impl TrainRequest {
    /// Normalize and validate raw field values.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingField`] when the CSV URL or the email
    /// is absent or empty after normalization.
    pub fn new(
        csv_url: Option<&str>,
        email: Option<&str>,
        callback_url: Option<&str>,
    ) -> Result<Self, RequestError> {
        let csv_url = csv_url
            .map(normalize)
            .filter(|value| !value.is_empty())
            .ok_or(RequestError::MissingField("csvUrl"))?;
        let email = email
            .map(normalize)
            .filter(|value| !value.is_empty())
            .ok_or(RequestError::MissingField("email"))?;
        let callback_url = callback_url
            .map(normalize)
            .filter(|value| !value.is_empty());

        Ok(Self {
            csv_url,
            email,
            callback_url,
        })
    }

    /// Parse a JSON request body.
    ///
    /// # Example
    ///
    /// ```
    /// use automl_trainer::TrainRequest;
    ///
    /// let request = TrainRequest::from_json(
    ///     r#"{"csv_url": " --https://example.com/data.csv", "email": "a@b.c"}"#,
    /// ).unwrap();
    ///
    /// assert_eq!(request.csv_url, "https://example.com/data.csv");
    /// assert_eq!(request.callback_url, None);
    /// ```
    pub fn from_json(payload: &str) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| RequestError::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Build a request from an already parsed JSON value.
    ///
    /// For each field the first alias holding a non-empty value wins.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let object = value
            .as_object()
            .ok_or_else(|| RequestError::Malformed("expected a JSON object".to_string()))?;

        let csv_url = first_present(object, &CSV_URL_KEYS);
        let email = first_present(object, &EMAIL_KEYS);
        let callback_url = first_present(object, &CALLBACK_URL_KEYS);

        Self::new(csv_url.as_deref(), email.as_deref(), callback_url.as_deref())
    }
}

fn first_present(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}

/// Trim, strip leading dashes, trim again.
pub fn normalize(raw: &str) -> String {
    raw.trim().trim_start_matches('-').trim().to_string()
}
