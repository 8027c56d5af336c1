//! Inbound event normalization.
//!
//! # Responsibilities
//! - Deserialize the HTTP-proxy style inbound event
//! - Strip the query string and trailing slashes from the path
//! - Upper-case the method (unknown methods miss at route lookup, not here)
//! - Parse the body as JSON only when one is present
//!
//! # Design Decisions
//! - Normalization happens exactly once per invocation; the resulting
//!   `Request` is never mutated afterwards except for the auth headers the
//!   dispatcher removes before handlers can see them
//! - A body that is not valid JSON, or that is JSON but not an object, is a
//!   validation error: parameters must be named

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::dispatch::error::DispatchError;

/// Raw inbound event, as delivered by an HTTP proxy integration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    pub path: String,

    #[serde(rename = "httpMethod", default)]
    pub http_method: Option<String>,

    #[serde(rename = "queryStringParameters", default)]
    pub query_string_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

/// A normalized request, derived once from an [`ApiEvent`].
#[derive(Debug, Clone)]
pub struct Request {
    /// Path with the query string and trailing slashes removed.
    pub path: String,
    /// Upper-cased HTTP method.
    pub method: String,
    pub query_params: HashMap<String, String>,
    pub body_params: Map<String, Value>,
    /// Header names lower-cased for case-insensitive lookup.
    pub headers: HashMap<String, String>,
}

impl ApiEvent {
    /// Normalize the raw event into a [`Request`].
    pub fn normalize(self) -> Result<Request, DispatchError> {
        let path = strip_request_path(&self.path);

        let method = self
            .http_method
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GET".to_string())
            .to_uppercase();

        let query_params = self.query_string_parameters.unwrap_or_default();

        let body_params = parse_request_body(self.body.as_deref())?;

        let headers = self
            .headers
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect();

        Ok(Request {
            path,
            method,
            query_params,
            body_params,
            headers,
        })
    }
}

/// Remove the query string and any trailing slashes from the raw path.
fn strip_request_path(full_path: &str) -> String {
    let path = full_path.split('?').next().unwrap_or_default();
    path.trim_end_matches('/').to_string()
}

/// Parse the request body as a JSON object. An absent or empty body yields
/// an empty parameter map.
fn parse_request_body(body: Option<&str>) -> Result<Map<String, Value>, DispatchError> {
    let raw = match body {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(Map::new()),
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            tracing::warn!(body = %other, "Request body is JSON but not an object");
            Err(DispatchError::Validation(
                "Request data must be a valid JSON".to_string(),
            ))
        }
        Err(error) => {
            tracing::warn!(error = %error, "Failed to parse request body as JSON");
            Err(DispatchError::Validation(
                "Request data must be a valid JSON".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(path: &str) -> ApiEvent {
        ApiEvent {
            path: path.to_string(),
            http_method: None,
            query_string_parameters: None,
            body: None,
            headers: None,
        }
    }

    #[test]
    fn strips_query_string_and_trailing_slash() {
        let request = event("/questions/?session=abc").normalize().unwrap();
        assert_eq!(request.path, "/questions");
    }

    #[test]
    fn method_defaults_to_get_and_is_uppercased() {
        let request = event("/questions").normalize().unwrap();
        assert_eq!(request.method, "GET");

        let mut ev = event("/questions");
        ev.http_method = Some("post".to_string());
        assert_eq!(ev.normalize().unwrap().method, "POST");
    }

    #[test]
    fn absent_body_yields_empty_parameter_map() {
        let request = event("/questions").normalize().unwrap();
        assert!(request.body_params.is_empty());

        let mut ev = event("/questions");
        ev.body = Some(String::new());
        assert!(ev.normalize().unwrap().body_params.is_empty());
    }

    #[test]
    fn invalid_json_body_is_a_validation_error() {
        let mut ev = event("/questions");
        ev.body = Some("{not json".to_string());
        let err = ev.normalize().unwrap_err();
        assert_eq!(err.to_string(), "Request data must be a valid JSON");
    }

    #[test]
    fn non_object_json_body_is_a_validation_error() {
        let mut ev = event("/questions");
        ev.body = Some("[1, 2, 3]".to_string());
        let err = ev.normalize().unwrap_err();
        assert_eq!(err.to_string(), "Request data must be a valid JSON");
    }

    #[test]
    fn object_body_is_parsed() {
        let mut ev = event("/questions");
        ev.body = Some(r#"{"uid": "u1", "answer": 4}"#.to_string());
        let request = ev.normalize().unwrap();
        assert_eq!(request.body_params.get("uid"), Some(&json!("u1")));
        assert_eq!(request.body_params.get("answer"), Some(&json!(4)));
    }

    #[test]
    fn header_names_are_lowercased() {
        let mut ev = event("/questions");
        ev.headers = Some(HashMap::from([(
            "Api_Token".to_string(),
            "t-1".to_string(),
        )]));
        let request = ev.normalize().unwrap();
        assert_eq!(request.headers.get("api_token").map(String::as_str), Some("t-1"));
    }

    #[test]
    fn deserializes_proxy_event_shape() {
        let event: ApiEvent = serde_json::from_value(json!({
            "path": "/questions",
            "httpMethod": "POST",
            "queryStringParameters": {"session": "s1"},
            "body": "{\"answer\": 4}",
            "headers": {"api_token": "t-1"}
        }))
        .unwrap();
        assert_eq!(event.http_method.as_deref(), Some("POST"));
        let request = event.normalize().unwrap();
        assert_eq!(request.query_params.get("session").map(String::as_str), Some("s1"));
    }
}
