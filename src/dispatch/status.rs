//! Status-code inference over handler payloads.
//!
//! # Responsibilities
//! - Map a handler's returned payload to an HTTP status code
//!
//! # Design Decisions
//! - Substring matching over the stringified payload is a known fragility
//!   kept for compatibility with the existing external contract; do not
//!   extend the table
//! - Evaluation order is part of the contract: "fail" must be checked
//!   before "successfully created", and so on

use axum::http::StatusCode;
use serde_json::Value;

/// Classify a handler payload. Total over all JSON shapes; evaluated in
/// strict priority order.
pub fn infer_status(data: &Value) -> StatusCode {
    match data {
        Value::Null | Value::Array(_) => StatusCode::OK,
        Value::Object(map) if !map.contains_key("Error") => StatusCode::OK,
        Value::String(_) | Value::Object(_) => {
            let text = data.to_string().to_lowercase();
            if text.contains("bad request") {
                StatusCode::BAD_REQUEST
            } else if text.contains("not found") {
                StatusCode::NOT_FOUND
            } else if text.contains("fail") {
                StatusCode::INTERNAL_SERVER_ERROR
            } else if text.contains("successfully created") {
                StatusCode::CREATED
            } else if text.contains("error") && matches!(data, Value::Object(m) if m.contains_key("Error"))
            {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            }
        }
        other => {
            tracing::error!(payload = %other, "Unsupported handler payload shape");
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
    }
}
