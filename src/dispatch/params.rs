//! Parameter contract enforcement.
//!
//! # Responsibilities
//! - Enforce the per-route source whitelist (query string vs. body)
//! - Merge parameter sources, body winning on name collisions
//! - Reject parameters outside the route's allow-list
//! - Check the required-parameter contract
//!
//! # Design Decisions
//! - Pure function over the matched route and both parameter maps
//! - Absent keys are omitted from the result, never populated with null
//! - The merged map is ordered so error messages are deterministic

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::dispatch::error::DispatchError;
use crate::dispatch::router::{HandlerParams, ParamSource, Route};

/// Validate both parameter maps against the route's contract and produce the
/// keyword map for the handler.
pub fn validate_params(
    route: &Route,
    query_params: &HashMap<String, String>,
    body_params: &Map<String, Value>,
) -> Result<HandlerParams, DispatchError> {
    if !query_params.is_empty() && !route.allows(ParamSource::Query) {
        return Err(DispatchError::Validation(
            "QueryString parameters are not allowed".to_string(),
        ));
    }
    if !body_params.is_empty() && !route.allows(ParamSource::Body) {
        return Err(DispatchError::Validation(
            "Request body parameters are not allowed".to_string(),
        ));
    }

    // Body values take precedence over query values for identical names.
    let mut merged = HandlerParams::new();
    for (name, value) in query_params {
        merged.insert(name.clone(), Value::String(value.clone()));
    }
    for (name, value) in body_params {
        merged.insert(name.clone(), value.clone());
    }

    for name in merged.keys() {
        if !route.declares(name) {
            return Err(DispatchError::Validation(format!(
                "Received unsupported parameter (either in query string or in data): {name}."
            )));
        }
    }

    merged.retain(|_, value| !value.is_null());

    for name in route.required_names() {
        if !merged.contains_key(name) {
            return Err(DispatchError::Validation(format!(
                "Missing a required parameter: {name}"
            )));
        }
    }

    Ok(merged)
}
