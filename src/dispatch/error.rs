//! Error taxonomy for the dispatch pipeline.
//!
//! # Design Decisions
//! - Validation and authentication errors short-circuit the pipeline
//! - Authentication carries a fixed message; it never reveals which part
//!   of the token check failed
//! - Handler errors are a separate type: they are contained at the
//!   invocation boundary and never cross the dispatch layer

use thiserror::Error;

/// Terminal pipeline errors. Each variant maps to exactly one envelope shape.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed body, unsupported path/method/parameter, or a missing
    /// required parameter. Rendered as HTTP 400 with `{"Error": message}`.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired token. Rendered as HTTP 401.
    #[error("Authentication error, token is missing or invalid.")]
    Authentication,
}

/// Failure raised inside a business handler. Caught at the invocation
/// boundary and converted into an `{"Error": ...}` payload, then
/// reclassified by the status inferrer.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: crate::storage::StorageError,
    },

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_is_fixed() {
        assert_eq!(
            DispatchError::Authentication.to_string(),
            "Authentication error, token is missing or invalid."
        );
    }

    #[test]
    fn validation_carries_its_message() {
        let err = DispatchError::Validation("Missing a required parameter: uid".into());
        assert_eq!(err.to_string(), "Missing a required parameter: uid");
    }
}
