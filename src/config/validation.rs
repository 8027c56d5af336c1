//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTL > 0, parseable addresses)
//! - Check prefix shape so path resolution stays well-defined
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: `GatewayConfig → Result<(), Vec<_>>`
//! - Runs before the config is accepted into the system

use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("invalid auth url `{0}`")]
    InvalidAuthUrl(String),

    #[error("auth token TTL must be greater than zero")]
    ZeroTokenTtl,

    #[error("path prefix `{0}` must start with `/` and not end with `/`")]
    MalformedPathPrefix(String),

    #[error("invalid metrics address `{0}`")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if url::Url::parse(&config.auth.url).is_err() {
        errors.push(ValidationError::InvalidAuthUrl(config.auth.url.clone()));
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::ZeroTokenTtl);
    }

    for prefix in &config.routing.path_prefixes {
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            errors.push(ValidationError::MalformedPathPrefix(prefix.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
