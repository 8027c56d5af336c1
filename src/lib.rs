//! Quiz gateway: a request-dispatch layer in front of flash-card quiz
//! handlers.
//!
//! The dispatch core normalizes an inbound HTTP-style event, resolves the
//! effective route through configurable path prefixes, enforces per-route
//! parameter contracts, authenticates the caller against an external
//! token-validation service with a TTL-bound local cache, invokes the
//! matched handler, and translates the handler's return value into a
//! status code and response envelope.
//!
//! Core modules:
//! - [`dispatch`]: event normalization, routing, validation, orchestration
//! - [`auth`]: token cache + external verification
//! - [`quiz`]: the business handlers and the arithmetic evaluator
//! - [`storage`]: the row-store seam behind the handlers
//! - [`http`]: axum front-end adapting HTTP requests into events

// Core subsystems
pub mod auth;
pub mod dispatch;
pub mod http;
pub mod quiz;
pub mod storage;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use dispatch::{ApiEvent, Dispatcher, ResponseEnvelope};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
