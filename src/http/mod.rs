//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → ApiEvent (path, method, query, body, headers)
//!     → dispatch core
//!     → ResponseEnvelope mapped onto the HTTP response
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
