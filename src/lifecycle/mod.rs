//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Ordered startup: config first, then dispatcher, then listener
//! - Shutdown fans out over a broadcast channel so the server and tests can
//!   stop the run loop without killing the process

pub mod shutdown;

pub use shutdown::Shutdown;
