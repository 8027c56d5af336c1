//! Request-dispatch core.
//!
//! # Data Flow
//! ```text
//! Inbound event (path, method, query, body, headers)
//!     → event.rs (normalize once)
//!     → dispatcher.rs (authenticate, then orchestrate)
//!     → router.rs (prefix resolution + route lookup)
//!     → params.rs (parameter contract)
//!     → handler (business outcome as a return value)
//!     → status.rs (status inference)
//!     → ResponseEnvelope (terminal, built exactly once)
//! ```
//!
//! # Design Decisions
//! - The route table is declarative and frozen at startup
//! - Handlers return an explicit result variant; the dispatch layer never
//!   lets a handler failure propagate
//! - Errors split into validation (400) and authentication (401) terminal
//!   states; everything else is a payload classification concern

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod params;
pub mod router;
pub mod status;

pub use dispatcher::{Dispatcher, ResponseEnvelope, DEFAULT_ENVIRONMENT};
pub use error::{DispatchError, HandlerError};
pub use event::{ApiEvent, Request};
pub use router::{Handler, HandlerParams, ParamSource, Route, RouteTable};
pub use status::infer_status;
