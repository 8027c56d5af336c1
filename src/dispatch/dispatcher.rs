//! Dispatch orchestration.
//!
//! # Data Flow
//! ```text
//! ApiEvent
//!     → event.rs (normalize)
//!     → auth (api_token/env headers, removed before anything else runs)
//!     → router.rs (prefix resolution + method lookup)
//!     → params.rs (source whitelist, merge, contract)
//!     → handler invocation (errors contained here)
//!     → status.rs (payload classification)
//!     → ResponseEnvelope
//! ```
//!
//! # Design Decisions
//! - Strict sequence per invocation, no retry; every invocation independent
//! - Validation and authentication failures are terminal states with fixed
//!   envelope shapes (400 / 401)
//! - A handler `Err` becomes an `{"Error": ...}` payload and flows through
//!   the status inferrer like any other business outcome

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{json, Value};

use crate::auth::AuthService;
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::ApiEvent;
use crate::dispatch::params::validate_params;
use crate::dispatch::router::RouteTable;
use crate::dispatch::status::infer_status;
use crate::observability::metrics;

/// Environment assumed when the caller does not send an `env` header.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// The status/headers/body triple returned to the calling gateway.
/// Constructed exactly once per invocation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Orchestrates normalization, authentication, routing, validation and
/// handler invocation for one event at a time.
pub struct Dispatcher {
    routes: RouteTable,
    path_prefixes: Vec<String>,
    auth: AuthService,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, path_prefixes: Vec<String>, auth: AuthService) -> Self {
        Self {
            routes,
            path_prefixes,
            auth,
        }
    }

    /// Run one event through the pipeline. Always produces an envelope;
    /// failures map to the 400/401 terminal states.
    pub async fn dispatch(&self, event: ApiEvent) -> ResponseEnvelope {
        let start = Instant::now();
        let method = event
            .http_method
            .clone()
            .unwrap_or_else(|| "GET".to_string())
            .to_uppercase();

        let envelope = match self.process(event).await {
            Ok(envelope) => envelope,
            Err(DispatchError::Validation(message)) => {
                metrics::record_invalid_request();
                validation_error_envelope(&message)
            }
            Err(DispatchError::Authentication) => {
                metrics::record_unauthenticated_request();
                authentication_error_envelope()
            }
        };

        metrics::record_dispatch(&method, envelope.status_code, start);
        envelope
    }

    async fn process(&self, event: ApiEvent) -> Result<ResponseEnvelope, DispatchError> {
        let mut request = event.normalize()?;

        // Auth material is removed up front so handlers never see it.
        let token = request.headers.remove("api_token");
        let environment = request
            .headers
            .remove("env")
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        if !self
            .auth
            .is_authenticated(token.as_deref(), &environment)
            .await
        {
            return Err(DispatchError::Authentication);
        }

        let path = self
            .routes
            .resolve_path(&request.path, &self.path_prefixes)?;
        let route = self.routes.lookup(&path, &request.method)?;

        let params = validate_params(route, &request.query_params, &request.body_params)?;

        tracing::info!(
            path = %path,
            method = %request.method,
            params = ?params.keys().collect::<Vec<_>>(),
            "Invoking handler"
        );

        let data = match route.handler().call(params).await {
            Ok(data) => data,
            Err(error) => {
                tracing::error!(
                    path = %path,
                    method = %request.method,
                    error = %error,
                    "Handler call failed"
                );
                json!({ "Error": error.to_string() })
            }
        };

        Ok(success_envelope(&data))
    }
}

fn success_envelope(data: &Value) -> ResponseEnvelope {
    let status_code = infer_status(data).as_u16();
    let body = if data.is_null() {
        "{}".to_string()
    } else {
        data.to_string()
    };

    ResponseEnvelope {
        status_code,
        headers: HashMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            (
                "Access-Control-Allow-Headers".to_string(),
                "api_token, env".to_string(),
            ),
            ("Content-type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "text/plain".to_string()),
        ]),
        body,
    }
}

fn validation_error_envelope(message: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        status_code: 400,
        headers: HashMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            ("Content-type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "text/plain".to_string()),
        ]),
        body: json!({ "Error": message }).to_string(),
    }
}

fn authentication_error_envelope() -> ResponseEnvelope {
    ResponseEnvelope {
        status_code: 401,
        headers: HashMap::from([(
            "Content-type".to_string(),
            "application/json".to_string(),
        )]),
        body: json!({ "message": DispatchError::Authentication.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenVerifier;
    use crate::dispatch::error::HandlerError;
    use crate::dispatch::router::{Handler, HandlerParams, Route};
    use async_trait::async_trait;
    use axum::http::Method;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticVerifier(bool);

    #[async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify(&self, _token: &str, _environment: &str) -> bool {
            self.0
        }
    }

    struct RecordingHandler {
        invoked: Arc<AtomicBool>,
        result: Result<Value, String>,
    }

    #[async_trait]
    impl Handler for RecordingHandler {
        async fn call(&self, params: HandlerParams) -> Result<Value, HandlerError> {
            self.invoked.store(true, Ordering::SeqCst);
            match &self.result {
                Ok(value) => {
                    if value.is_null() {
                        Ok(json!(params))
                    } else {
                        Ok(value.clone())
                    }
                }
                Err(message) => Err(HandlerError::Other(message.clone())),
            }
        }
    }

    fn dispatcher_with(
        result: Result<Value, String>,
        verifier_answer: bool,
    ) -> (Dispatcher, Arc<AtomicBool>) {
        let invoked = Arc::new(AtomicBool::new(false));
        let handler = Arc::new(RecordingHandler {
            invoked: invoked.clone(),
            result,
        });
        let routes = RouteTable::builder()
            .route(
                "/questions",
                Method::GET,
                Route::new(handler).required(["session"]).optional(["name"]),
            )
            .build();
        let auth = AuthService::new(
            Arc::new(StaticVerifier(verifier_answer)),
            Duration::from_secs(60),
        );
        (
            Dispatcher::new(routes, vec!["/admin".to_string()], auth),
            invoked,
        )
    }

    fn event(path: &str, token: Option<&str>) -> ApiEvent {
        ApiEvent {
            path: path.to_string(),
            http_method: Some("GET".to_string()),
            query_string_parameters: Some(
                [("session".to_string(), "s1".to_string())].into(),
            ),
            body: None,
            headers: token.map(|t| [("api_token".to_string(), t.to_string())].into()),
        }
    }

    #[tokio::test]
    async fn invalid_token_yields_401_and_skips_the_handler() {
        let (dispatcher, invoked) = dispatcher_with(Ok(Value::Null), false);
        let envelope = dispatcher.dispatch(event("/questions", Some("bad"))).await;

        assert_eq!(envelope.status_code, 401);
        assert_eq!(
            envelope.body,
            json!({"message": "Authentication error, token is missing or invalid."}).to_string()
        );
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn missing_token_yields_401() {
        let (dispatcher, invoked) = dispatcher_with(Ok(Value::Null), true);
        let envelope = dispatcher.dispatch(event("/questions", None)).await;

        assert_eq!(envelope.status_code, 401);
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_path_yields_400_with_error_body() {
        let (dispatcher, _) = dispatcher_with(Ok(Value::Null), true);
        let envelope = dispatcher.dispatch(event("/nowhere", Some("t-1"))).await;

        assert_eq!(envelope.status_code, 400);
        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert!(body["Error"]
            .as_str()
            .unwrap()
            .contains("`/nowhere` is not supported"));
    }

    #[tokio::test]
    async fn prefixed_path_resolves_to_the_same_route() {
        let (dispatcher, invoked) = dispatcher_with(Ok(Value::Null), true);
        let envelope = dispatcher
            .dispatch(event("/admin/questions", Some("t-1")))
            .await;

        assert_eq!(envelope.status_code, 200);
        assert!(invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn success_envelope_carries_cors_headers_and_payload() {
        let (dispatcher, _) = dispatcher_with(Ok(Value::Null), true);
        let envelope = dispatcher.dispatch(event("/questions", Some("t-1"))).await;

        assert_eq!(envelope.status_code, 200);
        assert_eq!(
            envelope.headers.get("Access-Control-Allow-Origin").map(String::as_str),
            Some("*")
        );
        assert_eq!(
            envelope.headers.get("Access-Control-Allow-Headers").map(String::as_str),
            Some("api_token, env")
        );
        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        // The handler echoes the validated params; auth headers never reach it.
        assert_eq!(body, json!({"session": "s1"}));
    }

    #[tokio::test]
    async fn handler_failure_is_contained_and_reclassified() {
        let (dispatcher, _) =
            dispatcher_with(Err("failed to save answer".to_string()), true);
        let envelope = dispatcher.dispatch(event("/questions", Some("t-1"))).await;

        assert_eq!(envelope.status_code, 500);
        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(body, json!({"Error": "failed to save answer"}));
    }

    #[tokio::test]
    async fn null_payload_serializes_as_empty_object() {
        let (dispatcher, _) = dispatcher_with(Ok(json!("ok")), true);
        let envelope = dispatcher.dispatch(event("/questions", Some("t-1"))).await;
        assert_eq!(envelope.status_code, 200);

        assert_eq!(success_envelope(&Value::Null).body, "{}");
    }
}
