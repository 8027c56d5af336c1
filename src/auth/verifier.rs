//! External token verification.
//!
//! # Responsibilities
//! - Issue the single blocking round trip to the auth endpoint
//! - Parse the `is_authenticated` field out of the JSON response
//!
//! # Design Decisions
//! - This boundary never raises: transport errors, non-JSON bodies and
//!   missing or ill-typed fields all resolve to `false`
//! - No retry; callers must not assume idempotent retry safety

use async_trait::async_trait;
use serde_json::Value;

/// Seam to the external authentication service.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Whether the service vouches for `(token, environment)`.
    async fn verify(&self, token: &str, environment: &str) -> bool;
}

/// Verifier backed by a `GET <auth_url>` call with the token and environment
/// passed as request headers.
pub struct HttpTokenVerifier {
    client: reqwest::Client,
    auth_url: String,
}

impl HttpTokenVerifier {
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_url: auth_url.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str, environment: &str) -> bool {
        tracing::debug!(url = %self.auth_url, env = %environment, "Checking token against auth endpoint");

        let response = match self
            .client
            .get(&self.auth_url)
            .header("api_token", token)
            .header("env", environment)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %error, "Auth endpoint unreachable");
                return false;
            }
        };

        match response.json::<Value>().await {
            // Only an exact `true` authenticates.
            Ok(body) => body.get("is_authenticated").and_then(Value::as_bool) == Some(true),
            Err(error) => {
                tracing::warn!(error = %error, "Received bad response from auth endpoint");
                false
            }
        }
    }
}
