//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! (token, environment)
//!     → cache.rs (TTL-bound lookup, evict stale)
//!     → on miss: verifier.rs (single call to the external auth endpoint)
//!     → on success: fresh cache entry with expires_at = now + TTL
//!     → bool (fail-closed: every failure resolves to false)
//! ```
//!
//! # Design Decisions
//! - `is_authenticated` never errors; infrastructure failures are swallowed
//!   into a `false` result rather than propagated
//! - Authentication state is only eventually consistent across a fleet of
//!   processes, bounded by the TTL

pub mod cache;
pub mod verifier;

use std::sync::Arc;
use std::time::Duration;

pub use cache::{AuthCache, Clock, SystemClock};
pub use verifier::{HttpTokenVerifier, TokenVerifier};

/// Default lifetime of a validated token in the cache.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60);

/// Token validation with a process-wide, TTL-bound cache in front of the
/// external auth service.
pub struct AuthService {
    cache: AuthCache,
    verifier: Arc<dyn TokenVerifier>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl AuthService {
    pub fn new(verifier: Arc<dyn TokenVerifier>, ttl: Duration) -> Self {
        Self::with_clock(verifier, ttl, Arc::new(SystemClock))
    }

    /// Construct with an explicit clock. Tests use this to drive TTL expiry
    /// deterministically.
    pub fn with_clock(
        verifier: Arc<dyn TokenVerifier>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache: AuthCache::new(),
            verifier,
            clock,
            ttl,
        }
    }

    /// Whether the caller is authenticated. Never errors; a missing token,
    /// a negative or malformed verifier response, and any transport failure
    /// all resolve to `false`.
    pub async fn is_authenticated(&self, token: Option<&str>, environment: &str) -> bool {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => {
                tracing::debug!("No api_token header present");
                return false;
            }
        };

        if self.cache.check(token, environment, self.clock.now()) {
            return true;
        }

        if self.verifier.verify(token, environment).await {
            self.cache
                .insert(token, environment, self.clock.now(), self.ttl);
            true
        } else {
            false
        }
    }

    /// Cache hits since process start.
    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Verifier that counts external calls and answers from a fixed bool.
    struct CountingVerifier {
        calls: AtomicU64,
        answer: bool,
    }

    impl CountingVerifier {
        fn new(answer: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU64::new(0),
                answer,
            })
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify(&self, _token: &str, _environment: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    /// Manually advanced clock for deterministic TTL tests.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn second_check_within_ttl_hits_the_cache() {
        let verifier = CountingVerifier::new(true);
        let clock = ManualClock::new();
        let service = AuthService::with_clock(
            verifier.clone(),
            Duration::from_secs(60),
            clock.clone(),
        );

        assert!(service.is_authenticated(Some("t-1"), "production").await);
        assert!(service.is_authenticated(Some("t-1"), "production").await);
        assert_eq!(verifier.calls(), 1);
        assert_eq!(service.cache_hits(), 1);
    }

    #[tokio::test]
    async fn check_after_ttl_expiry_calls_the_verifier_again() {
        let verifier = CountingVerifier::new(true);
        let clock = ManualClock::new();
        let service = AuthService::with_clock(
            verifier.clone(),
            Duration::from_secs(60),
            clock.clone(),
        );

        assert!(service.is_authenticated(Some("t-1"), "production").await);
        assert!(service.is_authenticated(Some("t-1"), "production").await);
        clock.advance(Duration::from_secs(61));
        assert!(service.is_authenticated(Some("t-1"), "production").await);
        assert_eq!(verifier.calls(), 2);
    }

    #[tokio::test]
    async fn environment_mismatch_is_a_miss() {
        let verifier = CountingVerifier::new(true);
        let service = AuthService::with_clock(
            verifier.clone(),
            Duration::from_secs(60),
            ManualClock::new(),
        );

        assert!(service.is_authenticated(Some("t-1"), "production").await);
        assert!(service.is_authenticated(Some("t-1"), "staging").await);
        assert_eq!(verifier.calls(), 2);
    }

    #[tokio::test]
    async fn negative_answers_are_not_cached() {
        let verifier = CountingVerifier::new(false);
        let service = AuthService::with_clock(
            verifier.clone(),
            Duration::from_secs(60),
            ManualClock::new(),
        );

        assert!(!service.is_authenticated(Some("t-1"), "production").await);
        assert!(!service.is_authenticated(Some("t-1"), "production").await);
        assert_eq!(verifier.calls(), 2);
    }

    #[tokio::test]
    async fn missing_token_fails_closed_without_an_external_call() {
        let verifier = CountingVerifier::new(true);
        let service = AuthService::with_clock(
            verifier.clone(),
            Duration::from_secs(60),
            ManualClock::new(),
        );

        assert!(!service.is_authenticated(None, "production").await);
        assert!(!service.is_authenticated(Some(""), "production").await);
        assert_eq!(verifier.calls(), 0);
    }
}
