//! # Auth Service
//!
//! Adapts the injected [`IdentityProvider`] into the core's vocabulary.
//!
//! ## Overview
//!
//! The service owns the authoritative session stream: it registers a single
//! callback with the provider at construction and republishes every
//! notification through an [`Observable`]. Each operation forwards to the
//! provider and settles exactly once:
//!
//! - a provider that is absent or not ready fails immediately with
//!   `Unknown("delegate not configured")`
//! - a call exceeding the configured timeout settles as `NetworkError`
//! - a provider that completes with `Loading` is reported as `Unknown`
//!
//! Provider errors are already classified by the provider and pass through
//! untouched.

use bridge_traits::{
    AuthErrorKind, AuthFailure, AuthResult, AuthState, AuthUser, IdentityProvider,
};
use core_runtime::config::AuthConfig;
use core_runtime::logging::redact_if_sensitive;
use core_runtime::{Observable, ReadOnlyObservable};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;

/// Message reported when no usable provider is wired in.
pub const DELEGATE_NOT_CONFIGURED: &str = "delegate not configured";

/// Message reported when a provider call exceeds the operation timeout.
pub const TIMEOUT_MESSAGE: &str = "Authentication request timed out";

const LOADING_RESULT_MESSAGE: &str = "Identity provider completed without a result";

/// Wraps the identity provider and owns the session stream.
pub struct AuthService {
    provider: Option<Arc<dyn IdentityProvider>>,
    state: Observable<AuthState>,
    operation_timeout: Option<Duration>,
}

impl AuthService {
    /// Creates a service bound to `provider`.
    ///
    /// The provider's state callback is registered here, so the stream starts
    /// at whatever the provider reports immediately (usually the restored
    /// session) rather than waiting for the first change.
    pub fn new(provider: Arc<dyn IdentityProvider>, operation_timeout: Option<Duration>) -> Self {
        let state = Observable::new(AuthState::Loading);

        let publisher = state.clone();
        provider.observe_auth_state(Arc::new(move |next: AuthState| {
            debug!(state = %next, "Provider reported auth state");
            publisher.set(next);
        }));

        Self {
            provider: Some(provider),
            state,
            operation_timeout,
        }
    }

    /// Creates a service from a validated [`AuthConfig`].
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            Arc::clone(&config.identity_provider),
            config.operation_timeout,
        ))
    }

    /// A service without a provider. Every operation fails immediately.
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            state: Observable::new(AuthState::Loading),
            operation_timeout: None,
        }
    }

    /// Read-only view of the session stream.
    pub fn auth_state_flow(&self) -> ReadOnlyObservable<AuthState> {
        self.state.read_only()
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    pub fn is_configured(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_ready())
    }

    /// Provider snapshot of the signed-in user.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.ready_provider().ok()?.current_user()
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn sign_up_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let provider = match self.ready_provider() {
            Ok(provider) => provider,
            Err(failure) => return AuthResult::Error(failure),
        };

        self.settle("sign_up", provider.sign_up_with_email(email, password))
            .await
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn login_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let provider = match self.ready_provider() {
            Ok(provider) => provider,
            Err(failure) => return AuthResult::Error(failure),
        };

        self.settle("login", provider.login_with_email(email, password))
            .await
    }

    #[instrument(skip_all, fields(has_access_token = access_token.is_some()))]
    pub async fn sign_in_with_google(
        &self,
        id_token: &str,
        access_token: Option<&str>,
    ) -> AuthResult<AuthUser> {
        let provider = match self.ready_provider() {
            Ok(provider) => provider,
            Err(failure) => return AuthResult::Error(failure),
        };

        self.settle(
            "google_sign_in",
            provider.sign_in_with_google(id_token, access_token),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> AuthResult<()> {
        let provider = match self.ready_provider() {
            Ok(provider) => provider,
            Err(failure) => return AuthResult::Error(failure),
        };

        self.settle("logout", provider.logout()).await
    }

    fn ready_provider(&self) -> std::result::Result<&Arc<dyn IdentityProvider>, AuthFailure> {
        match &self.provider {
            Some(provider) if provider.is_ready() => Ok(provider),
            Some(_) => {
                warn!("Identity provider is not ready");
                Err(AuthFailure::new(AuthErrorKind::Unknown, DELEGATE_NOT_CONFIGURED))
            }
            None => {
                warn!("No identity provider configured");
                Err(AuthFailure::new(AuthErrorKind::Unknown, DELEGATE_NOT_CONFIGURED))
            }
        }
    }

    async fn settle<T, F>(&self, operation: &'static str, call: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        let outcome = match self.operation_timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(
                        operation,
                        timeout_secs = limit.as_secs(),
                        "Identity provider call timed out"
                    );
                    return AuthResult::error(AuthErrorKind::NetworkError, TIMEOUT_MESSAGE);
                }
            },
            None => call.await,
        };

        match outcome {
            AuthResult::Success(value) => {
                info!(operation, "Authentication operation succeeded");
                AuthResult::Success(value)
            }
            AuthResult::Error(failure) => {
                warn!(operation, kind = %failure.kind, "Authentication operation failed");
                AuthResult::Error(failure)
            }
            AuthResult::Loading => {
                error!(operation, "Identity provider settled on Loading");
                AuthResult::error(AuthErrorKind::Unknown, LOADING_RESULT_MESSAGE)
            }
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("configured", &self.is_configured())
            .field("state", &self.state.get())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}
