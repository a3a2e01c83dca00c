//! # Core Configuration Module
//!
//! Configuration for the authentication core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! [`AuthConfig`] holding the injected identity provider and the runtime
//! policies of the orchestration layer. Validation is fail-fast: a missing
//! provider or an out-of-range timeout is reported by `build()`, never later
//! at the first sign-in attempt.
//!
//! ## Required Dependencies
//!
//! - `IdentityProvider` - The platform-native delegate performing credential
//!   exchange
//!
//! When the `desktop-shims` feature is enabled, the in-memory provider from
//! `bridge-desktop` is injected automatically if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{AuthConfig, ConcurrencyPolicy};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = AuthConfig::builder()
//!     .identity_provider(Arc::new(MyFirebaseDelegate::new()))
//!     .operation_timeout(Duration::from_secs(30))
//!     .concurrency_policy(ConcurrencyPolicy::RejectWhileBusy)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::AuthConfig;
//!
//! // Without the desktop shims there is no default provider.
//! # #[cfg(feature = "desktop-shims")]
//! # panic!("shims inject a provider");
//! let config = AuthConfig::builder()
//!     .build()
//!     .expect("Should fail - missing identity provider");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::IdentityProvider;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for a single provider call (2 minutes)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest timeout accepted by validation (10 minutes)
pub const MAX_OPERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// How the orchestrator treats an operation started while another is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// Run every request; the UI state reflects whichever settles last.
    #[default]
    LastSettlementWins,
    /// Refuse new requests until the pending one settles.
    RejectWhileBusy,
}

/// Authentication core configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Platform-native identity provider
    pub identity_provider: Arc<dyn IdentityProvider>,

    /// Upper bound for each provider call, `None` for unbounded
    pub operation_timeout: Option<Duration>,

    /// Overlapping-request behaviour of the view-model
    pub concurrency_policy: ConcurrencyPolicy,

    /// Logging to initialise during bootstrap, if any
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("identity_provider", &"IdentityProvider { ... }")
            .field("operation_timeout", &self.operation_timeout)
            .field("concurrency_policy", &self.concurrency_policy)
            .field("logging", &self.logging.as_ref().map(|l| l.format))
            .finish()
    }
}

impl AuthConfig {
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Validate policy values.
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.operation_timeout {
            if timeout.is_zero() {
                return Err(Error::Config(
                    "Operation timeout must be greater than 0. \
                     Use .without_operation_timeout() to disable it."
                        .to_string(),
                ));
            }

            if timeout > MAX_OPERATION_TIMEOUT {
                return Err(Error::Config(format!(
                    "Operation timeout exceeds maximum of {} seconds",
                    MAX_OPERATION_TIMEOUT.as_secs()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn identity_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "IdentityProvider".to_string(),
        message: "IdentityProvider implementation is required for authentication. \
                 Desktop: enable the 'desktop-shims' feature to use the in-memory provider. \
                 iOS: inject the Swift delegate wrapping FirebaseAuth. \
                 Android: inject the Kotlin delegate wrapping the Firebase SDK."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_identity_provider() -> Result<Arc<dyn IdentityProvider>> {
    use bridge_desktop::InMemoryIdentityProvider;

    let provider: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());
    Ok(provider)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_identity_provider() -> Result<Arc<dyn IdentityProvider>> {
    Err(identity_provider_missing_error())
}

/// Builder for [`AuthConfig`].
pub struct AuthConfigBuilder {
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    operation_timeout: Option<Duration>,
    concurrency_policy: ConcurrencyPolicy,
    logging: Option<LoggingConfig>,
}

impl Default for AuthConfigBuilder {
    fn default() -> Self {
        Self {
            identity_provider: None,
            operation_timeout: Some(DEFAULT_OPERATION_TIMEOUT),
            concurrency_policy: ConcurrencyPolicy::default(),
            logging: None,
        }
    }
}

impl AuthConfigBuilder {
    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Let provider calls run for as long as they take.
    pub fn without_operation_timeout(mut self) -> Self {
        self.operation_timeout = None;
        self
    }

    pub fn concurrency_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.concurrency_policy = policy;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn build(self) -> Result<AuthConfig> {
        let identity_provider = match self.identity_provider {
            Some(provider) => provider,
            None => provide_default_identity_provider()?,
        };

        let config = AuthConfig {
            identity_provider,
            operation_timeout: self.operation_timeout,
            concurrency_policy: self.concurrency_policy,
            logging: self.logging,
        };

        config.validate()?;

        Ok(config)
    }
}
