//! Core service façade and bootstrap helpers.
//!
//! This crate wires a host-provided identity provider into the shared
//! authentication core. Hosts build an [`AuthConfig`], hand it to
//! [`AuthCore::bootstrap`], and talk to the returned view-model from then on.
//! Every layer receives its dependencies at construction; nothing is resolved
//! from global state.
//!
//! Desktop apps typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) to get the in-memory provider when none is supplied.
//!
//! ```ignore
//! use core_service::{AuthConfig, AuthCore};
//! use std::sync::Arc;
//!
//! let config = AuthConfig::builder()
//!     .identity_provider(Arc::new(MyFirebaseDelegate::new()))
//!     .build()?;
//! let core = AuthCore::bootstrap(config)?;
//!
//! let _subscription = core.view_model().subscribe(|state| render(state));
//! core.view_model().login("ada@example.com", "secret1").await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::{AuthErrorKind, AuthFailure, AuthResult, AuthState, AuthUser, IdentityProvider};
pub use core_auth::{AuthRepository, AuthService, AuthUiState, AuthViewModel};
pub use core_runtime::config::{AuthConfig, ConcurrencyPolicy};
pub use core_runtime::logging::{LogFormat, LoggingConfig};
pub use core_runtime::Subscription;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::InMemoryIdentityProvider;

use std::sync::Arc;

use core_auth::{AuthRepositoryImpl, AuthUseCases};
use tracing::{info, warn};

/// Primary façade exposed to host applications.
///
/// Owns the object graph `AuthService → AuthRepository → use-cases →
/// AuthViewModel`. Cloning is cheap and shares the graph.
#[derive(Clone)]
pub struct AuthCore {
    service: Arc<AuthService>,
    repository: Arc<dyn AuthRepository>,
    view_model: Arc<AuthViewModel>,
}

impl AuthCore {
    /// Build the authentication core from `config`.
    ///
    /// Must run inside a Tokio runtime. Logging is initialised first when the
    /// config carries a [`LoggingConfig`]; if the host already installed a
    /// subscriber that failure is logged and ignored.
    pub fn bootstrap(config: AuthConfig) -> Result<Self> {
        if let Some(logging) = config.logging.clone() {
            if let Err(err) = core_runtime::logging::init_logging(logging) {
                warn!(error = %err, "Logging already initialised, keeping existing subscriber");
            }
        }

        let service = Arc::new(AuthService::from_config(&config)?);
        let repository: Arc<dyn AuthRepository> =
            Arc::new(AuthRepositoryImpl::new(Arc::clone(&service)));
        let use_cases = AuthUseCases::new(Arc::clone(&repository));
        let view_model = Arc::new(AuthViewModel::new(use_cases, config.concurrency_policy)?);

        info!(
            timeout_secs = config.operation_timeout.map(|t| t.as_secs()),
            policy = ?config.concurrency_policy,
            "Auth core bootstrapped"
        );

        Ok(Self {
            service,
            repository,
            view_model,
        })
    }

    /// Bootstrap with the in-memory desktop provider and default policies.
    #[cfg(feature = "desktop-shims")]
    pub fn bootstrap_desktop() -> Result<Self> {
        Self::bootstrap(AuthConfig::builder().build()?)
    }

    pub fn view_model(&self) -> Arc<AuthViewModel> {
        Arc::clone(&self.view_model)
    }

    pub fn repository(&self) -> Arc<dyn AuthRepository> {
        Arc::clone(&self.repository)
    }

    pub fn service(&self) -> Arc<AuthService> {
        Arc::clone(&self.service)
    }

    /// Tear down the view-model. Idempotent.
    pub fn shutdown(&self) {
        self.view_model.dispose();
        info!("Auth core shut down");
    }
}

impl std::fmt::Debug for AuthCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCore")
            .field("service", &self.service)
            .field("view_model", &self.view_model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::InMemoryIdentityProvider;

    #[test]
    fn test_bootstrap_requires_runtime() {
        let config = AuthConfig::builder()
            .identity_provider(Arc::new(InMemoryIdentityProvider::new()))
            .build()
            .unwrap();

        match AuthCore::bootstrap(config) {
            Err(CoreError::Auth(core_auth::AuthError::RuntimeUnavailable(_))) => {}
            other => panic!("Expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_runtime_errors_convert() {
        let missing = core_runtime::Error::CapabilityMissing {
            capability: "IdentityProvider".to_string(),
            message: "inject one".to_string(),
        };
        assert!(matches!(
            CoreError::from(missing),
            CoreError::CapabilityMissing { .. }
        ));

        let config = core_runtime::Error::Config("bad timeout".to_string());
        match CoreError::from(config) {
            CoreError::InitializationFailed(msg) => assert!(msg.contains("bad timeout")),
            other => panic!("Expected initialization failure, got {:?}", other),
        }

        let nested = core_auth::AuthError::Configuration(core_runtime::Error::Config(
            "zero timeout".to_string(),
        ));
        assert!(matches!(
            CoreError::from(nested),
            CoreError::InitializationFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let config = AuthConfig::builder()
            .identity_provider(Arc::new(InMemoryIdentityProvider::new()))
            .build()
            .unwrap();
        let core = AuthCore::bootstrap(config).unwrap();

        core.shutdown();
        core.shutdown();
        assert!(core.view_model().is_disposed());
    }
}
