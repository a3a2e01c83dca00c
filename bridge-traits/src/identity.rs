//! Identity Provider Abstraction
//!
//! The contract a platform-native identity provider (Firebase on iOS, a
//! desktop account store, a test double) must satisfy to be plugged into the
//! core.

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::{AuthResult, AuthState, AuthUser};

/// Callback invoked by a provider whenever the session status changes.
pub type AuthStateCallback = Arc<dyn Fn(AuthState) + Send + Sync>;

/// Identity provider delegate trait
///
/// Implemented by the host platform and injected into the core at start-up.
///
/// # Contract
///
/// - Every async operation completes exactly once. The core treats calls as
///   opaque and never retries them.
/// - Native error codes are translated into the closed
///   [`AuthErrorKind`](crate::model::AuthErrorKind) set before a result is
///   returned, preferably through
///   [`AuthFailure::from_provider_code`](crate::model::AuthFailure::from_provider_code).
/// - [`observe_auth_state`](IdentityProvider::observe_auth_state) keeps exactly
///   one registered callback. Registering again replaces the previous one.
///   The callback fires once immediately with the current state and again on
///   every identity change (token refreshes that keep the same user need not
///   fire).
/// - Methods may be invoked from whatever task raises UI events, so
///   implementations must be `Send + Sync`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::identity::{AuthStateCallback, IdentityProvider};
/// use bridge_traits::model::{AuthFailure, AuthResult, AuthState, AuthUser};
/// use async_trait::async_trait;
///
/// struct FirebaseProvider { /* native handle */ }
///
/// #[async_trait]
/// impl IdentityProvider for FirebaseProvider {
///     fn current_user(&self) -> Option<AuthUser> { None }
///
///     fn observe_auth_state(&self, on_change: AuthStateCallback) {
///         on_change(AuthState::Unauthenticated);
///     }
///
///     async fn login_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
///         match native_sign_in(email, password).await {
///             Ok(user) => AuthResult::Success(user),
///             Err(e) => AuthResult::Error(AuthFailure::from_provider_code(&e.code, &e.message)),
///         }
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the provider finished its own bootstrap (SDK init, client ids).
    ///
    /// The core refuses to call into a provider that is not ready.
    fn is_ready(&self) -> bool {
        true
    }

    /// Synchronous snapshot of the signed-in user, `None` without a session.
    fn current_user(&self) -> Option<AuthUser>;

    /// Register the single session-status callback.
    fn observe_auth_state(&self, on_change: AuthStateCallback);

    /// Create an account with e-mail and password.
    async fn sign_up_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    /// Sign in with e-mail and password.
    async fn login_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    /// Exchange a Google credential for a session.
    async fn sign_in_with_google(
        &self,
        id_token: &str,
        access_token: Option<&str>,
    ) -> AuthResult<AuthUser>;

    /// End the current session.
    async fn logout(&self) -> AuthResult<()>;
}
