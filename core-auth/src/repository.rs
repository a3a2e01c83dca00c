//! Repository boundary between orchestration and the concrete service.

use async_trait::async_trait;
use bridge_traits::{AuthResult, AuthState, AuthUser};
use core_runtime::ReadOnlyObservable;
use std::sync::Arc;

use crate::service::AuthService;

/// Authentication data source consumed by the use-cases.
///
/// Implementations forward calls unchanged; error classification has already
/// happened at the provider boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    fn auth_state_flow(&self) -> ReadOnlyObservable<AuthState>;

    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_up_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    async fn login_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    async fn sign_in_with_google(
        &self,
        id_token: &str,
        access_token: Option<String>,
    ) -> AuthResult<AuthUser>;

    async fn logout(&self) -> AuthResult<()>;
}

/// [`AuthRepository`] backed by an [`AuthService`].
#[derive(Debug, Clone)]
pub struct AuthRepositoryImpl {
    service: Arc<AuthService>,
}

impl AuthRepositoryImpl {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    fn auth_state_flow(&self) -> ReadOnlyObservable<AuthState> {
        self.service.auth_state_flow()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.service.current_user()
    }

    async fn sign_up_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.service.sign_up_with_email(email, password).await
    }

    async fn login_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.service.login_with_email(email, password).await
    }

    async fn sign_in_with_google(
        &self,
        id_token: &str,
        access_token: Option<String>,
    ) -> AuthResult<AuthUser> {
        self.service
            .sign_in_with_google(id_token, access_token.as_deref())
            .await
    }

    async fn logout(&self) -> AuthResult<()> {
        self.service.logout().await
    }
}
