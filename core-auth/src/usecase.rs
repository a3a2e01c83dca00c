//! Single-purpose use-cases over an [`AuthRepository`].
//!
//! Each use-case wraps exactly one repository call and adds nothing to it.

use bridge_traits::{AuthResult, AuthState, AuthUser};
use core_runtime::ReadOnlyObservable;
use std::sync::Arc;

use crate::repository::AuthRepository;

pub struct SignUpUseCase {
    repository: Arc<dyn AuthRepository>,
}

impl SignUpUseCase {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.repository.sign_up_with_email(email, password).await
    }
}

pub struct LoginUseCase {
    repository: Arc<dyn AuthRepository>,
}

impl LoginUseCase {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.repository.login_with_email(email, password).await
    }
}

pub struct GoogleSignInUseCase {
    repository: Arc<dyn AuthRepository>,
}

impl GoogleSignInUseCase {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id_token: &str, access_token: Option<&str>) -> AuthResult<AuthUser> {
        self.repository
            .sign_in_with_google(id_token, access_token.map(str::to_owned))
            .await
    }
}

pub struct LogoutUseCase {
    repository: Arc<dyn AuthRepository>,
}

impl LogoutUseCase {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> AuthResult<()> {
        self.repository.logout().await
    }
}

pub struct GetCurrentUserUseCase {
    repository: Arc<dyn AuthRepository>,
}

impl GetCurrentUserUseCase {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn execute(&self) -> Option<AuthUser> {
        self.repository.current_user()
    }
}

pub struct ObserveAuthStateUseCase {
    repository: Arc<dyn AuthRepository>,
}

impl ObserveAuthStateUseCase {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn execute(&self) -> ReadOnlyObservable<AuthState> {
        self.repository.auth_state_flow()
    }
}

/// The full set of use-cases the view-model depends on.
pub struct AuthUseCases {
    pub sign_up: SignUpUseCase,
    pub login: LoginUseCase,
    pub google_sign_in: GoogleSignInUseCase,
    pub logout: LogoutUseCase,
    pub get_current_user: GetCurrentUserUseCase,
    pub observe_auth_state: ObserveAuthStateUseCase,
}

impl AuthUseCases {
    /// Builds every use-case over one shared repository.
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self {
            sign_up: SignUpUseCase::new(Arc::clone(&repository)),
            login: LoginUseCase::new(Arc::clone(&repository)),
            google_sign_in: GoogleSignInUseCase::new(Arc::clone(&repository)),
            logout: LogoutUseCase::new(Arc::clone(&repository)),
            get_current_user: GetCurrentUserUseCase::new(Arc::clone(&repository)),
            observe_auth_state: ObserveAuthStateUseCase::new(repository),
        }
    }
}
