//! # Authentication Module
//!
//! Platform-agnostic authentication orchestration over an injected identity
//! provider.
//!
//! ## Overview
//!
//! Control flows leaf-first through four layers:
//!
//! ```text
//! IdentityProvider ──> AuthService ──> AuthRepository ──> use-cases ──> AuthViewModel ──> host UI
//!   (native SDK)       (timeouts,      (substitution      (one call     (owns AuthUiState)
//!                       session         boundary)          each)
//!                       stream)
//! ```
//!
//! Error classification happens once, at the provider boundary. Everything
//! above it threads [`AuthResult`](bridge_traits::AuthResult) values through
//! unchanged until the view-model folds them into the UI state.
//!
//! ## Features
//!
//! - Session stream republished from the provider with any number of observers
//! - Bounded provider calls (configurable timeout)
//! - Serialized UI state updates with last-settlement-wins or
//!   reject-while-busy overlap handling
//! - Deterministic teardown

pub mod error;
pub mod repository;
pub mod service;
pub mod ui_state;
pub mod usecase;
pub mod view_model;

pub use error::{AuthError, Result};
pub use repository::{AuthRepository, AuthRepositoryImpl};
pub use service::AuthService;
pub use ui_state::AuthUiState;
pub use usecase::{
    AuthUseCases, GetCurrentUserUseCase, GoogleSignInUseCase, LoginUseCase, LogoutUseCase,
    ObserveAuthStateUseCase, SignUpUseCase,
};
pub use view_model::AuthViewModel;
