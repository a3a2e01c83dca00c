//! # Host Bridge Traits
//!
//! Contracts between the authentication core and the host platform.
//!
//! ## Overview
//!
//! The core owns the session state machine but never talks to an identity
//! service itself. Credential exchange is delegated to an
//! [`IdentityProvider`](identity::IdentityProvider) that each host supplies
//! (Firebase on iOS/Android, an in-memory store on desktop, a scripted double
//! in tests). This crate defines that contract together with the values that
//! cross it.
//!
//! ## Traits
//!
//! - [`IdentityProvider`](identity::IdentityProvider) - Sign-up, login, Google
//!   sign-in, logout and session-status notifications
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Values
//!
//! - [`AuthUser`](model::AuthUser) - A provider-issued user, identified by `id`
//! - [`AuthState`](model::AuthState) - `Loading`, `Authenticated(user)` or `Unauthenticated`
//! - [`AuthResult`](model::AuthResult) - Outcome of one async operation
//! - [`AuthErrorKind`](model::AuthErrorKind) / [`AuthFailure`](model::AuthFailure) -
//!   The closed failure taxonomy
//!
//! ## Error Mapping
//!
//! Providers translate their native errors exactly once, at the boundary,
//! using [`AuthFailure::from_provider_code`](model::AuthFailure::from_provider_code).
//! Inside the core failures are plain values carried by `AuthResult`.
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation | Status |
//! |----------|----------------|--------|
//! | Desktop  | `bridge-desktop` (in-memory accounts) | ✅ Available |
//! | iOS      | Swift delegate over FirebaseAuth | 📋 Host-provided |
//! | Android  | Kotlin delegate over Firebase SDK | 📋 Host-provided |
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single provider instance can be
//! shared across async tasks behind an `Arc`.

pub mod error;
pub mod identity;
pub mod log;
pub mod model;

pub use error::BridgeError;

// Re-export commonly used types
pub use identity::{AuthStateCallback, IdentityProvider};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use model::{AuthErrorKind, AuthFailure, AuthResult, AuthState, AuthUser};
