//! UI-facing authentication state.

use bridge_traits::{AuthState, AuthUser};
use serde::{Deserialize, Serialize};

/// Snapshot rendered by presentation layers.
///
/// `is_loading` is request-scoped and independent of `auth_state`:
/// it is set when an operation starts and cleared when that operation settles
/// or when the session stream delivers a new state. `error_message` persists
/// until the next operation starts or the consumer clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthUiState {
    pub is_loading: bool,
    pub auth_state: AuthState,
    pub error_message: Option<String>,
}

impl AuthUiState {
    pub fn is_authenticated(&self) -> bool {
        self.auth_state.is_authenticated()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.auth_state.user()
    }

    /// Whether a presenter would render the two snapshots identically.
    ///
    /// `==` compares users by id only; this also compares profile fields.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        self.is_loading == other.is_loading
            && self.error_message == other.error_message
            && self.auth_state.same_snapshot(&other.auth_state)
    }

    pub(crate) fn with_stream_state(&self, auth_state: AuthState) -> Self {
        Self {
            is_loading: false,
            auth_state,
            error_message: self.error_message.clone(),
        }
    }

    pub(crate) fn started(&self) -> Self {
        Self {
            is_loading: true,
            auth_state: self.auth_state.clone(),
            error_message: None,
        }
    }

    pub(crate) fn succeeded(&self, auth_state: AuthState) -> Self {
        Self {
            is_loading: false,
            auth_state,
            error_message: None,
        }
    }

    pub(crate) fn failed(&self, message: String) -> Self {
        Self {
            is_loading: false,
            auth_state: self.auth_state.clone(),
            error_message: Some(message),
        }
    }

    /// Loading cleared without touching the session or the error.
    pub(crate) fn idle(&self) -> Self {
        Self {
            is_loading: false,
            ..self.clone()
        }
    }

    pub(crate) fn without_error(&self) -> Self {
        Self {
            error_message: None,
            ..self.clone()
        }
    }
}
