use thiserror::Error;

/// Failures constructing or wiring the authentication layer.
///
/// Operation outcomes are never reported through this type; they travel as
/// [`AuthResult`](bridge_traits::AuthResult) values.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Async runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
