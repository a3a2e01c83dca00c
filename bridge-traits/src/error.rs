use thiserror::Error;

/// Failures of host adapters outside the auth-result vocabulary, such as a
/// log sink that cannot write.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
