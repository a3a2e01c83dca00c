use thiserror::Error;

/// Setup failures raised while building the runtime: invalid configuration
/// or a host capability that was never provided. Auth operations never
/// produce these.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
