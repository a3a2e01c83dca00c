//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the authentication core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Observable values with cancellable subscriptions
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other modules depend on. It
//! establishes the logging conventions, the fail-fast configuration builder,
//! and the broadcasting primitive used to push auth state to hosts.

pub mod config;
pub mod error;
pub mod logging;
pub mod observable;

pub use config::{AuthConfig, AuthConfigBuilder, ConcurrencyPolicy};
pub use error::{Error, Result};
pub use observable::{Observable, ReadOnlyObservable, Subscription};
