//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop hosts have no platform identity SDK to wrap, so this crate ships
//! an in-process [`InMemoryIdentityProvider`]. It honours the full provider
//! contract and is what the `desktop-shims` feature injects when no provider
//! is configured.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::InMemoryIdentityProvider;
//! use core_runtime::config::AuthConfig;
//! use std::sync::Arc;
//!
//! let provider = InMemoryIdentityProvider::new().with_account("ada@example.com", "secret1");
//! let config = AuthConfig::builder()
//!     .identity_provider(Arc::new(provider))
//!     .build()?;
//! ```

mod identity;

pub use identity::{InMemoryIdentityProvider, MIN_PASSWORD_LENGTH};
