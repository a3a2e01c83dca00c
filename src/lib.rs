//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (currently `core-service` and, through it, the desktop
//! identity provider). Host applications can depend on
//! `auth-bridge-workspace` and enable the documented features without needing
//! to wire each crate individually.

#[cfg(feature = "core")]
pub use core_service::*;
