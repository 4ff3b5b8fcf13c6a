//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-metadata`). Host applications can
//! depend on `gallery-workspace` and enable the documented features without
//! needing to wire each crate individually.

#[cfg(feature = "native-shims")]
pub use core_service as service;

#[cfg(feature = "metadata")]
pub use core_metadata as metadata;
