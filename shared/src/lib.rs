//! Shared types and models for the Shamba yield dashboard
//!
//! This crate contains the domain model, the estimation engine and the
//! key-value storage contract shared between the native services and the
//! browser build (via WASM). Nothing in here depends on an async runtime.

pub mod estimation;
pub mod models;
pub mod storage;
pub mod types;
pub mod validation;

pub use estimation::{EstimationError, EstimationThresholds};
pub use models::*;
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageKey};
pub use types::*;
pub use validation::*;
