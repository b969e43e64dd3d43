//! Autosave synchronization pipeline.

pub mod engine;
pub mod signature;

pub use engine::{SyncConfig, SyncEngine, SyncStatus, SyncTarget, DEFAULT_DEBOUNCE};
pub use signature::content_signature;
