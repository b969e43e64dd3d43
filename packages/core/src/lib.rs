//! MapLoom Editing Core
//!
//! This crate provides the editing core of the MapLoom mindmap editor: an
//! in-memory tree document model with undo/redo history, structural mutation
//! operations, and a conflict-aware autosave engine that reconciles local
//! edits against a remote document store which may change out-of-band.
//!
//! # Architecture
//!
//! - **Immutable documents**: every structural operation returns a new
//!   [`models::MapDocument`]; the previous value is never mutated, making
//!   history snapshots cheap and safe.
//! - **No-op on invalid input**: the tree model never errors; malformed
//!   operations pass the document through unchanged.
//! - **Optimistic concurrency**: saves carry the version token from the last
//!   load/save and fail with a distinguishable conflict when the remote copy
//!   diverged. Losing that race is handled, not exceptional.
//! - **Explicit state machine**: the autosave pipeline is a debounce/save
//!   phase machine with a monotonic generation counter for
//!   cancellation-by-staleness.
//!
//! # Modules
//!
//! - [`models`] - Data structures (MapNode, MapDocument, Snapshot)
//! - [`operations`] - Pure structural tree operations
//! - [`services`] - MapEditor facade and HistoryManager
//! - [`store`] - Remote store adapter contract and in-memory store
//! - [`sync`] - Debounced, conflict-aware autosave engine
//! - [`session`] - Injectable authorization state machine

pub mod models;
pub mod operations;
pub mod services;
pub mod session;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use models::{MapDocument, MapEdge, MapNode, Snapshot, SnapshotSource};
pub use services::{EditorEvent, HistoryManager, MapEditor};
pub use session::{ConnectionState, SessionHandle};
pub use store::{
    ContainerSummary, DocumentStore, DocumentSummary, LoadedDocument, MemoryStore, SaveReceipt,
    StoreError, VersionToken,
};
pub use sync::{SyncConfig, SyncEngine, SyncStatus, SyncTarget};
