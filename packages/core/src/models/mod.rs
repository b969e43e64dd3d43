//! Data structures for mindmap documents.

pub mod document;
pub mod node;
pub mod snapshot;

pub use document::MapDocument;
pub use node::{MapEdge, MapNode, ValidationError, DEFAULT_NODE_TITLE, ROOT_NODE_ID};
pub use snapshot::{Snapshot, SnapshotSource};
