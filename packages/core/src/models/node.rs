//! Node and Edge Data Structures
//!
//! This module defines the `MapNode` and `MapEdge` structs that make up a
//! mindmap document's content.
//!
//! # Architecture
//!
//! - **Tree by reference**: hierarchy is encoded through `parent_id`, never
//!   through nested child vectors, so a document stays a flat table of rows
//!   (the remote store persists it as typed records).
//! - **Root convention**: exactly one node per document has `parent_id = None`
//!   and conventionally `id = "root"`. The root is never deletable.
//! - **Sibling rank**: `order` establishes sibling position; ties are broken
//!   by title comparison (see `MapDocument::children_of`).
//!
//! # Examples
//!
//! ```rust
//! use maploom_core::models::MapNode;
//!
//! let root = MapNode::root("My Map");
//! let child = MapNode::new("First topic", Some(root.id.clone()), 0);
//! assert_eq!(child.parent_id.as_deref(), Some("root"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Conventional id of the document root node.
pub const ROOT_NODE_ID: &str = "root";

/// Title given to freshly created nodes before the user renames them.
pub const DEFAULT_NODE_TITLE: &str = "New topic";

/// Validation errors for node structures
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Duplicate node id: {0}")]
    DuplicateId(String),
}

/// One mindmap topic.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID string for created nodes, `"root"` for the
///   document root)
/// - `title`: Display text of the topic
/// - `parent_id`: Reference to the parent node; `None` only for the root
/// - `order`: Sibling rank (0-based); renumbered by move operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapNode {
    /// Unique identifier within the document
    pub id: String,

    /// Display title of the topic
    pub title: String,

    /// Parent node id; `None` marks the document root
    pub parent_id: Option<String>,

    /// Sibling rank, 0-based; ties broken by title comparison
    pub order: i64,
}

impl MapNode {
    /// Create a new node with an auto-generated UUID.
    pub fn new(title: impl Into<String>, parent_id: Option<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            parent_id,
            order,
        }
    }

    /// Create a root node with the conventional `"root"` id.
    pub fn root(title: impl Into<String>) -> Self {
        Self {
            id: ROOT_NODE_ID.to_string(),
            title: title.into(),
            parent_id: None,
            order: 0,
        }
    }

    /// Whether this node is a document root (`parent_id` is `None`).
    ///
    /// This is the only correct root check; do not compare against the
    /// `"root"` id, which is a convention rather than a guarantee for
    /// imported documents before normalization.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Validate the node's own fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `id` is empty or the node references
    /// itself as its parent. Document-level checks (dangling parents,
    /// duplicate ids) live on `MapDocument`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if let Some(parent_id) = &self.parent_id {
            if parent_id == &self.id {
                return Err(ValidationError::InvalidParent(
                    "Node cannot be its own parent".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// An auxiliary non-tree relation between two nodes.
///
/// Edges are persisted alongside the primary parent/child tree but no editing
/// operation reads or writes them; they round-trip opaquely through load/save
/// so other tooling can attach cross-links to a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEdge {
    /// Unique identifier within the document
    pub id: String,

    /// Source node id
    pub from_node_id: String,

    /// Target node id
    pub to_node_id: String,
}

impl MapEdge {
    /// Create a new edge with an auto-generated UUID.
    pub fn new(from_node_id: impl Into<String>, to_node_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from_node_id: from_node_id.into(),
            to_node_id: to_node_id.into(),
        }
    }
}
