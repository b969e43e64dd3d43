//! Mindmap Document
//!
//! `MapDocument` is the unit of editing and persistence: a flat set of nodes
//! forming a tree through `parent_id`, plus opaque auxiliary edges and
//! metadata. Documents are value types — every structural operation (see
//! [`crate::operations`]) returns a brand-new document rather than mutating in
//! place, which makes history snapshots safe to take by cloning.
//!
//! # Invariants
//!
//! - Node ids are unique within a document.
//! - Exactly one node has `parent_id = None` (the root); every other node's
//!   `parent_id` references a node in the same document.
//! - No cycles: the set of nodes reachable from the root equals the full node
//!   set. Structural operations preserve this; imported content is repaired by
//!   [`MapDocument::normalized`].

use crate::models::node::{MapEdge, MapNode, ValidationError, ROOT_NODE_ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// The full tree (nodes + edges + metadata) being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    /// Document identifier (assigned by the store)
    pub id: String,

    /// Document title (the sheet title in the remote store)
    pub title: String,

    /// All nodes; tree structure encoded through `parent_id`
    pub nodes: Vec<MapNode>,

    /// Auxiliary non-tree relations, preserved opaquely
    pub edges: Vec<MapEdge>,

    /// Last local modification time; refreshed by every structural operation
    pub updated_at: DateTime<Utc>,
}

impl MapDocument {
    /// Create an empty document containing only a root node.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.clone(),
            nodes: vec![MapNode::root(title)],
            edges: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Whether a node with the given id exists.
    pub fn contains(&self, node_id: &str) -> bool {
        self.node(node_id).is_some()
    }

    /// The document root node.
    ///
    /// Returns `None` only for un-normalized imported content; documents
    /// produced by [`MapDocument::new`] or [`MapDocument::normalized`] always
    /// have a root.
    pub fn root(&self) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.is_root())
    }

    /// Direct children of `parent_id` in presentation order.
    ///
    /// Ordering convention used everywhere siblings are listed: `order`
    /// ascending, ties broken by `title` ascending (byte-wise string compare;
    /// deterministic, but two equally-ranked siblings can swap position from
    /// a rename alone).
    pub fn children_of(&self, parent_id: &str) -> Vec<&MapNode> {
        let mut children: Vec<&MapNode> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .collect();
        children.sort_by(|a, b| match a.order.cmp(&b.order) {
            Ordering::Equal => a.title.cmp(&b.title),
            other => other,
        });
        children
    }

    /// Number of direct children of `parent_id`.
    pub fn child_count(&self, parent_id: &str) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .count()
    }

    /// The full descendant closure of `node_id`, excluding `node_id` itself.
    ///
    /// BFS over the `parent_id` relation. Used by delete (subtree removal)
    /// and move (cycle prevention).
    pub fn descendant_ids(&self, node_id: &str) -> HashSet<String> {
        let mut result = HashSet::new();
        let mut queue = VecDeque::from([node_id.to_string()]);

        while let Some(current) = queue.pop_front() {
            for node in &self.nodes {
                if node.parent_id.as_deref() == Some(current.as_str())
                    && result.insert(node.id.clone())
                {
                    queue.push_back(node.id.clone());
                }
            }
        }

        result
    }

    /// Validate document-level invariants.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` on duplicate ids, a missing root, or a
    /// non-root node whose parent is absent from the document.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            node.validate()?;
            if !seen.insert(node.id.as_str()) {
                return Err(ValidationError::DuplicateId(node.id.clone()));
            }
        }

        if self.root().is_none() {
            return Err(ValidationError::MissingField("root node".to_string()));
        }

        for node in &self.nodes {
            if let Some(parent_id) = &node.parent_id {
                if !seen.contains(parent_id.as_str()) {
                    return Err(ValidationError::InvalidParent(format!(
                        "node '{}' references missing parent '{}'",
                        node.id, parent_id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Repair an imported document so the tree invariants hold.
    ///
    /// - Synthesizes a root node when none exists (conventional `"root"` id,
    ///   reusing the document title).
    /// - Reattaches nodes with dangling parents, and any node unreachable
    ///   from the root, directly under the root at the end of its children.
    /// - Keeps extra roots' subtrees by demoting the extra roots to children
    ///   of the first root.
    ///
    /// Edges are passed through untouched even when they reference unknown
    /// nodes; they are opaque to the editing core.
    pub fn normalized(&self) -> MapDocument {
        let mut doc = self.clone();

        if doc.root().is_none() {
            tracing::debug!(document_id = %doc.id, "synthesizing missing root during import");
            doc.nodes.insert(0, MapNode::root(doc.title.clone()));
        }

        let root_id = doc
            .root()
            .map(|r| r.id.clone())
            .unwrap_or_else(|| ROOT_NODE_ID.to_string());

        // Demote any additional roots under the first one.
        for node in &mut doc.nodes {
            if node.parent_id.is_none() && node.id != root_id {
                node.parent_id = Some(root_id.clone());
            }
        }

        // Reattach dangling parents and unreachable nodes (cycles among
        // non-root nodes are unreachable from the root and land here too).
        let ids: HashSet<String> = doc.nodes.iter().map(|n| n.id.clone()).collect();
        for node in &mut doc.nodes {
            if let Some(parent_id) = &node.parent_id {
                if !ids.contains(parent_id) {
                    node.parent_id = Some(root_id.clone());
                }
            }
        }

        let mut reachable = doc.descendant_ids(&root_id);
        reachable.insert(root_id.clone());
        let mut next_order = doc.child_count(&root_id) as i64;
        for node in &mut doc.nodes {
            if !reachable.contains(&node.id) {
                node.parent_id = Some(root_id.clone());
                node.order = next_order;
                next_order += 1;
            }
        }

        doc
    }

    /// Refresh the modification timestamp. Called by every structural
    /// operation that actually changes the document.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
