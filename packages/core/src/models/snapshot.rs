//! History Snapshots
//!
//! Immutable point-in-time copies of a document's content, owned exclusively
//! by the [`crate::services::HistoryManager`]. A snapshot captures the node
//! and edge arrays; the live document's `id` and `title` are deliberately not
//! restored from snapshots (undo/redo travels through content, not identity).

use crate::models::document::MapDocument;
use crate::models::node::{MapEdge, MapNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What caused a snapshot to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotSource {
    /// A structural editing operation
    Manual,
    /// Wholesale document import (e.g. after a remote load)
    Import,
    /// Recorded by the sync pipeline
    Sync,
}

/// An immutable point-in-time copy of document content. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Snapshot identifier
    pub id: String,

    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,

    /// Node array at capture time
    pub nodes: Vec<MapNode>,

    /// Edge array at capture time
    pub edges: Vec<MapEdge>,

    /// What recorded this snapshot
    pub source: SnapshotSource,
}

impl Snapshot {
    /// Capture the content of `document`.
    pub fn capture(document: &MapDocument, source: SnapshotSource) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            nodes: document.nodes.clone(),
            edges: document.edges.clone(),
            source,
        }
    }

    /// Produce a copy of `live` carrying this snapshot's content.
    ///
    /// The live document keeps its own `id` and `title`; only `nodes` and
    /// `edges` are replaced. `updated_at` is refreshed because restoring is a
    /// local modification from the sync engine's point of view.
    pub fn restore_into(&self, live: &MapDocument) -> MapDocument {
        let mut doc = live.clone();
        doc.nodes = self.nodes.clone();
        doc.edges = self.edges.clone();
        doc.touch();
        doc
    }
}
