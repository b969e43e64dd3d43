//! Map Editor Facade
//!
//! `MapEditor` is the surface a presentation layer renders and drives: the
//! current document, selection, collapsed subtrees, and undo/redo, with every
//! structural mutation routed through [`crate::operations`] and recorded in
//! the [`HistoryManager`].
//!
//! Document changes are announced over a broadcast channel so the sync
//! pipeline (or anything else) can observe the editor without coupling to it;
//! see [`crate::sync::SyncEngine::attach_editor`].
//!
//! # View state
//!
//! Selection and the collapsed set are editor-local view state, never
//! persisted. Two pruning rules keep them consistent with the document:
//! deleting a subtree removes its ids from the collapsed set and resets the
//! selection to the root, and undo/redo clears the collapsed set entirely
//! (expand/collapse does not participate in time travel).

use crate::models::{MapDocument, SnapshotSource};
use crate::operations;
use crate::services::history::HistoryManager;
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Broadcast capacity for editor events.
///
/// Keystroke-level edits arrive one at a time; 64 gives bursty consumers
/// headroom, and a lagged consumer only needs the latest document anyway.
const EDITOR_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events announced by the editor.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// The document was replaced by an editing operation, undo/redo, or an
    /// import. Carries the new current document.
    DocumentChanged(MapDocument),
}

/// Interactive editing surface over one mindmap document.
pub struct MapEditor {
    document: MapDocument,
    selection: Option<String>,
    collapsed: HashSet<String>,
    history: HistoryManager,
    events: broadcast::Sender<EditorEvent>,
}

impl MapEditor {
    /// Open an editor over `document`.
    ///
    /// The document is normalized first (root guaranteed, orphans
    /// reattached), and history is seeded with the normalized state so undo
    /// can always return to it.
    pub fn new(document: MapDocument) -> Self {
        let document = document.normalized();
        let history = HistoryManager::new(&document, SnapshotSource::Import);
        let (events, _) = broadcast::channel(EDITOR_EVENT_CHANNEL_CAPACITY);
        Self {
            document,
            selection: None,
            collapsed: HashSet::new(),
            history,
            events,
        }
    }

    /// The current document.
    pub fn document(&self) -> &MapDocument {
        &self.document
    }

    /// Currently selected node id, if any.
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Ids of subtrees hidden in presentation.
    pub fn collapsed(&self) -> &HashSet<String> {
        &self.collapsed
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub fn history_position(&self) -> usize {
        self.history.position()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Subscribe to document-changed events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Create a child under `parent_id`; selection moves to the new node.
    /// Returns the new node's id, or `None` when the parent does not exist.
    pub fn add_child(&mut self, parent_id: &str) -> Option<String> {
        let outcome = operations::add_child(&self.document, parent_id);
        if !outcome.changed {
            return None;
        }
        let new_id = outcome.new_node_id.clone();
        self.selection = new_id.clone();
        self.commit(outcome.document);
        new_id
    }

    /// Create a sibling of `node_id`; selection moves to the new node.
    pub fn add_sibling(&mut self, node_id: &str) -> Option<String> {
        let outcome = operations::add_sibling(&self.document, node_id);
        if !outcome.changed {
            return None;
        }
        let new_id = outcome.new_node_id.clone();
        self.selection = new_id.clone();
        self.commit(outcome.document);
        new_id
    }

    /// Rename `node_id`. Returns whether the document changed.
    pub fn rename(&mut self, node_id: &str, title: &str) -> bool {
        let outcome = operations::rename_node(&self.document, node_id, title);
        if outcome.changed {
            self.commit(outcome.document);
        }
        outcome.changed
    }

    /// Delete `node_id` and its subtree. Selection resets to the root and
    /// removed ids are pruned from the collapsed set.
    pub fn delete(&mut self, node_id: &str) -> bool {
        let outcome = operations::delete_node(&self.document, node_id);
        if !outcome.changed {
            return false;
        }
        for removed in &outcome.removed_ids {
            self.collapsed.remove(removed);
        }
        self.selection = outcome.document.root().map(|r| r.id.clone());
        self.commit(outcome.document);
        true
    }

    /// Move `node_id` under `next_parent_id` at `next_index`.
    pub fn move_node(&mut self, node_id: &str, next_parent_id: &str, next_index: usize) -> bool {
        let outcome = operations::move_node(&self.document, node_id, next_parent_id, next_index);
        if outcome.changed {
            self.commit(outcome.document);
        }
        outcome.changed
    }

    /// Step history back one entry. Clears the collapsed set; selection is
    /// left for the presentation layer to re-resolve.
    pub fn undo(&mut self) -> bool {
        let restored = match self.history.undo() {
            Some(snapshot) => snapshot.restore_into(&self.document),
            None => return false,
        };
        self.collapsed.clear();
        self.document = restored;
        self.emit();
        true
    }

    /// Step history forward one entry. Clears the collapsed set.
    pub fn redo(&mut self) -> bool {
        let restored = match self.history.redo() {
            Some(snapshot) => snapshot.restore_into(&self.document),
            None => return false,
        };
        self.collapsed.clear();
        self.document = restored;
        self.emit();
        true
    }

    /// Replace the current document wholesale (e.g. after a remote load).
    ///
    /// The incoming document is normalized, history restarts from it, and
    /// all view state is dropped.
    pub fn import_document(&mut self, document: MapDocument) {
        let document = document.normalized();
        tracing::info!(document_id = %document.id, "document imported");
        self.history = HistoryManager::new(&document, SnapshotSource::Import);
        self.collapsed.clear();
        self.selection = None;
        self.document = document;
        self.emit();
    }

    /// Toggle a subtree's collapsed marker. Unknown ids are ignored.
    pub fn toggle_collapse(&mut self, node_id: &str) {
        if !self.document.contains(node_id) {
            return;
        }
        if !self.collapsed.remove(node_id) {
            self.collapsed.insert(node_id.to_string());
        }
    }

    /// Select the parent of the current selection.
    pub fn select_parent(&mut self) {
        match self.selected_node_parent() {
            Some(parent_id) => self.selection = Some(parent_id),
            None => self.select_root(),
        }
    }

    /// Select the first child of the current selection.
    pub fn select_first_child(&mut self) {
        let Some(current) = self.current_or_root() else {
            return;
        };
        if let Some(first) = self.document.children_of(&current).first() {
            self.selection = Some(first.id.clone());
        }
    }

    /// Select the next sibling (presentation order) of the current selection.
    pub fn select_next_sibling(&mut self) {
        self.select_sibling(1);
    }

    /// Select the previous sibling of the current selection.
    pub fn select_prev_sibling(&mut self) {
        self.select_sibling(-1);
    }

    fn select_sibling(&mut self, offset: isize) {
        let Some(current) = self.current_or_root() else {
            return;
        };
        let Some(parent_id) = self
            .document
            .node(&current)
            .and_then(|n| n.parent_id.clone())
        else {
            return; // root has no siblings
        };

        let siblings = self.document.children_of(&parent_id);
        let Some(position) = siblings.iter().position(|n| n.id == current) else {
            return;
        };
        let next = position as isize + offset;
        if next >= 0 && (next as usize) < siblings.len() {
            self.selection = Some(siblings[next as usize].id.clone());
        }
    }

    /// Resolve the current selection, falling back to selecting the root.
    fn current_or_root(&mut self) -> Option<String> {
        match &self.selection {
            Some(id) if self.document.contains(id) => Some(id.clone()),
            _ => {
                self.select_root();
                self.selection.clone()
            }
        }
    }

    fn select_root(&mut self) {
        self.selection = self.document.root().map(|r| r.id.clone());
    }

    fn selected_node_parent(&self) -> Option<String> {
        self.selection
            .as_ref()
            .and_then(|id| self.document.node(id))
            .and_then(|n| n.parent_id.clone())
    }

    /// Adopt a changed document, record it in history, and announce it.
    fn commit(&mut self, document: MapDocument) {
        self.document = document;
        self.history.push(&self.document, SnapshotSource::Manual);
        self.emit();
    }

    fn emit(&self) {
        // No receivers is fine; the editor works standalone.
        let _ = self
            .events
            .send(EditorEvent::DocumentChanged(self.document.clone()));
    }
}
