//! History Manager
//!
//! Classic linear undo/redo over immutable [`Snapshot`]s. The entries up to
//! and including the current index are "past incl. present"; anything after
//! the index is the redone-away future, truncated as soon as a new state is
//! pushed.
//!
//! The manager stores content only. Restoring hands back the snapshot; the
//! editor decides how to merge it into the live document (identity fields are
//! kept from the live side, see [`Snapshot::restore_into`]).

use crate::models::{MapDocument, Snapshot, SnapshotSource};

/// Linear undo/redo stack of document snapshots.
#[derive(Debug, Default)]
pub struct HistoryManager {
    entries: Vec<Snapshot>,
    index: usize,
}

impl HistoryManager {
    /// Create a history seeded with the initial document state.
    ///
    /// The seed snapshot is the floor of the stack: `undo` never goes past it,
    /// so the document can always return to its loaded state.
    pub fn new(initial: &MapDocument, source: SnapshotSource) -> Self {
        Self {
            entries: vec![Snapshot::capture(initial, source)],
            index: 0,
        }
    }

    /// Record a new present state, truncating any redo tail.
    pub fn push(&mut self, document: &MapDocument, source: SnapshotSource) {
        self.entries.truncate(self.index + 1);
        self.entries.push(Snapshot::capture(document, source));
        self.index = self.entries.len() - 1;
        tracing::debug!(depth = self.entries.len(), index = self.index, "history push");
    }

    /// Step back one entry. Returns the snapshot to restore, or `None` at the
    /// bottom of the stack.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    /// Step forward one entry. Returns the snapshot to restore, or `None` at
    /// the tail.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }

    /// Number of recorded snapshots.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Index of the current snapshot (0-based).
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MapNode, ROOT_NODE_ID};
    use crate::operations::add_child;

    fn seeded() -> (HistoryManager, MapDocument) {
        let doc = MapDocument::new("History");
        let history = HistoryManager::new(&doc, SnapshotSource::Import);
        (history, doc)
    }

    #[test]
    fn test_undo_at_floor_is_noop() {
        let (mut history, _doc) = seeded();

        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.position(), 0);
    }

    #[test]
    fn test_push_then_undo_restores_previous_content() {
        let (mut history, doc) = seeded();
        let edited = add_child(&doc, ROOT_NODE_ID).document;
        history.push(&edited, SnapshotSource::Manual);

        assert_eq!(history.depth(), 2);
        assert!(history.can_undo());

        let snapshot = history.undo().expect("one step back available");
        assert_eq!(snapshot.nodes, doc.nodes);
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_redo_round_trip() {
        let (mut history, doc) = seeded();
        let edited = add_child(&doc, ROOT_NODE_ID).document;
        history.push(&edited, SnapshotSource::Manual);

        history.undo().unwrap();
        let redone = history.redo().expect("redo available");

        assert_eq!(redone.nodes, edited.nodes);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_redo_at_tail_is_noop() {
        let (mut history, _doc) = seeded();
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let (mut history, doc) = seeded();
        let first = add_child(&doc, ROOT_NODE_ID).document;
        history.push(&first, SnapshotSource::Manual);
        let second = add_child(&first, ROOT_NODE_ID).document;
        history.push(&second, SnapshotSource::Manual);

        history.undo().unwrap();
        history.undo().unwrap();
        assert_eq!(history.position(), 0);

        // A new edit from the past wipes the redone-away future.
        let divergent = add_child(&doc, ROOT_NODE_ID).document;
        history.push(&divergent, SnapshotSource::Manual);

        assert_eq!(history.depth(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.position(), 1);
    }

    #[test]
    fn test_undo_restores_unordered_node_set() {
        // undo(apply(D, O)) must restore D's node set, compared as a set.
        let (mut history, mut doc) = seeded();
        doc.nodes.push(MapNode::new("Extra", Some(ROOT_NODE_ID.to_string()), 0));
        let before = doc.clone();
        history.push(&doc, SnapshotSource::Manual);

        let edited = add_child(&doc, ROOT_NODE_ID).document;
        history.push(&edited, SnapshotSource::Manual);

        let restored = history.undo().unwrap();
        let mut expected: Vec<&str> = before.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut actual: Vec<&str> = restored.nodes.iter().map(|n| n.id.as_str()).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(expected, actual);
    }
}
