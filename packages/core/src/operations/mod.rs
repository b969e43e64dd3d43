//! Structural Tree Operations
//!
//! The five editing operations on a [`MapDocument`]: add child, add sibling,
//! rename, delete subtree, and move/reorder. Each operation takes the current
//! document by reference and returns a [`MutationOutcome`] carrying a
//! brand-new document — the input is never mutated, which is what makes
//! history snapshots safe to take.
//!
//! # Invalid input is a no-op
//!
//! None of these operations returns an error. Malformed input (missing node,
//! empty title, self-parenting or cyclic move) yields `changed = false` with
//! the document passed through untouched. An interactive editor races user
//! input against state updates constantly; treating an operation on a node
//! that just disappeared as an error would surface noise, not bugs.
//!
//! # Ordering
//!
//! Sibling order is materialized in each node's `order` field. Add operations
//! append (`order = current child count`); `move_node` renumbers the affected
//! sibling lists 0..n-1 so ranks stay dense.

use crate::models::{MapDocument, MapNode, DEFAULT_NODE_TITLE};
use std::collections::HashMap;

/// Result of a structural operation.
///
/// `changed = false` means the input was invalid and `document` is an
/// untouched copy of the input. Callers decide whether to push history or
/// notify the sync pipeline based on this flag.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// The resulting document (a new value, never the input mutated)
    pub document: MapDocument,

    /// Id of the node created by add operations
    pub new_node_id: Option<String>,

    /// Ids removed by delete (the node plus its full descendant closure);
    /// callers prune view state (selection, collapsed set) with these
    pub removed_ids: Vec<String>,

    /// Whether the operation changed the document
    pub changed: bool,
}

impl MutationOutcome {
    fn unchanged(document: &MapDocument) -> Self {
        Self {
            document: document.clone(),
            new_node_id: None,
            removed_ids: Vec::new(),
            changed: false,
        }
    }

    fn changed(document: MapDocument) -> Self {
        Self {
            document,
            new_node_id: None,
            removed_ids: Vec::new(),
            changed: true,
        }
    }
}

/// Create a new node under `parent_id`, appended to the end of its children.
///
/// No-op if `parent_id` does not exist. The new node gets a fresh UUID, the
/// default title, and `order = existing direct child count`.
pub fn add_child(doc: &MapDocument, parent_id: &str) -> MutationOutcome {
    if !doc.contains(parent_id) {
        tracing::debug!(parent_id, "add_child ignored: parent not found");
        return MutationOutcome::unchanged(doc);
    }

    let order = doc.child_count(parent_id) as i64;
    let node = MapNode::new(DEFAULT_NODE_TITLE, Some(parent_id.to_string()), order);
    let new_id = node.id.clone();

    let mut next = doc.clone();
    next.nodes.push(node);
    next.touch();

    let mut outcome = MutationOutcome::changed(next);
    outcome.new_node_id = Some(new_id);
    outcome
}

/// Create a new node sharing `node_id`'s parent.
///
/// No-op if `node_id` is the root or absent. The sibling is appended to the
/// end of the parent's child list, not inserted adjacent to `node_id` — a
/// documented behavior of this editor, kept deliberately.
pub fn add_sibling(doc: &MapDocument, node_id: &str) -> MutationOutcome {
    let parent_id = match doc.node(node_id).and_then(|n| n.parent_id.clone()) {
        Some(parent_id) => parent_id,
        None => {
            tracing::debug!(node_id, "add_sibling ignored: node is root or missing");
            return MutationOutcome::unchanged(doc);
        }
    };

    add_child(doc, &parent_id)
}

/// Replace `node_id`'s title with the trimmed `title`.
///
/// No-op if the node is absent or the title is empty after trimming
/// whitespace. Only the `title` field changes.
pub fn rename_node(doc: &MapDocument, node_id: &str, title: &str) -> MutationOutcome {
    let trimmed = title.trim();
    if trimmed.is_empty() || !doc.contains(node_id) {
        tracing::debug!(node_id, "rename ignored: missing node or empty title");
        return MutationOutcome::unchanged(doc);
    }

    let mut next = doc.clone();
    for node in &mut next.nodes {
        if node.id == node_id {
            node.title = trimmed.to_string();
        }
    }
    next.touch();

    MutationOutcome::changed(next)
}

/// Remove `node_id` and its full descendant closure.
///
/// No-op if `node_id` is the root or absent. Edges are left untouched even
/// when an endpoint was removed; they are opaque to the editing core.
pub fn delete_node(doc: &MapDocument, node_id: &str) -> MutationOutcome {
    match doc.node(node_id) {
        Some(node) if !node.is_root() => {}
        _ => {
            tracing::debug!(node_id, "delete ignored: node is root or missing");
            return MutationOutcome::unchanged(doc);
        }
    }

    let mut removed = doc.descendant_ids(node_id);
    removed.insert(node_id.to_string());

    let mut next = doc.clone();
    next.nodes.retain(|n| !removed.contains(&n.id));
    next.touch();

    let mut outcome = MutationOutcome::changed(next);
    outcome.removed_ids = removed.into_iter().collect();
    outcome
}

/// Reparent `node_id` under `next_parent_id`, inserted at `next_index` among
/// its new siblings.
///
/// No-op when `node_id` is the root or absent, when `next_parent_id` does not
/// exist, or when the move would create a cycle (`next_parent_id` is the node
/// itself or any of its descendants). `next_index` is clamped to
/// `0..=sibling_count`.
///
/// After the move both affected sibling lists are renumbered 0..n-1 in their
/// presentation order (one pass when old and new parent coincide).
pub fn move_node(
    doc: &MapDocument,
    node_id: &str,
    next_parent_id: &str,
    next_index: usize,
) -> MutationOutcome {
    let old_parent_id = match doc.node(node_id).and_then(|n| n.parent_id.clone()) {
        Some(parent_id) => parent_id,
        None => {
            tracing::debug!(node_id, "move ignored: node is root or missing");
            return MutationOutcome::unchanged(doc);
        }
    };

    if !doc.contains(next_parent_id) {
        tracing::debug!(node_id, next_parent_id, "move ignored: target parent missing");
        return MutationOutcome::unchanged(doc);
    }

    if next_parent_id == node_id || doc.descendant_ids(node_id).contains(next_parent_id) {
        tracing::debug!(node_id, next_parent_id, "move ignored: would create a cycle");
        return MutationOutcome::unchanged(doc);
    }

    // New sibling list in presentation order, without the moving node, with
    // the moving node spliced in at the clamped index.
    let mut new_siblings: Vec<String> = doc
        .children_of(next_parent_id)
        .iter()
        .map(|n| n.id.clone())
        .filter(|id| id != node_id)
        .collect();
    let index = next_index.min(new_siblings.len());
    new_siblings.insert(index, node_id.to_string());

    let mut orders: HashMap<String, i64> = new_siblings
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i as i64))
        .collect();

    // Renumber the old parent's remaining children unless it is the same
    // list we just built.
    if old_parent_id != next_parent_id {
        let remaining: Vec<(String, i64)> = doc
            .children_of(&old_parent_id)
            .iter()
            .map(|n| n.id.clone())
            .filter(|id| id != node_id)
            .enumerate()
            .map(|(i, id)| (id, i as i64))
            .collect();
        orders.extend(remaining);
    }

    let mut next = doc.clone();
    for node in &mut next.nodes {
        if node.id == node_id {
            node.parent_id = Some(next_parent_id.to_string());
        }
        if let Some(order) = orders.get(&node.id) {
            node.order = *order;
        }
    }
    next.touch();

    MutationOutcome::changed(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MapDocument, ROOT_NODE_ID};
    use std::collections::HashSet;

    /// Reachability invariant: every node must be reachable from the root.
    fn assert_no_orphans(doc: &MapDocument) {
        let root_id = doc.root().expect("root must exist").id.clone();
        let mut reachable = doc.descendant_ids(&root_id);
        reachable.insert(root_id);
        assert_eq!(reachable.len(), doc.nodes.len(), "orphaned nodes detected");
    }

    fn child_ids(doc: &MapDocument, parent_id: &str) -> Vec<String> {
        doc.children_of(parent_id)
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }

    #[test]
    fn test_add_child_appends() {
        let doc = MapDocument::new("Map");

        let first = add_child(&doc, ROOT_NODE_ID);
        assert!(first.changed);
        let n1 = first.new_node_id.clone().unwrap();
        assert_eq!(first.document.node(&n1).unwrap().order, 0);

        let second = add_child(&first.document, ROOT_NODE_ID);
        let n2 = second.new_node_id.clone().unwrap();
        assert_eq!(second.document.node(&n2).unwrap().order, 1);

        assert_no_orphans(&second.document);
    }

    #[test]
    fn test_add_child_missing_parent_is_noop() {
        let doc = MapDocument::new("Map");
        let outcome = add_child(&doc, "no-such-node");

        assert!(!outcome.changed);
        assert!(outcome.new_node_id.is_none());
        assert_eq!(outcome.document, doc);
    }

    #[test]
    fn test_add_sibling_appends_to_parent() {
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();
        let b = add_child(&a.document, ROOT_NODE_ID);

        // Sibling of the first child lands at the end, not adjacent.
        let sibling = add_sibling(&b.document, &a_id);
        assert!(sibling.changed);
        let s_id = sibling.new_node_id.clone().unwrap();
        let node = sibling.document.node(&s_id).unwrap();
        assert_eq!(node.parent_id.as_deref(), Some(ROOT_NODE_ID));
        assert_eq!(node.order, 2);
        assert_no_orphans(&sibling.document);
    }

    #[test]
    fn test_add_sibling_of_root_is_noop() {
        let doc = MapDocument::new("Map");
        let outcome = add_sibling(&doc, ROOT_NODE_ID);

        assert!(!outcome.changed);
        assert_eq!(outcome.document.nodes.len(), 1);
    }

    #[test]
    fn test_rename_trims_whitespace() {
        let doc = MapDocument::new("Map");
        let child = add_child(&doc, ROOT_NODE_ID);
        let id = child.new_node_id.clone().unwrap();

        let renamed = rename_node(&child.document, &id, "  Trimmed title  ");
        assert!(renamed.changed);
        assert_eq!(renamed.document.node(&id).unwrap().title, "Trimmed title");
    }

    #[test]
    fn test_rename_empty_title_is_noop() {
        let doc = MapDocument::new("Map");
        let child = add_child(&doc, ROOT_NODE_ID);
        let id = child.new_node_id.clone().unwrap();

        let outcome = rename_node(&child.document, &id, "   ");
        assert!(!outcome.changed);
        assert_eq!(outcome.document, child.document);
    }

    #[test]
    fn test_rename_missing_node_is_noop() {
        let doc = MapDocument::new("Map");
        let outcome = rename_node(&doc, "ghost", "Title");

        assert!(!outcome.changed);
    }

    #[test]
    fn test_delete_removes_exact_subtree() {
        // root -> A -> B, root -> C
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();
        let b = add_child(&a.document, &a_id);
        let b_id = b.new_node_id.clone().unwrap();
        let c = add_child(&b.document, ROOT_NODE_ID);
        let c_id = c.new_node_id.clone().unwrap();

        let before = c.document.nodes.len();
        let deleted = delete_node(&c.document, &a_id);

        assert!(deleted.changed);
        assert_eq!(deleted.document.nodes.len(), before - 2);
        assert!(!deleted.document.contains(&a_id));
        assert!(!deleted.document.contains(&b_id));
        assert!(deleted.document.contains(&c_id));

        let removed: HashSet<&str> = deleted.removed_ids.iter().map(String::as_str).collect();
        assert_eq!(removed, HashSet::from([a_id.as_str(), b_id.as_str()]));
        assert_no_orphans(&deleted.document);
    }

    #[test]
    fn test_delete_root_is_noop() {
        let doc = MapDocument::new("Map");
        let outcome = delete_node(&doc, ROOT_NODE_ID);

        assert!(!outcome.changed);
        assert_eq!(outcome.document.nodes.len(), 1);
    }

    #[test]
    fn test_move_to_front_renumbers() {
        // Root with children N1, N2; moving N2 to index 0 yields [N2, N1].
        let doc = MapDocument::new("Map");
        let first = add_child(&doc, ROOT_NODE_ID);
        let n1 = first.new_node_id.clone().unwrap();
        let second = add_child(&first.document, ROOT_NODE_ID);
        let n2 = second.new_node_id.clone().unwrap();

        let moved = move_node(&second.document, &n2, ROOT_NODE_ID, 0);
        assert!(moved.changed);
        assert_eq!(child_ids(&moved.document, ROOT_NODE_ID), vec![n2.clone(), n1.clone()]);
        assert_eq!(moved.document.node(&n2).unwrap().order, 0);
        assert_eq!(moved.document.node(&n1).unwrap().order, 1);
        assert_no_orphans(&moved.document);
    }

    #[test]
    fn test_move_reparents_and_renumbers_both_lists() {
        // root -> [A, B, C]; move B under A.
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();
        let b = add_child(&a.document, ROOT_NODE_ID);
        let b_id = b.new_node_id.clone().unwrap();
        let c = add_child(&b.document, ROOT_NODE_ID);
        let c_id = c.new_node_id.clone().unwrap();

        let moved = move_node(&c.document, &b_id, &a_id, 0);
        assert!(moved.changed);

        assert_eq!(
            moved.document.node(&b_id).unwrap().parent_id.as_deref(),
            Some(a_id.as_str())
        );
        assert_eq!(moved.document.node(&b_id).unwrap().order, 0);

        // Old parent's remaining children renumbered densely.
        assert_eq!(child_ids(&moved.document, ROOT_NODE_ID), vec![a_id, c_id.clone()]);
        assert_eq!(moved.document.node(&c_id).unwrap().order, 1);
        assert_no_orphans(&moved.document);
    }

    #[test]
    fn test_move_clamps_index() {
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();
        let b = add_child(&a.document, ROOT_NODE_ID);
        let b_id = b.new_node_id.clone().unwrap();

        let moved = move_node(&b.document, &a_id, ROOT_NODE_ID, 99);
        assert!(moved.changed);
        assert_eq!(child_ids(&moved.document, ROOT_NODE_ID), vec![b_id, a_id]);
    }

    #[test]
    fn test_move_under_self_is_noop() {
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();

        let outcome = move_node(&a.document, &a_id, &a_id, 0);
        assert!(!outcome.changed);
        assert_eq!(outcome.document, a.document);
    }

    #[test]
    fn test_move_under_descendant_is_noop() {
        // root -> A -> B; moving A under B must be rejected.
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();
        let b = add_child(&a.document, &a_id);
        let b_id = b.new_node_id.clone().unwrap();

        let outcome = move_node(&b.document, &a_id, &b_id, 0);
        assert!(!outcome.changed);
        assert_eq!(outcome.document, b.document);
        assert_no_orphans(&outcome.document);
    }

    #[test]
    fn test_move_root_is_noop() {
        let doc = MapDocument::new("Map");
        let a = add_child(&doc, ROOT_NODE_ID);
        let a_id = a.new_node_id.clone().unwrap();

        let outcome = move_node(&a.document, ROOT_NODE_ID, &a_id, 0);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_operations_do_not_mutate_input() {
        let doc = MapDocument::new("Map");
        let snapshot = doc.clone();

        let _ = add_child(&doc, ROOT_NODE_ID);
        let _ = add_sibling(&doc, ROOT_NODE_ID);
        let _ = rename_node(&doc, ROOT_NODE_ID, "Other");
        let _ = delete_node(&doc, ROOT_NODE_ID);
        let _ = move_node(&doc, ROOT_NODE_ID, ROOT_NODE_ID, 0);

        assert_eq!(doc, snapshot);
    }

    #[test]
    fn test_invariant_holds_across_operation_sequence() {
        let mut doc = MapDocument::new("Map");
        let mut last_id = ROOT_NODE_ID.to_string();

        for i in 0..10 {
            let outcome = if i % 3 == 0 {
                add_child(&doc, ROOT_NODE_ID)
            } else {
                add_child(&doc, &last_id)
            };
            if let Some(id) = &outcome.new_node_id {
                last_id = id.clone();
            }
            doc = outcome.document;
            assert_no_orphans(&doc);
        }

        let deleted = delete_node(&doc, &last_id);
        assert_no_orphans(&deleted.document);
    }
}
