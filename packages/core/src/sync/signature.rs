//! Content Signatures
//!
//! A signature is a deterministic fingerprint of a document's
//! identity-relevant fields, used by the sync engine to detect "nothing to
//! save". Volatile fields (`updated_at`, the document's store-assigned id)
//! are excluded so that re-renders and restored snapshots with identical
//! content produce identical signatures.
//!
//! The signature is the canonical JSON string itself rather than a hash:
//! equality comparison is all the engine needs, and keeping it readable makes
//! sync bugs diagnosable from logs.

use crate::models::MapDocument;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeIdentity<'a> {
    id: &'a str,
    title: &'a str,
    parent_id: Option<&'a str>,
    order: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeIdentity<'a> {
    id: &'a str,
    from: &'a str,
    to: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentIdentity<'a> {
    sheet_title: &'a str,
    nodes: Vec<NodeIdentity<'a>>,
    edges: Vec<EdgeIdentity<'a>>,
}

/// Compute the content signature of `document` with `sheet_title` fixed in.
///
/// Nodes and edges are projected onto their identity fields and sorted by id,
/// so the signature is independent of array order.
pub fn content_signature(document: &MapDocument, sheet_title: &str) -> String {
    let mut nodes: Vec<NodeIdentity<'_>> = document
        .nodes
        .iter()
        .map(|n| NodeIdentity {
            id: &n.id,
            title: &n.title,
            parent_id: n.parent_id.as_deref(),
            order: n.order,
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(b.id));

    let mut edges: Vec<EdgeIdentity<'_>> = document
        .edges
        .iter()
        .map(|e| EdgeIdentity {
            id: &e.id,
            from: &e.from_node_id,
            to: &e.to_node_id,
        })
        .collect();
    edges.sort_by(|a, b| a.id.cmp(b.id));

    let identity = DocumentIdentity {
        sheet_title,
        nodes,
        edges,
    };

    // Struct serialization cannot fail: no maps with non-string keys,
    // no non-finite floats.
    serde_json::to_string(&identity).unwrap_or_default()
}
