//! Remote Store Adapter
//!
//! Abstract contract for the remote tabular document store backing a mindmap
//! document. The concrete backend (an authenticated HTTP API over
//! spreadsheet-like containers) is an external collaborator; the core depends
//! only on this trait and its optimistic-concurrency metadata.
//!
//! # Concurrency contract
//!
//! The remote store is shared mutable state: another client or tab may write
//! to it at any time. Every load and save reports an opaque [`VersionToken`]
//! reflecting the remote document's last-written state. A save carrying an
//! `expected` token fails with [`StoreError::Conflict`] when the store's
//! current token no longer matches — losing that race is an expected,
//! handled outcome, not a bug.

pub mod memory;

use crate::models::MapDocument;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;

/// Opaque marker of a remote document's last-written state.
///
/// Only equality is meaningful; callers must not parse or order tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Store operation errors.
///
/// [`StoreError::Conflict`] is the one variant the sync engine treats
/// specially; everything else surfaces as a generic sync error.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Remote version token diverged from the expected one
    #[error("Version conflict saving '{title}' in container {container_id}")]
    Conflict { container_id: String, title: String },

    /// Container or document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The session is not permitted to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transport-level failure (network, HTTP)
    #[error("Store I/O failed: {0}")]
    Io(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a conflict error
    pub fn conflict(container_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Conflict {
            container_id: container_id.into(),
            title: title.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Whether this error is a version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// A document container (one spreadsheet on the remote side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    /// Remote last-modified marker, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// A document (one sheet) within a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
}

/// A loaded document together with the version token observed at load time.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: MapDocument,
    pub version: VersionToken,
}

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SaveReceipt {
    /// The store's token after this write; becomes the caller's new baseline
    pub version: VersionToken,
}

/// The load/save contract the editing core consumes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List available document containers.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, StoreError>;

    /// Create a container seeded with one empty document.
    async fn create_container(
        &self,
        name: &str,
        initial_document_title: &str,
    ) -> Result<ContainerSummary, StoreError>;

    /// List documents within a container.
    async fn list_documents(&self, container_id: &str) -> Result<Vec<DocumentSummary>, StoreError>;

    /// Create an empty document within a container.
    async fn create_document(
        &self,
        container_id: &str,
        title: &str,
    ) -> Result<DocumentSummary, StoreError>;

    /// Load a document and the version token reflecting remote state at load
    /// time.
    async fn load_document(
        &self,
        container_id: &str,
        title: &str,
    ) -> Result<LoadedDocument, StoreError>;

    /// Save a document.
    ///
    /// When `expected` is provided and does not match the store's current
    /// token, fails with [`StoreError::Conflict`] and leaves the remote copy
    /// untouched.
    async fn save_document(
        &self,
        container_id: &str,
        title: &str,
        document: &MapDocument,
        expected: Option<&VersionToken>,
    ) -> Result<SaveReceipt, StoreError>;
}
