//! In-Memory Document Store
//!
//! Reference implementation of [`DocumentStore`] with faithful
//! optimistic-concurrency semantics: every write advances a monotonic version
//! counter per document, and saves with a stale expected token fail with
//! [`StoreError::Conflict`].
//!
//! Used as the local backend and throughout the test suite, where
//! [`MemoryStore::overwrite_document`] stands in for another client writing
//! to the remote copy out-of-band.

use crate::models::MapDocument;
use crate::store::{
    ContainerSummary, DocumentStore, DocumentSummary, LoadedDocument, SaveReceipt, StoreError,
    VersionToken,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredDocument {
    document: MapDocument,
    version: u64,
}

#[derive(Debug, Default)]
struct Container {
    name: String,
    // Documents keyed by title; the remote store addresses sheets by title.
    documents: HashMap<String, StoredDocument>,
}

/// In-memory [`DocumentStore`] with monotonic version tokens.
#[derive(Debug, Default)]
pub struct MemoryStore {
    containers: Mutex<HashMap<String, Container>>,
    version_counter: AtomicU64,
    save_count: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> u64 {
        self.version_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn token(version: u64) -> VersionToken {
        VersionToken::new(format!("v{version}"))
    }

    /// Number of `save_document` calls that reached this store, including
    /// rejected ones. Tests assert on this to verify debounce coalescing.
    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Replace a document's content out-of-band, advancing its version
    /// without any expected-token check.
    ///
    /// Simulates another client or tab writing to the shared remote copy;
    /// a subsequent guarded save from this session must then conflict.
    pub async fn overwrite_document(
        &self,
        container_id: &str,
        title: &str,
        document: MapDocument,
    ) -> Result<VersionToken, StoreError> {
        let version = self.next_version();
        let mut containers = self.containers.lock().await;
        let container = containers
            .get_mut(container_id)
            .ok_or_else(|| StoreError::not_found(format!("container {container_id}")))?;
        let stored = container
            .documents
            .get_mut(title)
            .ok_or_else(|| StoreError::not_found(format!("document '{title}'")))?;
        stored.document = document;
        stored.version = version;
        tracing::debug!(container_id, title, version, "out-of-band overwrite");
        Ok(Self::token(version))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, StoreError> {
        let containers = self.containers.lock().await;
        let mut result: Vec<ContainerSummary> = containers
            .iter()
            .map(|(id, c)| ContainerSummary {
                id: id.clone(),
                name: c.name.clone(),
                last_modified: c
                    .documents
                    .values()
                    .map(|d| d.version)
                    .max()
                    .map(|v| Self::token(v).as_str().to_string()),
            })
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn create_container(
        &self,
        name: &str,
        initial_document_title: &str,
    ) -> Result<ContainerSummary, StoreError> {
        let id = Uuid::new_v4().to_string();
        let version = self.next_version();

        let mut container = Container {
            name: name.to_string(),
            documents: HashMap::new(),
        };
        let document = MapDocument::new(initial_document_title);
        container
            .documents
            .insert(initial_document_title.to_string(), StoredDocument { document, version });

        self.containers.lock().await.insert(id.clone(), container);
        tracing::info!(container_id = %id, name, "container created");

        Ok(ContainerSummary {
            id,
            name: name.to_string(),
            last_modified: Some(Self::token(version).as_str().to_string()),
        })
    }

    async fn list_documents(&self, container_id: &str) -> Result<Vec<DocumentSummary>, StoreError> {
        let containers = self.containers.lock().await;
        let container = containers
            .get(container_id)
            .ok_or_else(|| StoreError::not_found(format!("container {container_id}")))?;

        let mut result: Vec<DocumentSummary> = container
            .documents
            .iter()
            .map(|(title, stored)| DocumentSummary {
                id: stored.document.id.clone(),
                title: title.clone(),
            })
            .collect();
        result.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(result)
    }

    async fn create_document(
        &self,
        container_id: &str,
        title: &str,
    ) -> Result<DocumentSummary, StoreError> {
        let version = self.next_version();
        let mut containers = self.containers.lock().await;
        let container = containers
            .get_mut(container_id)
            .ok_or_else(|| StoreError::not_found(format!("container {container_id}")))?;

        if container.documents.contains_key(title) {
            return Err(StoreError::Io(format!("document '{title}' already exists")));
        }

        let document = MapDocument::new(title);
        let id = document.id.clone();
        container
            .documents
            .insert(title.to_string(), StoredDocument { document, version });

        Ok(DocumentSummary {
            id,
            title: title.to_string(),
        })
    }

    async fn load_document(
        &self,
        container_id: &str,
        title: &str,
    ) -> Result<LoadedDocument, StoreError> {
        let containers = self.containers.lock().await;
        let container = containers
            .get(container_id)
            .ok_or_else(|| StoreError::not_found(format!("container {container_id}")))?;
        let stored = container
            .documents
            .get(title)
            .ok_or_else(|| StoreError::not_found(format!("document '{title}'")))?;

        Ok(LoadedDocument {
            document: stored.document.clone(),
            version: Self::token(stored.version),
        })
    }

    async fn save_document(
        &self,
        container_id: &str,
        title: &str,
        document: &MapDocument,
        expected: Option<&VersionToken>,
    ) -> Result<SaveReceipt, StoreError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);

        let mut containers = self.containers.lock().await;
        let container = containers
            .get_mut(container_id)
            .ok_or_else(|| StoreError::not_found(format!("container {container_id}")))?;
        let stored = container
            .documents
            .get_mut(title)
            .ok_or_else(|| StoreError::not_found(format!("document '{title}'")))?;

        if let Some(expected) = expected {
            let current = Self::token(stored.version);
            if expected != &current {
                tracing::warn!(
                    container_id,
                    title,
                    expected = expected.as_str(),
                    current = current.as_str(),
                    "save rejected: version conflict"
                );
                return Err(StoreError::conflict(container_id, title));
            }
        }

        let version = self.version_counter.fetch_add(1, Ordering::SeqCst) + 1;
        stored.document = document.clone();
        stored.version = version;
        tracing::debug!(container_id, title, version, "document saved");

        Ok(SaveReceipt {
            version: Self::token(version),
        })
    }
}
