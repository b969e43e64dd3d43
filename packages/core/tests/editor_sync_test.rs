//! End-to-end editing + autosave tests
//!
//! Drives a real `MapEditor` wired to a `SyncEngine` over the in-memory
//! store, the way a presentation layer would: mutations flow through the
//! editor's event channel into the sync pipeline, and assertions read the
//! store back through the `DocumentStore` trait.

use anyhow::Result;
use maploom_core::{
    ConnectionState, DocumentStore, MapEditor, MemoryStore, SessionHandle, SyncConfig, SyncEngine,
    SyncStatus, SyncTarget,
};
use std::sync::Arc;
use tokio::time::{timeout, Duration};

const WAIT: Duration = Duration::from_secs(2);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("maploom_core=debug")),
        )
        .with_test_writer()
        .try_init();
}

struct Harness {
    store: Arc<MemoryStore>,
    editor: MapEditor,
    engine: SyncEngine<MemoryStore>,
    target: SyncTarget,
}

/// Build a store with one container/sheet, load it, and wire an editor to a
/// sync engine through the editor's event channel.
async fn harness() -> Result<Harness> {
    init_logging();

    let store = Arc::new(MemoryStore::new());
    let container = store.create_container("My Maps", "Sheet1").await?;
    let loaded = store.load_document(&container.id, "Sheet1").await?;

    let session = SessionHandle::new(ConnectionState::Authorized);
    let engine = SyncEngine::new(
        Arc::clone(&store),
        session,
        SyncConfig {
            debounce: Duration::from_millis(20),
        },
    );

    let target = SyncTarget {
        container_id: container.id.clone(),
        sheet_title: "Sheet1".to_string(),
    };
    engine.adopt_loaded(target.clone(), &loaded);

    let editor = MapEditor::new(loaded.document);
    engine.attach_editor(editor.subscribe());

    Ok(Harness {
        store,
        editor,
        engine,
        target,
    })
}

async fn wait_for_saves(store: &MemoryStore, wanted: u64) -> Result<()> {
    timeout(WAIT, async {
        while store.save_count() < wanted {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn test_edit_flows_through_to_store() -> Result<()> {
    let mut h = harness().await?;

    let child = h.editor.add_child("root").expect("child created");
    h.editor.rename(&child, "Groceries");

    wait_for_saves(&h.store, 1).await?;
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Rapid edits within one debounce window coalesce into one save.
    assert_eq!(h.store.save_count(), 1);

    let reloaded = h
        .store
        .load_document(&h.target.container_id, &h.target.sheet_title)
        .await?;
    assert_eq!(reloaded.document.node(&child).unwrap().title, "Groceries");
    assert_eq!(h.engine.status(), SyncStatus::Synced);
    Ok(())
}

#[tokio::test]
async fn test_undo_after_save_writes_previous_state_back() -> Result<()> {
    let mut h = harness().await?;

    let child = h.editor.add_child("root").expect("child created");
    wait_for_saves(&h.store, 1).await?;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(h.editor.undo());
    wait_for_saves(&h.store, 2).await?;
    tokio::time::sleep(Duration::from_millis(80)).await;

    let reloaded = h
        .store
        .load_document(&h.target.container_id, &h.target.sheet_title)
        .await?;
    assert!(!reloaded.document.contains(&child));
    assert_eq!(reloaded.document.nodes.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_conflict_requires_explicit_reload() -> Result<()> {
    let mut h = harness().await?;
    let mut status = h.engine.subscribe_status();

    // Another tab wins the race for the shared remote copy.
    let theirs = {
        let mut other = MapEditor::new(
            h.store
                .load_document(&h.target.container_id, &h.target.sheet_title)
                .await?
                .document,
        );
        other.add_child("root");
        other.document().clone()
    };
    h.store
        .overwrite_document(&h.target.container_id, &h.target.sheet_title, theirs)
        .await?;

    // Our edit now saves against a stale token and must conflict.
    h.editor.add_child("root");
    timeout(WAIT, status.wait_for(|s| *s == SyncStatus::Conflict)).await??;
    assert!(h.engine.is_conflict());

    // Editing while suspended issues no further saves.
    h.editor.add_child("root");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.store.save_count(), 1);

    // Explicit reload: re-import the remote copy and re-baseline the engine.
    let reloaded = h
        .store
        .load_document(&h.target.container_id, &h.target.sheet_title)
        .await?;
    h.editor.import_document(reloaded.document.clone());
    h.engine.adopt_loaded(h.target.clone(), &reloaded);
    assert!(!h.engine.is_conflict());

    // The pipeline works again.
    let child = h.editor.add_child("root").expect("child created");
    wait_for_saves(&h.store, 2).await?;
    tokio::time::sleep(Duration::from_millis(80)).await;

    let latest = h
        .store
        .load_document(&h.target.container_id, &h.target.sheet_title)
        .await?;
    assert!(latest.document.contains(&child));
    // The other tab's node survived: nothing was clobbered.
    assert_eq!(latest.document.nodes.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_sign_out_stops_autosave() -> Result<()> {
    init_logging();

    let store = Arc::new(MemoryStore::new());
    let container = store.create_container("My Maps", "Sheet1").await?;
    let loaded = store.load_document(&container.id, "Sheet1").await?;

    let session = SessionHandle::new(ConnectionState::Authorized);
    let engine = SyncEngine::new(
        Arc::clone(&store),
        session.clone(),
        SyncConfig {
            debounce: Duration::from_millis(20),
        },
    );
    engine.adopt_loaded(
        SyncTarget {
            container_id: container.id.clone(),
            sheet_title: "Sheet1".to_string(),
        },
        &loaded,
    );

    let mut editor = MapEditor::new(loaded.document);
    engine.attach_editor(editor.subscribe());

    session.transition(ConnectionState::Unauthorized);
    engine.reset();

    // Local editing still works; nothing reaches the store.
    editor.add_child("root").expect("local edit works");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(store.save_count(), 0);
    assert_eq!(engine.status(), SyncStatus::Idle);
    assert_eq!(editor.document().nodes.len(), 2);
    Ok(())
}
