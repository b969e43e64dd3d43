//! Autosave / Sync Engine
//!
//! Keeps the remote store's copy of the active document converging toward the
//! local edited state without losing concurrent remote edits, while batching
//! keystroke-level changes and letting the user keep typing during an
//! in-flight save.
//!
//! # State machine
//!
//! The pipeline is an explicit `SavePhase` machine rather than a pile of
//! boolean flags:
//!
//! ```text
//! Idle --change--> Debouncing --timer--> Saving --settle--> Idle
//!                      ^  |                 |
//!                      |  +--change (restart timer)
//!                      +-------------- queued change re-triggers
//! ```
//!
//! A monotonic `generation` counter is the only cancellation primitive:
//! switching documents, signing out, or reloading bumps it, and any in-flight
//! save whose captured generation no longer matches on completion is
//! discarded wholesale (the network call itself is never aborted).
//!
//! # Conflict discipline
//!
//! Saves carry the version token observed at the last load or save. When the
//! store rejects the token, the engine flags a conflict, drops any queued
//! save, and suspends the pipeline until the user explicitly reloads — never
//! an automatic retry, so the losing side of the race cannot clobber the
//! winning side's edits.

use crate::models::MapDocument;
use crate::services::editor::EditorEvent;
use crate::session::SessionHandle;
use crate::store::{DocumentStore, LoadedDocument, SaveReceipt, StoreError, VersionToken};
use crate::sync::signature::content_signature;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Default quiescence window before an edit is written out.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Sync pipeline configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long the document must stay unchanged before a save is issued
    pub debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Externally visible pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No document targeted, or pipeline reset
    Idle,
    /// A save is in flight
    Saving,
    /// Local state is durably saved
    Synced,
    /// Remote diverged; suspended until an explicit reload
    Conflict,
    /// Last save failed with a non-conflict error
    Error,
}

/// Which remote document the pipeline writes to (one spreadsheet + sheet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub container_id: String,
    pub sheet_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavePhase {
    Idle,
    Debouncing,
    Saving,
}

#[derive(Debug)]
struct EngineState {
    phase: SavePhase,
    /// A change arrived while a save was in flight
    queued: bool,
    conflict: bool,
    /// Bumped on every pipeline invalidation; stale completions are dropped
    generation: u64,
    /// Bumped on every debounce restart; a fired timer with a stale epoch
    /// belongs to a superseded change and does nothing
    debounce_epoch: u64,
    /// Signature of the last state known to be durably saved
    last_saved_signature: Option<String>,
    /// Version token from the last successful load or save
    baseline: Option<VersionToken>,
    target: Option<SyncTarget>,
    /// Most recent changed document, consumed by the timer or the re-trigger
    pending: Option<MapDocument>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            phase: SavePhase::Idle,
            queued: false,
            conflict: false,
            generation: 0,
            debounce_epoch: 0,
            last_saved_signature: None,
            baseline: None,
            target: None,
            pending: None,
        }
    }

    /// Invalidate everything scoped to the current target/generation.
    fn invalidate(&mut self) {
        self.generation += 1;
        self.debounce_epoch += 1;
        self.phase = SavePhase::Idle;
        self.queued = false;
        self.conflict = false;
        self.pending = None;
    }
}

struct EngineInner<S> {
    store: Arc<S>,
    session: SessionHandle,
    config: SyncConfig,
    state: Mutex<EngineState>,
    status: watch::Sender<SyncStatus>,
}

/// Debounced, coalescing, conflict-aware autosave pipeline.
///
/// Cloning is cheap and shares the pipeline; spawned tasks hold clones.
pub struct SyncEngine<S> {
    inner: Arc<EngineInner<S>>,
}

impl<S> Clone for SyncEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DocumentStore + 'static> SyncEngine<S> {
    pub fn new(store: Arc<S>, session: SessionHandle, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            inner: Arc::new(EngineInner {
                store,
                session,
                config,
                state: Mutex::new(EngineState::new()),
                status,
            }),
        }
    }

    /// Current pipeline status.
    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    /// Subscribe to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Whether the pipeline is suspended on a conflict.
    pub fn is_conflict(&self) -> bool {
        self.lock_state().conflict
    }

    /// Signature of the last state known to be durably saved (diagnostics
    /// and tests).
    pub fn last_saved_signature(&self) -> Option<String> {
        self.lock_state().last_saved_signature.clone()
    }

    /// Adopt a freshly loaded document as the sync baseline.
    ///
    /// Invalidates the pipeline (any in-flight save becomes stale), then
    /// seeds the saved-signature and version baseline from the load so
    /// unmodified remote content does not trigger a spurious save.
    pub fn adopt_loaded(&self, target: SyncTarget, loaded: &LoadedDocument) {
        let mut state = self.lock_state();
        state.invalidate();
        state.last_saved_signature = Some(content_signature(
            &loaded.document,
            &target.sheet_title,
        ));
        state.baseline = Some(loaded.version.clone());
        tracing::info!(
            container_id = %target.container_id,
            sheet_title = %target.sheet_title,
            generation = state.generation,
            "sync baseline adopted from load"
        );
        state.target = Some(target);
        drop(state);
        self.publish(SyncStatus::Synced);
    }

    /// Tear the pipeline down (document closed or user signed out).
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.invalidate();
        state.target = None;
        state.last_saved_signature = None;
        state.baseline = None;
        tracing::info!(generation = state.generation, "sync pipeline reset");
        drop(state);
        self.publish(SyncStatus::Idle);
    }

    /// Notify the pipeline that the document changed.
    ///
    /// Idempotent per content signature: calling this repeatedly with the
    /// same state issues at most one save. Must run inside a tokio runtime
    /// (the debounce timer is a spawned task).
    pub fn document_changed(&self, document: &MapDocument) {
        if !self.inner.session.is_editable() {
            tracing::debug!("change ignored: session not authorized");
            return;
        }

        let mut state = self.lock_state();
        let target = match &state.target {
            Some(target) => target.clone(),
            None => {
                tracing::debug!("change ignored: no sync target selected");
                return;
            }
        };

        if state.conflict {
            tracing::debug!("change ignored: pipeline suspended on conflict");
            return;
        }

        let signature = content_signature(document, &target.sheet_title);
        if state.last_saved_signature.as_deref() == Some(signature.as_str()) {
            match state.phase {
                SavePhase::Debouncing => {
                    // The user edited back to the saved state (e.g. undo)
                    // before the timer fired; the armed save carries the
                    // superseded intermediate state. Cancel it.
                    state.debounce_epoch += 1;
                    state.pending = None;
                    state.phase = SavePhase::Idle;
                    tracing::debug!("pending save cancelled: content returned to saved state");
                }
                SavePhase::Saving => {
                    // The in-flight save carries superseded content; queue
                    // the current state so settle writes it back.
                    state.queued = true;
                    state.pending = Some(document.clone());
                    tracing::debug!("change queued behind in-flight save");
                }
                SavePhase::Idle => {
                    tracing::debug!("change ignored: content matches last saved state");
                }
            }
            return;
        }

        if state.phase == SavePhase::Saving {
            // Do not start a second concurrent save; remember the latest
            // document and re-trigger once the in-flight call settles.
            state.queued = true;
            state.pending = Some(document.clone());
            tracing::debug!("change queued behind in-flight save");
            return;
        }

        // (Re)start the debounce window; a previously scheduled timer sees a
        // stale epoch when it fires and does nothing.
        state.phase = SavePhase::Debouncing;
        state.pending = Some(document.clone());
        state.debounce_epoch += 1;
        let epoch = state.debounce_epoch;
        let generation = state.generation;
        drop(state);

        let engine = self.clone();
        tokio::spawn(async move {
            engine.debounce_then_save(epoch, generation).await;
        });
    }

    /// Forward a [`crate::services::MapEditor`]'s document-changed events into
    /// the pipeline.
    pub fn attach_editor(&self, mut events: broadcast::Receiver<EditorEvent>) {
        let engine = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(EditorEvent::DocumentChanged(document)) => {
                        engine.document_changed(&document);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Only the latest document matters; lag is harmless.
                        tracing::debug!(skipped, "editor event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    async fn debounce_then_save(&self, epoch: u64, generation: u64) {
        tokio::time::sleep(self.inner.config.debounce).await;

        let (document, signature, target, baseline) = {
            let mut state = self.lock_state();
            if state.generation != generation
                || state.debounce_epoch != epoch
                || state.phase != SavePhase::Debouncing
            {
                tracing::debug!(epoch, generation, "debounce timer superseded");
                return;
            }

            let document = match state.pending.take() {
                Some(document) => document,
                None => {
                    state.phase = SavePhase::Idle;
                    return;
                }
            };
            let target = match state.target.clone() {
                Some(target) => target,
                None => {
                    state.phase = SavePhase::Idle;
                    return;
                }
            };

            // Superseded content is normally cancelled at arrival time;
            // re-verify here in case the baseline moved while the timer
            // was armed.
            let signature = content_signature(&document, &target.sheet_title);
            if state.last_saved_signature.as_deref() == Some(signature.as_str()) {
                state.phase = SavePhase::Idle;
                return;
            }

            state.phase = SavePhase::Saving;
            state.queued = false;
            (document, signature, target, state.baseline.clone())
        };

        self.publish(SyncStatus::Saving);
        tracing::debug!(
            container_id = %target.container_id,
            sheet_title = %target.sheet_title,
            "issuing save"
        );

        let result = self
            .inner
            .store
            .save_document(
                &target.container_id,
                &target.sheet_title,
                &document,
                baseline.as_ref(),
            )
            .await;

        self.settle(generation, signature, result);
    }

    /// Classify a finished save and re-trigger a queued change if safe.
    fn settle(
        &self,
        generation: u64,
        signature: String,
        result: Result<SaveReceipt, StoreError>,
    ) {
        let mut state = self.lock_state();

        if state.generation != generation {
            // The pipeline moved on (document switch, sign-out, reload);
            // whatever this save did no longer concerns us.
            tracing::debug!(generation, current = state.generation, "stale save completion dropped");
            return;
        }

        state.phase = SavePhase::Idle;

        let status = match result {
            Ok(receipt) => {
                state.last_saved_signature = Some(signature);
                state.baseline = Some(receipt.version);
                state.conflict = false;
                tracing::debug!("save succeeded");
                SyncStatus::Synced
            }
            Err(err) if err.is_conflict() => {
                state.conflict = true;
                state.queued = false;
                state.pending = None;
                tracing::warn!(%err, "save rejected: remote diverged, awaiting explicit reload");
                SyncStatus::Conflict
            }
            Err(err) => {
                // Local edits and history are untouched; the next edit
                // naturally re-attempts the pipeline.
                tracing::warn!(%err, "save failed");
                SyncStatus::Error
            }
        };

        let requeued = if state.queued && !state.conflict {
            state.queued = false;
            state.pending.take()
        } else {
            None
        };
        drop(state);

        self.publish(status);

        if let Some(document) = requeued {
            tracing::debug!("re-triggering queued change after settle");
            self.document_changed(&document);
        }
    }

    fn publish(&self, status: SyncStatus) {
        self.inner.status.send_replace(status);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        // Lock poisoning cannot happen: no code path panics while holding it.
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
