//! Connection / Session State
//!
//! Authorization status gating editability. The OAuth flow itself is an
//! external collaborator; the core only consumes the resulting state machine
//! (idle → authorized → unauthorized) through an explicit, injectable handle
//! rather than ambient globals, so the sync engine can be tested with fakes.
//!
//! State is published over a `tokio::sync::watch` channel: the owner of the
//! session (the auth layer) transitions it, and any number of consumers read
//! the current value or await changes.

use tokio::sync::watch;

/// Authorization state of the editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No sign-in attempt yet
    Idle,
    /// Signed in; writes are permitted
    Authorized,
    /// Signed out or rejected; writes are gated off
    Unauthorized,
}

/// Injectable handle to the session state machine.
///
/// Cloning shares the underlying channel; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: watch::Sender<ConnectionState>,
}

impl SessionHandle {
    /// Create a session in the given initial state.
    pub fn new(initial: ConnectionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Whether edits may currently be written to the remote store.
    pub fn is_editable(&self) -> bool {
        self.state() == ConnectionState::Authorized
    }

    /// Transition the state machine. Observers holding a subscription are
    /// notified asynchronously.
    pub fn transition(&self, next: ConnectionState) {
        if *self.tx.borrow() != next {
            tracing::info!(?next, "session state transition");
            // send_replace never fails; the sender keeps the channel alive.
            self.tx.send_replace(next);
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new(ConnectionState::Idle)
    }
}
