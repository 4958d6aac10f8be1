//! Shared workflow state: the single active-selection slot and the
//! acknowledgment gate that belongs to it.
//!
//! Every component holds a [`Session`] handle. Acquiring a selection bumps the
//! generation, cancels the previous render and clears the gate, so results
//! carrying an older [`Selection`] can be recognized and dropped.

use crate::models::DocumentId;
use crate::workflow::acknowledgment::AckState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub current: Option<DocumentId>,
    pub generation: u64,
}

/// Checkbox-then-submit precondition. Submit is enabled exactly when the box is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcknowledgmentGate {
    acknowledged_checkbox: bool,
}

impl AcknowledgmentGate {
    pub fn acknowledged_checkbox(&self) -> bool {
        self.acknowledged_checkbox
    }

    pub fn submit_enabled(&self) -> bool {
        self.acknowledged_checkbox
    }

    pub(crate) fn set(&mut self, checked: bool) {
        self.acknowledged_checkbox = checked;
    }
}

/// Ticket for one acquisition of the selection slot.
#[derive(Debug, Clone)]
pub struct Selection {
    pub id: DocumentId,
    pub generation: u64,
    cancel: CancellationToken,
}

impl Selection {
    /// Cancelled as soon as this selection is released or superseded.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[derive(Debug)]
pub struct SessionState {
    pub selection: SelectionState,
    pub gate: AcknowledgmentGate,
    pub ack_state: AckState,
    pub last_ack_error: Option<String>,
    /// Set once the selected document's detail has loaded.
    pub preview_open: bool,
    render_token: CancellationToken,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            selection: SelectionState::default(),
            gate: AcknowledgmentGate::default(),
            ack_state: AckState::Unset,
            last_ack_error: None,
            preview_open: false,
            render_token: CancellationToken::new(),
        }
    }
}

impl SessionState {
    pub fn is_current(&self, selection: &Selection) -> bool {
        self.selection.generation == selection.generation
            && self.selection.current == Some(selection.id)
    }

    pub fn current_selection(&self) -> Option<Selection> {
        self.selection.current.map(|id| Selection {
            id,
            generation: self.selection.generation,
            cancel: self.render_token.clone(),
        })
    }

    pub(crate) fn reset_gate(&mut self) {
        self.gate = AcknowledgmentGate::default();
        self.ack_state = AckState::Unset;
        self.last_ack_error = None;
    }

    fn release(&mut self, next: Option<DocumentId>) {
        self.render_token.cancel();
        self.render_token = CancellationToken::new();
        self.selection.generation += 1;
        self.selection.current = next;
        self.preview_open = false;
        self.reset_gate();
    }
}

/// Read-only copy of the session for display and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub selection: SelectionState,
    pub gate: AcknowledgmentGate,
    pub ack_state: AckState,
    pub last_ack_error: Option<String>,
    pub preview_open: bool,
}

#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access. Never call across an `.await`.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Acquire the slot for `id`, releasing whatever was selected before.
    pub fn select(&self, id: DocumentId) -> Selection {
        let mut state = self.lock();
        state.release(Some(id));
        tracing::debug!(
            document_id = id,
            generation = state.selection.generation,
            "Selection acquired"
        );
        Selection {
            id,
            generation: state.selection.generation,
            cancel: state.render_token.clone(),
        }
    }

    pub fn is_current(&self, selection: &Selection) -> bool {
        self.lock().is_current(selection)
    }

    pub fn current(&self) -> Option<DocumentId> {
        self.lock().selection.current
    }

    pub fn current_selection(&self) -> Option<Selection> {
        self.lock().current_selection()
    }

    /// Mark the selection's detail as loaded: clears the gate and opens the
    /// preview. Returns false for a superseded selection.
    pub fn activate(&self, selection: &Selection) -> bool {
        let mut state = self.lock();
        if !state.is_current(selection) {
            return false;
        }
        state.reset_gate();
        state.preview_open = true;
        true
    }

    /// Close the preview: cancel the render, drop the selection, clear the gate.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.selection.current.is_some() || state.preview_open {
            tracing::debug!(
                document_id = ?state.selection.current,
                "Preview closed"
            );
        }
        state.release(None);
    }

    /// Close only if `selection` still owns the slot.
    pub fn close_if_current(&self, selection: &Selection) -> bool {
        let mut state = self.lock();
        if !state.is_current(selection) {
            return false;
        }
        state.release(None);
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            selection: state.selection,
            gate: state.gate,
            ack_state: state.ack_state,
            last_ack_error: state.last_ack_error.clone(),
            preview_open: state.preview_open,
        }
    }
}
