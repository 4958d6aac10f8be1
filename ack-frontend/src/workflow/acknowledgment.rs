use crate::error::{AcknowledgeError, GateError};
use crate::services::DocumentApi;
use crate::workflow::session::{AcknowledgmentGate, Session};
use crate::workflow::store::DocumentStore;
use std::sync::Arc;

/// Acknowledge-gate state for the active selection.
///
/// `Unset -> Checked -> Submitting -> Done`. A failed submit goes back to
/// `Checked` with the box still ticked; the failure is kept in
/// [`AcknowledgmentController::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    Unset,
    Checked,
    Submitting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Acknowledged; the store was reloaded and the preview closed.
    Done,
    /// Acknowledged, but the preview had already moved on. Only the store was reloaded.
    Detached,
}

pub struct AcknowledgmentController {
    api: Arc<dyn DocumentApi>,
    session: Session,
    store: DocumentStore,
}

impl AcknowledgmentController {
    pub fn new(api: Arc<dyn DocumentApi>, session: Session, store: DocumentStore) -> Self {
        Self {
            api,
            session,
            store,
        }
    }

    pub fn state(&self) -> AckState {
        self.session.snapshot().ack_state
    }

    pub fn gate(&self) -> AcknowledgmentGate {
        self.session.snapshot().gate
    }

    /// Message of the most recent failed submit, cleared by `reset`.
    pub fn last_error(&self) -> Option<String> {
        self.session.snapshot().last_ack_error
    }

    pub fn toggle_checked(&self, value: bool) -> Result<(), GateError> {
        self.session.with(|state| {
            if state.selection.current.is_none() {
                return Err(GateError::NoSelection);
            }
            match state.ack_state {
                AckState::Unset | AckState::Checked => {
                    state.gate.set(value);
                    state.ack_state = if value {
                        AckState::Checked
                    } else {
                        AckState::Unset
                    };
                    Ok(())
                }
                other => Err(GateError::InvalidState(other)),
            }
        })
    }

    /// Send the acknowledgment for the open document.
    ///
    /// Completion effects apply only if the same selection is still open when
    /// the response arrives.
    pub async fn submit(&self) -> Result<SubmitOutcome, AcknowledgeError> {
        let selection = self.session.with(|state| {
            let selection = state.current_selection().ok_or(GateError::NoSelection)?;
            if !state.preview_open {
                return Err(GateError::NoSelection);
            }
            if !state.gate.submit_enabled() {
                return Err(GateError::NotChecked);
            }
            if state.ack_state != AckState::Checked {
                return Err(GateError::InvalidState(state.ack_state));
            }
            state.ack_state = AckState::Submitting;
            state.last_ack_error = None;
            Ok(selection)
        })?;

        tracing::info!(document_id = selection.id, "Submitting acknowledgment");
        let result = self.api.acknowledge(selection.id).await;

        match result {
            Ok(()) => {
                metrics::counter!("acknowledgments_total", "outcome" => "success").increment(1);
                let applied = self.session.with(|state| {
                    let current = state.is_current(&selection);
                    if current {
                        state.ack_state = AckState::Done;
                    }
                    current
                });

                // only the submitting selection may lose its cached detail
                self.store.refresh(applied.then_some(&selection)).await;

                if applied && self.session.close_if_current(&selection) {
                    tracing::info!(document_id = selection.id, "Document acknowledged");
                    Ok(SubmitOutcome::Done)
                } else {
                    tracing::info!(
                        document_id = selection.id,
                        "Document acknowledged after the preview was closed"
                    );
                    Ok(SubmitOutcome::Detached)
                }
            }
            Err(e) => {
                metrics::counter!("acknowledgments_total", "outcome" => "failure").increment(1);
                tracing::error!(document_id = selection.id, error = %e, "Acknowledgment failed");
                self.session.with(|state| {
                    if state.is_current(&selection) {
                        state.ack_state = AckState::Checked;
                        state.last_ack_error = Some(e.to_string());
                    }
                });
                Err(e)
            }
        }
    }

    pub fn reset(&self) {
        self.session.with(|state| state.reset_gate());
    }
}
