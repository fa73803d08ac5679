//! A replica: a document together with its synchronization state.

use crate::config::ReplicaConfig;
use crate::state::{Receipt, ReplicaState};
use stepsync_protocol::{Commit, DocumentSnapshot};
use stepsync_transform::{Step, TransformResult};

/// An editable copy of a document kept in sync with an authority.
#[derive(Debug, Clone)]
pub struct Replica<S: Step> {
    doc: S::Doc,
    state: ReplicaState<S>,
}

impl<S: Step> Replica<S> {
    /// Creates a replica holding `doc` at `config.start_version`.
    pub fn new(config: ReplicaConfig, doc: S::Doc) -> Self {
        Self {
            doc,
            state: ReplicaState::new(config),
        }
    }

    /// Creates a replica from an authority snapshot.
    pub fn from_snapshot(config: ReplicaConfig, snapshot: DocumentSnapshot<S::Doc>) -> Self {
        let state = ReplicaState::from_snapshot(config, &snapshot);
        Self {
            doc: snapshot.doc,
            state,
        }
    }

    /// Returns the current document, local edits included.
    pub fn doc(&self) -> &S::Doc {
        &self.doc
    }

    /// Returns the synchronization state.
    pub fn state(&self) -> &ReplicaState<S> {
        &self.state
    }

    /// Returns the last confirmed authority version.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Returns true if any local edit awaits confirmation.
    pub fn has_unconfirmed(&self) -> bool {
        self.state.has_unconfirmed()
    }

    /// Applies a local edit. If any step is rejected nothing changes.
    pub fn edit(&mut self, steps: Vec<S>) -> TransformResult<&S::Doc> {
        let transform = self.state.record_steps(&self.doc, steps)?;
        self.doc = transform.into_doc();
        Ok(&self.doc)
    }

    /// Returns the commit to send to the authority, if any.
    pub fn sendable_commit(&mut self) -> Option<Commit<S>> {
        self.state.sendable_commit()
    }

    /// Processes a commit accepted by the authority.
    pub fn receive(&mut self, commit: &Commit<S>) -> TransformResult<Receipt<S>> {
        let receipt = self.state.receive_commit(&self.doc, commit)?;
        if receipt.doc_changed() {
            self.doc = receipt.doc().clone();
        }
        Ok(receipt)
    }

    /// Replaces the document and state with an authority snapshot,
    /// discarding unconfirmed edits.
    pub fn reset(&mut self, snapshot: DocumentSnapshot<S::Doc>) {
        let config = self.state.config().clone();
        *self = Self::from_snapshot(config, snapshot);
    }
}
