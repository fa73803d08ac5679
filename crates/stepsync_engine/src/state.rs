//! Replica synchronization state machine.

use crate::config::ReplicaConfig;
use crate::rebase::{rebase_steps, rebase_tail, unconfirmed_from, Rebaseable};
use stepsync_protocol::{Commit, DocumentSnapshot};
use stepsync_transform::{Assoc, Mappable, Step, Transform, TransformResult};
use tracing::{debug, trace};

/// A proposal that has been handed out and not yet confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit<S> {
    commit: Commit<S>,
    last_origin: u64,
}

impl<S> PendingCommit<S> {
    /// The cached proposal.
    pub fn commit(&self) -> &Commit<S> {
        &self.commit
    }

    /// Origin of the last unconfirmed step included in the proposal.
    pub fn last_origin(&self) -> u64 {
        self.last_origin
    }
}

/// Why a received commit was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The commit is at or below the replica's version.
    Stale,
    /// The commit skips at least one version.
    Gap,
}

/// What receiving a commit did to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The commit confirmed the replica's pending proposal.
    Confirmed {
        /// Unconfirmed steps lost while reconciling with the accepted form.
        dropped: usize,
    },
    /// Another replica's commit; local steps were rebased over it.
    Rebased {
        /// Unconfirmed steps dropped because they no longer apply.
        dropped: usize,
    },
    /// The commit was out of sequence and left the state untouched.
    Ignored {
        /// Why it was ignored.
        reason: IgnoreReason,
    },
}

/// The result of [`ReplicaState::receive_commit`].
#[derive(Debug, Clone)]
pub struct Receipt<S: Step> {
    /// What happened.
    pub outcome: ReceiveOutcome,
    /// Number of unconfirmed steps that went through a rebase.
    pub rebased: usize,
    /// Delta from the document before receipt to the document after it.
    pub delta: Transform<S>,
}

impl<S: Step> Receipt<S> {
    /// The document after receipt.
    pub fn doc(&self) -> &S::Doc {
        self.delta.doc()
    }

    /// Returns true if the document changed.
    pub fn doc_changed(&self) -> bool {
        self.delta.doc_changed()
    }

    /// Maps a position (a selection, a cursor) from the old document into
    /// the new one.
    pub fn map_position(&self, pos: usize, assoc: Assoc) -> usize {
        self.delta.mapping().map(pos, assoc)
    }

    /// Number of unconfirmed steps dropped.
    pub fn dropped(&self) -> usize {
        match self.outcome {
            ReceiveOutcome::Confirmed { dropped } | ReceiveOutcome::Rebased { dropped } => dropped,
            ReceiveOutcome::Ignored { .. } => 0,
        }
    }

    fn ignored(doc: &S::Doc, reason: IgnoreReason) -> Self {
        Self {
            outcome: ReceiveOutcome::Ignored { reason },
            rebased: 0,
            delta: Transform::new(doc.clone()),
        }
    }
}

/// Per-replica synchronization state.
///
/// Holds the confirmed authority version, the local steps not yet
/// confirmed, and the proposal currently in flight. The document itself
/// is owned by the caller and passed in where a transition needs it.
#[derive(Debug, Clone)]
pub struct ReplicaState<S: Step> {
    config: ReplicaConfig,
    version: u64,
    unconfirmed: Vec<Rebaseable<S>>,
    pending: Option<PendingCommit<S>>,
    next_origin: u64,
}

impl<S: Step> ReplicaState<S> {
    /// Creates a state at `config.start_version` with nothing unconfirmed.
    pub fn new(config: ReplicaConfig) -> Self {
        Self {
            version: config.start_version,
            config,
            unconfirmed: Vec::new(),
            pending: None,
            next_origin: 0,
        }
    }

    /// Creates a state matching an authority snapshot.
    pub fn from_snapshot(config: ReplicaConfig, snapshot: &DocumentSnapshot<S::Doc>) -> Self {
        Self::new(ReplicaConfig {
            start_version: snapshot.version,
            ..config
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// Returns the last confirmed authority version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the unconfirmed local steps.
    pub fn unconfirmed(&self) -> &[Rebaseable<S>] {
        &self.unconfirmed
    }

    /// Returns true if any local step awaits confirmation.
    pub fn has_unconfirmed(&self) -> bool {
        !self.unconfirmed.is_empty()
    }

    /// Returns the proposal in flight, if any.
    pub fn pending(&self) -> Option<&PendingCommit<S>> {
        self.pending.as_ref()
    }

    /// Records every step of a local transform.
    pub fn record_transform(&mut self, transform: &Transform<S>) {
        let steps = unconfirmed_from(transform, self.next_origin);
        self.next_origin += steps.len() as u64;
        self.unconfirmed.extend(steps);
    }

    /// Applies `steps` to `doc` and records them as local edits.
    ///
    /// Returns the transform so the caller can pick up the new document.
    /// If any step is rejected nothing is recorded.
    pub fn record_steps(&mut self, doc: &S::Doc, steps: Vec<S>) -> TransformResult<Transform<S>> {
        let mut transform = Transform::new(doc.clone());
        for step in steps {
            transform.step(step)?;
        }
        self.record_transform(&transform);
        Ok(transform)
    }

    /// Returns the commit to send to the authority, if any.
    ///
    /// A proposal already in flight is returned again unchanged so it can
    /// be retransmitted under the same ref.
    pub fn sendable_commit(&mut self) -> Option<Commit<S>> {
        if let Some(pending) = &self.pending {
            return Some(pending.commit.clone());
        }

        let batch = &self.unconfirmed[..self.config.batch_size.min(self.unconfirmed.len())];
        let last_origin = batch.last()?.origin;
        let steps = batch.iter().map(|r| r.step.clone()).collect();
        let commit = Commit::propose(self.version, steps);

        debug!(
            replica = %self.config.replica_id,
            version = self.version,
            reference = %commit.reference,
            steps = commit.len(),
            "proposing commit"
        );
        self.pending = Some(PendingCommit {
            commit: commit.clone(),
            last_origin,
        });
        Some(commit)
    }

    /// Processes a commit accepted by the authority.
    ///
    /// `doc` must be the replica's current document. Only the commit at
    /// `version + 1` is processed; any other is ignored. On error the
    /// state is unchanged.
    pub fn receive_commit(&mut self, doc: &S::Doc, commit: &Commit<S>) -> TransformResult<Receipt<S>> {
        let expected = self.version + 1;
        if commit.version != expected {
            let reason = if commit.version < expected {
                IgnoreReason::Stale
            } else {
                IgnoreReason::Gap
            };
            trace!(
                replica = %self.config.replica_id,
                version = self.version,
                received = commit.version,
                "ignoring out-of-sequence commit"
            );
            return Ok(Receipt::ignored(doc, reason));
        }

        let own = self
            .pending
            .as_ref()
            .filter(|pending| pending.commit.has_ref(&commit.reference))
            .map(|pending| pending.last_origin);

        match own {
            Some(last_origin) => self.confirm(doc, commit, last_origin),
            None => self.rebase(doc, commit),
        }
    }

    fn confirm(&mut self, doc: &S::Doc, commit: &Commit<S>, last_origin: u64) -> TransformResult<Receipt<S>> {
        let batch = self
            .unconfirmed
            .iter()
            .take_while(|r| r.origin <= last_origin)
            .count();
        let accepted_as_sent = batch == commit.len()
            && self.unconfirmed[..batch]
                .iter()
                .zip(&commit.steps)
                .all(|(r, step)| r.step == *step);

        let mut delta = Transform::new(doc.clone());
        let (rebased, dropped) = if accepted_as_sent {
            self.unconfirmed = self.unconfirmed.split_off(batch);
            (0, 0)
        } else {
            // The authority dropped or remapped part of the batch.
            let tail = self.unconfirmed.len() - batch;
            let kept = rebase_tail(&self.unconfirmed, batch, &commit.steps, &mut delta)?;
            let dropped = tail - kept.len();
            self.unconfirmed = kept;
            (tail, dropped)
        };

        self.version = commit.version;
        self.pending = None;
        debug!(
            replica = %self.config.replica_id,
            version = self.version,
            reference = %commit.reference,
            reconciled = !accepted_as_sent,
            "commit confirmed"
        );

        Ok(Receipt {
            outcome: ReceiveOutcome::Confirmed { dropped },
            rebased,
            delta,
        })
    }

    fn rebase(&mut self, doc: &S::Doc, commit: &Commit<S>) -> TransformResult<Receipt<S>> {
        let mut delta = Transform::new(doc.clone());
        let kept = rebase_steps(&self.unconfirmed, &commit.steps, &mut delta)?;
        let rebased = self.unconfirmed.len();
        let dropped = rebased - kept.len();

        self.unconfirmed = kept;
        self.version = commit.version;
        if dropped > 0 {
            debug!(
                replica = %self.config.replica_id,
                version = self.version,
                dropped,
                "unconfirmed steps dropped by rebase"
            );
        }

        Ok(Receipt {
            outcome: ReceiveOutcome::Rebased { dropped },
            rebased,
            delta,
        })
    }
}
