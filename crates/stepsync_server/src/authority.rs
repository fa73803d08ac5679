//! Authoritative document state.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::merge::authority_merge;
use crate::oplog::CommitLog;
use stepsync_protocol::{Commit, DocumentSnapshot};
use stepsync_transform::Step;
use tracing::debug;

/// What [`Authority::receive`] did with a proposal.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome<S> {
    /// The proposal was merged and logged.
    Applied {
        /// The logged commit.
        commit: Commit<S>,
        /// Proposal steps that could not be applied.
        dropped: usize,
    },
    /// The ref was already logged; nothing changed.
    Duplicate(Commit<S>),
}

impl<S> MergeOutcome<S> {
    /// The logged commit for the proposal's ref.
    pub fn commit(&self) -> &Commit<S> {
        match self {
            MergeOutcome::Applied { commit, .. } | MergeOutcome::Duplicate(commit) => commit,
        }
    }

    /// Consumes the outcome, returning the logged commit.
    pub fn into_commit(self) -> Commit<S> {
        match self {
            MergeOutcome::Applied { commit, .. } | MergeOutcome::Duplicate(commit) => commit,
        }
    }

    /// Returns true if the ref had been logged before.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, MergeOutcome::Duplicate(_))
    }
}

/// The canonical document and its commit history.
///
/// The document is always the starting document with every logged
/// commit applied in order, and the version is the number of commits.
#[derive(Debug, Clone)]
pub struct Authority<S: Step> {
    config: ServerConfig,
    doc: S::Doc,
    log: CommitLog<S>,
}

impl<S: Step> Authority<S> {
    /// Creates an authority at version 0 holding `doc`.
    pub fn new(config: ServerConfig, doc: S::Doc) -> Self {
        Self {
            config,
            doc,
            log: CommitLog::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the current version.
    pub fn version(&self) -> u64 {
        self.log.version()
    }

    /// Returns the current document.
    pub fn doc(&self) -> &S::Doc {
        &self.doc
    }

    /// Returns the commit log.
    pub fn log(&self) -> &CommitLog<S> {
        &self.log
    }

    /// Returns the current document with its version.
    pub fn snapshot(&self) -> DocumentSnapshot<S::Doc> {
        DocumentSnapshot::new(self.version(), self.doc.clone())
    }

    /// Merges a proposal and logs the resulting commit.
    ///
    /// A proposal whose ref is already logged is answered with the logged
    /// commit and changes nothing. On error nothing changes either.
    pub fn receive(&mut self, proposal: &Commit<S>) -> ServerResult<MergeOutcome<S>> {
        if let Some(logged) = self.log.get_by_ref(&proposal.reference) {
            debug!(
                reference = %proposal.reference,
                version = logged.version,
                "answering duplicate proposal from the log"
            );
            return Ok(MergeOutcome::Duplicate(logged.clone()));
        }

        let version = self.version();
        if proposal.version > version {
            return Err(ServerError::FutureBase {
                base: proposal.version,
                current: version,
            });
        }
        if proposal.len() > self.config.max_proposal_steps {
            return Err(ServerError::TooManySteps {
                count: proposal.len(),
                max: self.config.max_proposal_steps,
            });
        }

        let intervening = self.log.commits_since(proposal.version, usize::MAX);
        let merged = authority_merge(version, intervening, proposal, &self.doc)?;

        self.log.append(merged.commit.clone())?;
        self.doc = merged.doc;
        debug!(
            reference = %merged.commit.reference,
            base = proposal.version,
            version = merged.commit.version,
            steps = merged.commit.len(),
            "proposal accepted"
        );

        Ok(MergeOutcome::Applied {
            commit: merged.commit,
            dropped: merged.dropped,
        })
    }
}
