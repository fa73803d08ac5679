//! Pull-then-push sync driver.

use crate::error::{SyncError, SyncResult};
use crate::replica::Replica;
use crate::transport::CommitTransport;
use std::time::{Duration, Instant};
use stepsync_protocol::{PullRequest, PushRequest};
use stepsync_transform::Step;
use tracing::debug;

/// Default number of commits fetched per pull request.
pub const DEFAULT_PULL_LIMIT: u32 = 100;

/// Result of a sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCycleResult {
    /// Number of commits received in sequence.
    pub pulled: u64,
    /// Number of steps proposed.
    pub pushed: u64,
    /// Number of unconfirmed steps dropped by rebases.
    pub dropped: u64,
    /// Duration of the sync cycle.
    pub duration: Duration,
}

/// Drives a replica through one sync cycle against a transport.
///
/// A cycle pulls every commit past the replica's version, then pushes
/// the sendable commit and pulls again to observe its confirmation,
/// repeating while further batches are ready.
#[derive(Debug, Clone)]
pub struct SyncDriver {
    pull_limit: u32,
}

impl SyncDriver {
    /// Creates a driver fetching at most `pull_limit` commits per request.
    pub fn new(pull_limit: u32) -> Self {
        Self {
            pull_limit: pull_limit.max(1),
        }
    }

    /// Performs a full sync cycle: pull then push.
    pub fn sync<S, T>(&self, replica: &mut Replica<S>, transport: &T) -> SyncResult<SyncCycleResult>
    where
        S: Step,
        T: CommitTransport<S>,
    {
        let start = Instant::now();
        let mut result = SyncCycleResult::default();

        self.pull_all(replica, transport, &mut result)?;

        let mut last_ref: Option<String> = None;
        while let Some(commit) = replica.sendable_commit() {
            // Pulling did not confirm the previous push.
            if last_ref.as_deref() == Some(commit.reference.as_str()) {
                break;
            }

            let steps = commit.len() as u64;
            let reference = commit.reference.clone();
            let response = transport.push(&PushRequest::new(commit))?;
            if !response.success {
                return Err(SyncError::ServerError(
                    response.error.unwrap_or_else(|| "push refused".into()),
                ));
            }
            result.pushed += steps;

            self.pull_all(replica, transport, &mut result)?;
            last_ref = Some(reference);
        }

        result.duration = start.elapsed();
        debug!(
            version = replica.version(),
            pulled = result.pulled,
            pushed = result.pushed,
            dropped = result.dropped,
            "sync cycle complete"
        );
        Ok(result)
    }

    fn pull_all<S, T>(
        &self,
        replica: &mut Replica<S>,
        transport: &T,
        result: &mut SyncCycleResult,
    ) -> SyncResult<()>
    where
        S: Step,
        T: CommitTransport<S>,
    {
        loop {
            let request = PullRequest::new(replica.version(), self.pull_limit);
            let response = transport.pull(&request)?;

            let before = replica.version();
            for commit in &response.commits {
                let receipt = replica.receive(commit)?;
                result.dropped += receipt.dropped() as u64;
            }
            result.pulled += replica.version() - before;

            if !response.has_more || replica.version() == before {
                return Ok(());
            }
        }
    }
}

impl Default for SyncDriver {
    fn default() -> Self {
        Self::new(DEFAULT_PULL_LIMIT)
    }
}
