//! A commit transport over an in-process server.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use stepsync_engine::{CommitTransport, SyncError, SyncResult};
use stepsync_protocol::{Commit, PullRequest, PullResponse, PushRequest, PushResponse};
use stepsync_server::SyncServer;
use stepsync_transform::Step;
use tracing::trace;

/// A transport that delivers straight to a shared [`SyncServer`].
///
/// Proposals go through the server's full merge, so stale proposals are
/// forwarded through history exactly as a deployed authority would.
/// Connectivity can be switched off and pushes can be lost in transit.
pub struct ServerTransport<S: Step> {
    server: Arc<SyncServer<S>>,
    connected: AtomicBool,
    lost_pushes: AtomicUsize,
}

impl<S: Step> ServerTransport<S> {
    /// Creates a transport to `server`.
    pub fn new(server: Arc<SyncServer<S>>) -> Self {
        Self {
            server,
            connected: AtomicBool::new(true),
            lost_pushes: AtomicUsize::new(0),
        }
    }

    /// Returns the server.
    pub fn server(&self) -> &SyncServer<S> {
        &self.server
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Drops the next `count` pushes before they reach the server.
    ///
    /// A lost push fails with a retryable transport error.
    pub fn lose_pushes(&self, count: usize) {
        self.lost_pushes.store(count, Ordering::SeqCst);
    }

    /// Logs a commit as if another replica had pushed it at the latest version.
    pub fn append(&self, reference: impl Into<String>, steps: Vec<S>) -> Commit<S> {
        let proposal = Commit::new(self.server.version(), reference, steps);
        let response = self
            .server
            .handle_push(PushRequest::new(proposal))
            .expect("server should accept a proposal at the latest version");
        response
            .commit
            .expect("accepted push should carry the logged commit")
    }

    fn check_connected(&self) -> SyncResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::NotConnected)
        }
    }

    fn take_lost_push(&self) -> bool {
        self.lost_pushes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl<S: Step> CommitTransport<S> for ServerTransport<S> {
    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse<S>> {
        self.check_connected()?;
        self.server
            .handle_pull(*request)
            .map_err(|e| SyncError::ServerError(e.to_string()))
    }

    fn push(&self, request: &PushRequest<S>) -> SyncResult<PushResponse<S>> {
        self.check_connected()?;
        if self.take_lost_push() {
            trace!(reference = %request.commit.reference, "push lost in transit");
            return Err(SyncError::transport_retryable("push lost in transit"));
        }
        self.server
            .handle_push(request.clone())
            .map_err(|e| SyncError::ServerError(e.to_string()))
    }
}
