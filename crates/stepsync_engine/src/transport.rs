//! Transport layer abstraction for commit exchange.

use crate::error::SyncResult;
use stepsync_protocol::{PullRequest, PullResponse, PushRequest, PushResponse};

/// A commit transport carries proposals to the authority and accepted
/// commits back.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, WebSocket, in-process for testing, etc.).
/// Delivery, retries and ordering are the implementation's concern.
pub trait CommitTransport<S> {
    /// Fetches accepted commits after `request.since`.
    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse<S>>;

    /// Proposes a commit.
    fn push(&self, request: &PushRequest<S>) -> SyncResult<PushResponse<S>>;
}
