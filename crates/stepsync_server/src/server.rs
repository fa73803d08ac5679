//! Main sync server.

use crate::authority::Authority;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{unexpected, HandlerContext, RequestHandler};
use std::sync::Arc;
use stepsync_protocol::{
    DocumentSnapshot, PullRequest, PullResponse, PushRequest, PushResponse, SyncMessage,
};
use stepsync_transform::Step;

/// The sync server.
///
/// Wraps one [`Authority`] so it can be shared across threads behind an
/// `Arc`. Requests are serialized on the authority's lock; pulls and
/// snapshots only take it for reading.
///
/// # Example
///
/// ```
/// use stepsync_protocol::{Commit, PullRequest, PushRequest};
/// use stepsync_server::{ServerConfig, SyncServer};
/// use stepsync_transform::{TextDoc, TextStep};
///
/// let server = SyncServer::<TextStep>::new(ServerConfig::default(), TextDoc::from("hi"));
///
/// let proposal = Commit::new(0, "r1", vec![TextStep::insert(2, "!")]);
/// let response = server.handle_push(PushRequest::new(proposal)).unwrap();
/// assert!(response.success);
///
/// let pulled = server.handle_pull(PullRequest::new(0, 10)).unwrap();
/// assert_eq!(pulled.commits.len(), 1);
/// assert_eq!(server.snapshot().doc.to_string(), "hi!");
/// ```
pub struct SyncServer<S: Step> {
    handler: RequestHandler<S>,
    context: Arc<HandlerContext<S>>,
}

impl<S: Step> SyncServer<S> {
    /// Creates a new sync server holding `doc` at version 0.
    pub fn new(config: ServerConfig, doc: S::Doc) -> Self {
        Self::with_authority(Authority::new(config, doc))
    }

    /// Creates a sync server around an existing authority.
    pub fn with_authority(authority: Authority<S>) -> Self {
        let context = Arc::new(HandlerContext::new(authority));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Handles a pull request.
    pub fn handle_pull(&self, request: PullRequest) -> ServerResult<PullResponse<S>> {
        self.handler.handle_pull(request)
    }

    /// Handles a push request.
    pub fn handle_push(&self, request: PushRequest<S>) -> ServerResult<PushResponse<S>> {
        self.handler.handle_push(request)
    }

    /// Handles a sync message (dispatches to appropriate handler).
    pub fn handle_message(&self, message: SyncMessage<S, S::Doc>) -> ServerResult<SyncMessage<S, S::Doc>> {
        match message {
            SyncMessage::PullRequest(req) => self.handle_pull(req).map(SyncMessage::PullResponse),
            SyncMessage::PushRequest(req) => self.handle_push(req).map(SyncMessage::PushResponse),
            SyncMessage::SnapshotRequest => self
                .handler
                .handle_snapshot()
                .map(SyncMessage::SnapshotResponse),
            other => Err(unexpected(other.type_code())),
        }
    }

    /// Returns the current version.
    pub fn version(&self) -> u64 {
        self.context.authority.read().version()
    }

    /// Returns the current document with its version.
    pub fn snapshot(&self) -> DocumentSnapshot<S::Doc> {
        self.context.authority.read().snapshot()
    }

    /// Returns the number of logged commits.
    pub fn commit_count(&self) -> usize {
        self.context.authority.read().log().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepsync_protocol::Commit;
    use stepsync_transform::{TextDoc, TextStep};

    type Message = SyncMessage<TextStep, TextDoc>;

    fn server() -> SyncServer<TextStep> {
        SyncServer::new(ServerConfig::default(), TextDoc::default())
    }

    #[test]
    fn server_lifecycle() {
        let server = server();
        assert_eq!(server.version(), 0);
        assert_eq!(server.commit_count(), 0);
    }

    #[test]
    fn full_sync_flow() {
        let server = server();

        // 1. Pull (should be empty initially)
        let response = server.handle_pull(PullRequest::new(0, 10)).unwrap();
        assert!(response.commits.is_empty());

        // 2. Two replicas propose against version 0
        let a = Commit::new(0, "a", vec![TextStep::insert(0, "hi")]);
        let b = Commit::new(0, "b", vec![TextStep::insert(0, "ok")]);
        assert!(server.handle_push(PushRequest::new(a)).unwrap().success);
        let response = server.handle_push(PushRequest::new(b)).unwrap();
        assert_eq!(response.commit.unwrap().version, 2);

        // 3. Pull again (should get both commits)
        let response = server.handle_pull(PullRequest::new(0, 10)).unwrap();
        assert_eq!(response.commits.len(), 2);
        assert_eq!(server.version(), 2);
        assert_eq!(server.snapshot().doc.to_string(), "hiok");
    }

    #[test]
    fn message_dispatch() {
        let server = server();

        let response = server.handle_message(Message::PullRequest(PullRequest::new(0, 10))).unwrap();
        assert!(matches!(response, SyncMessage::PullResponse(_)));

        let response = server.handle_message(Message::SnapshotRequest).unwrap();
        assert!(matches!(response, SyncMessage::SnapshotResponse(_)));

        let err = server
            .handle_message(Message::PushResponse(PushResponse::error("no")))
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn shared_across_threads() {
        let server = Arc::new(server());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let server = Arc::clone(&server);
                std::thread::spawn(move || {
                    let commit = Commit::new(0, format!("t{i}"), vec![TextStep::insert(0, "x")]);
                    server.handle_push(PushRequest::new(commit)).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().success);
        }
        assert_eq!(server.version(), 4);
        assert_eq!(server.snapshot().doc.to_string(), "xxxx");
    }
}
