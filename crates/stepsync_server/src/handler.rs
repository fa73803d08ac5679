//! Request handlers for sync endpoints.

use crate::authority::Authority;
use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use std::sync::Arc;
use stepsync_protocol::{DocumentSnapshot, PullRequest, PullResponse, PushRequest, PushResponse};
use stepsync_transform::Step;

/// Context for request handling.
pub struct HandlerContext<S: Step> {
    /// The authority, behind one lock. All mutation takes the write lock.
    pub authority: RwLock<Authority<S>>,
}

impl<S: Step> HandlerContext<S> {
    /// Creates a new handler context.
    pub fn new(authority: Authority<S>) -> Self {
        Self {
            authority: RwLock::new(authority),
        }
    }
}

/// Handler for sync requests.
pub struct RequestHandler<S: Step> {
    context: Arc<HandlerContext<S>>,
}

impl<S: Step> RequestHandler<S> {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext<S>>) -> Self {
        Self { context }
    }

    /// Handles a pull request.
    pub fn handle_pull(&self, request: PullRequest) -> ServerResult<PullResponse<S>> {
        let authority = self.context.authority.read();
        let limit = request.limit.min(authority.config().max_pull_batch) as usize;

        let log = authority.log();
        let commits = log.commits_since(request.since, limit).to_vec();
        let has_more = log.has_more_after(request.since, limit);

        Ok(PullResponse::new(commits, log.version(), has_more))
    }

    /// Handles a push request.
    ///
    /// Proposals the authority refuses are answered with an error
    /// response; only failures of the authority itself are errors.
    pub fn handle_push(&self, request: PushRequest<S>) -> ServerResult<PushResponse<S>> {
        let mut authority = self.context.authority.write();

        match authority.receive(&request.commit) {
            Ok(outcome) if outcome.is_duplicate() => Ok(PushResponse::duplicate(outcome.into_commit())),
            Ok(outcome) => Ok(PushResponse::accepted(outcome.into_commit())),
            Err(err) if err.is_client_error() => Ok(PushResponse::error(err.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Handles a snapshot request.
    pub fn handle_snapshot(&self) -> ServerResult<DocumentSnapshot<S::Doc>> {
        Ok(self.context.authority.read().snapshot())
    }
}

impl<S: Step> Clone for RequestHandler<S> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
        }
    }
}

/// Rejects a message that is not a request.
pub(crate) fn unexpected(type_code: u8) -> ServerError {
    ServerError::InvalidRequest(format!("unexpected message type {type_code}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use stepsync_protocol::Commit;
    use stepsync_transform::{TextDoc, TextStep};

    fn create_handler(config: ServerConfig) -> RequestHandler<TextStep> {
        let authority = Authority::new(config, TextDoc::default());
        RequestHandler::new(Arc::new(HandlerContext::new(authority)))
    }

    fn push(handler: &RequestHandler<TextStep>, base: u64, reference: &str, text: &str) -> PushResponse<TextStep> {
        let commit = Commit::new(base, reference, vec![TextStep::insert(0, text)]);
        handler.handle_push(PushRequest::new(commit)).unwrap()
    }

    #[test]
    fn pull_empty() {
        let handler = create_handler(ServerConfig::default());
        let response = handler.handle_pull(PullRequest::new(0, 10)).unwrap();
        assert!(response.commits.is_empty());
        assert_eq!(response.version, 0);
        assert!(!response.has_more);
    }

    #[test]
    fn push_and_pull() {
        let handler = create_handler(ServerConfig::default());

        let response = push(&handler, 0, "a", "x");
        assert!(response.success);
        assert!(!response.duplicate);

        let response = handler.handle_pull(PullRequest::new(0, 10)).unwrap();
        assert_eq!(response.commits.len(), 1);
        assert_eq!(response.commits[0].reference, "a");
        assert_eq!(response.version, 1);
    }

    #[test]
    fn push_duplicate() {
        let handler = create_handler(ServerConfig::default());
        push(&handler, 0, "a", "x");

        let response = push(&handler, 0, "a", "x");
        assert!(response.success);
        assert!(response.duplicate);
        assert_eq!(response.commit.unwrap().version, 1);
    }

    #[test]
    fn push_future_base() {
        let handler = create_handler(ServerConfig::default());

        let response = push(&handler, 5, "a", "x");
        assert!(!response.success);
        assert!(response.error.unwrap().contains("ahead"));
    }

    #[test]
    fn pull_pagination() {
        let handler = create_handler(ServerConfig::default().with_max_pull_batch(2));
        for i in 0..5u64 {
            push(&handler, i, &format!("r{i}"), "x");
        }

        // The server caps the requested limit.
        let response = handler.handle_pull(PullRequest::new(0, 10)).unwrap();
        assert_eq!(response.commits.len(), 2);
        assert!(response.has_more);

        let response = handler.handle_pull(PullRequest::new(2, 2)).unwrap();
        assert_eq!(response.commits.len(), 2);
        assert!(response.has_more);

        let response = handler.handle_pull(PullRequest::new(4, 2)).unwrap();
        assert_eq!(response.commits.len(), 1);
        assert!(!response.has_more);
    }

    #[test]
    fn snapshot() {
        let handler = create_handler(ServerConfig::default());
        push(&handler, 0, "a", "hi");

        let snapshot = handler.handle_snapshot().unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.doc.to_string(), "hi");
    }
}
