//! Protocol messages between replicas and the authority.

use crate::codec;
use crate::commit::{Commit, DocumentSnapshot};
use crate::error::ProtocolResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A sync protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum SyncMessage<S, D> {
    /// Pull request.
    PullRequest(PullRequest),
    /// Pull response.
    PullResponse(PullResponse<S>),
    /// Push request.
    PushRequest(PushRequest<S>),
    /// Push response.
    PushResponse(PushResponse<S>),
    /// Snapshot request.
    SnapshotRequest,
    /// Snapshot response.
    SnapshotResponse(DocumentSnapshot<D>),
}

impl<S, D> SyncMessage<S, D> {
    /// Returns the message type code.
    pub fn type_code(&self) -> u8 {
        match self {
            SyncMessage::PullRequest(_) => 1,
            SyncMessage::PullResponse(_) => 2,
            SyncMessage::PushRequest(_) => 3,
            SyncMessage::PushResponse(_) => 4,
            SyncMessage::SnapshotRequest => 5,
            SyncMessage::SnapshotResponse(_) => 6,
        }
    }
}

impl<S: Serialize, D: Serialize> SyncMessage<S, D> {
    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        codec::to_cbor(self)
    }
}

impl<S: DeserializeOwned, D: DeserializeOwned> SyncMessage<S, D> {
    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        codec::from_cbor(bytes)
    }
}

/// Asks for accepted commits after a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// The replica's current version; commits with a greater version are returned.
    pub since: u64,
    /// Maximum number of commits to return.
    pub limit: u32,
}

impl PullRequest {
    /// Creates a new pull request.
    pub fn new(since: u64, limit: u32) -> Self {
        Self { since, limit }
    }
}

/// Accepted commits, in version order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullResponse<S> {
    /// Commits with versions `since + 1 ..`.
    pub commits: Vec<Commit<S>>,
    /// The authority's current version.
    pub version: u64,
    /// Whether more commits are available past this batch.
    pub has_more: bool,
}

impl<S> PullResponse<S> {
    /// Creates a new pull response.
    pub fn new(commits: Vec<Commit<S>>, version: u64, has_more: bool) -> Self {
        Self {
            commits,
            version,
            has_more,
        }
    }
}

/// Proposes a commit to the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest<S> {
    /// The proposal; `version` is its base version.
    pub commit: Commit<S>,
}

impl<S> PushRequest<S> {
    /// Creates a new push request.
    pub fn new(commit: Commit<S>) -> Self {
        Self { commit }
    }
}

/// The authority's answer to a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResponse<S> {
    /// Whether the proposal was merged (or had already been merged).
    pub success: bool,
    /// The accepted commit as logged by the authority.
    pub commit: Option<Commit<S>>,
    /// True when the ref had already been logged.
    pub duplicate: bool,
    /// Error message if the proposal was refused.
    pub error: Option<String>,
}

impl<S> PushResponse<S> {
    /// Creates a response for a newly merged proposal.
    pub fn accepted(commit: Commit<S>) -> Self {
        Self {
            success: true,
            commit: Some(commit),
            duplicate: false,
            error: None,
        }
    }

    /// Creates a response for a proposal whose ref was already logged.
    pub fn duplicate(commit: Commit<S>) -> Self {
        Self {
            success: true,
            commit: Some(commit),
            duplicate: true,
            error: None,
        }
    }

    /// Creates a response for a refused proposal.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            commit: None,
            duplicate: false,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepsync_transform::{TextDoc, TextStep};

    type Message = SyncMessage<TextStep, TextDoc>;

    #[test]
    fn pull_response_cbor() {
        let commits = vec![
            Commit::new(4, "a", vec![TextStep::insert(0, "x")]),
            Commit::new(5, "b", vec![]),
        ];
        let message = Message::PullResponse(PullResponse::new(commits, 5, true));
        let bytes = message.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();

        match decoded {
            SyncMessage::PullResponse(resp) => {
                assert_eq!(resp.commits.len(), 2);
                assert_eq!(resp.commits[0].reference, "a");
                assert_eq!(resp.version, 5);
                assert!(resp.has_more);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn push_response_variants() {
        let commit = Commit::new(1, "r", vec![TextStep::insert(0, "x")]);

        let resp = PushResponse::accepted(commit.clone());
        assert!(resp.success);
        assert!(!resp.duplicate);

        let resp = PushResponse::duplicate(commit);
        assert!(resp.success);
        assert!(resp.duplicate);

        let resp = PushResponse::<TextStep>::error("base version 9 is ahead of 2");
        assert!(!resp.success);
        assert!(resp.commit.is_none());
        assert!(resp.error.unwrap().contains("ahead"));
    }

    #[test]
    fn json_is_adjacently_tagged() {
        let message = Message::PullRequest(PullRequest::new(3, 50));
        let json = crate::codec::to_json(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "pull_request", "body": {"since": 3, "limit": 50}})
        );
    }

    #[test]
    fn snapshot_roundtrip() {
        let message = Message::SnapshotResponse(DocumentSnapshot::new(2, TextDoc::from("ab")));
        let decoded = Message::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn sync_message_type_codes() {
        assert_eq!(Message::PullRequest(PullRequest::new(0, 0)).type_code(), 1);
        assert_eq!(
            Message::PullResponse(PullResponse::new(vec![], 0, false)).type_code(),
            2
        );
        assert_eq!(
            Message::PushRequest(PushRequest::new(Commit::new(0, "r", vec![]))).type_code(),
            3
        );
        assert_eq!(
            Message::PushResponse(PushResponse::error("no")).type_code(),
            4
        );
        assert_eq!(Message::SnapshotRequest.type_code(), 5);
        assert_eq!(
            Message::SnapshotResponse(DocumentSnapshot::new(0, TextDoc::default())).type_code(),
            6
        );
    }
}
