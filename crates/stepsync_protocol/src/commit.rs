//! Commits exchanged between replicas and the authority.

use crate::codec;
use crate::error::ProtocolResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A versioned, uniquely referenced bundle of edit operations.
///
/// When proposed by a replica, `version` is the authority version the
/// steps are based on. Once accepted, it is the version the commit
/// produced.
///
/// # Wire shape
///
/// ```json
/// { "version": 3, "ref": "1x9d0q3k7m", "steps": [ ... ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit<S> {
    /// Base version (proposed) or resulting version (accepted).
    pub version: u64,
    /// Unique reference; acknowledgement is matched on it.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Ordered edit operations.
    pub steps: Vec<S>,
}

impl<S> Commit<S> {
    /// Creates a commit.
    pub fn new(version: u64, reference: impl Into<String>, steps: Vec<S>) -> Self {
        Self {
            version,
            reference: reference.into(),
            steps,
        }
    }

    /// Creates a proposal based on `base_version` with a fresh random ref.
    pub fn propose(base_version: u64, steps: Vec<S>) -> Self {
        Self::new(base_version, random_ref(), steps)
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the commit carries no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true if this commit carries the given ref.
    pub fn has_ref(&self, reference: &str) -> bool {
        self.reference == reference
    }
}

impl<S: Serialize> Commit<S> {
    /// Encodes to a JSON value.
    pub fn to_json(&self) -> ProtocolResult<serde_json::Value> {
        codec::to_json(self)
    }

    /// Encodes to CBOR bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        codec::to_cbor(self)
    }
}

impl<S: DeserializeOwned> Commit<S> {
    /// Decodes from a JSON value.
    pub fn from_json(value: serde_json::Value) -> ProtocolResult<Self> {
        codec::from_json(value)
    }

    /// Decodes from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        codec::from_cbor(bytes)
    }
}

/// Generates a practically unique commit reference.
///
/// Two random 32-bit words rendered in base 36 and concatenated. No
/// coordination is needed; uniqueness holds with overwhelming probability.
pub fn random_ref() -> String {
    let words: [u32; 2] = rand::random();
    words.iter().map(|&word| to_base36(word)).collect()
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// A document together with the authority version it reflects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot<D> {
    /// Authority version.
    pub version: u64,
    /// Document at that version.
    pub doc: D,
}

impl<D> DocumentSnapshot<D> {
    /// Creates a snapshot.
    pub fn new(version: u64, doc: D) -> Self {
        Self { version, doc }
    }
}
