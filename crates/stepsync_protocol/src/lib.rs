//! # stepsync Protocol
//!
//! Commit types and wire codecs for stepsync.
//!
//! This crate provides:
//! - [`Commit`], the unit of exchange between replicas and the authority
//! - Random commit references ([`random_ref`])
//! - [`DocumentSnapshot`] for bootstrapping replicas
//! - Protocol messages (Pull, Push, Snapshot)
//! - JSON and CBOR encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations. It is generic
//! over the step and document types; it only requires them to be
//! serializable.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod commit;
mod error;
mod messages;

pub use commit::{random_ref, Commit, DocumentSnapshot};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{PullRequest, PullResponse, PushRequest, PushResponse, SyncMessage};
