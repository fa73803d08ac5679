//! # stepsync Engine
//!
//! Replica-side synchronization for stepsync.
//!
//! This crate provides:
//! - Rebasing of unconfirmed local steps over accepted history
//! - The replica state machine (local edit, sendable commit, receive)
//! - A document-owning [`Replica`]
//! - A transport abstraction and a pull-then-push [`SyncDriver`]
//!
//! ## Architecture
//!
//! A replica records local edits as [`Rebaseable`] steps and proposes
//! them in batches. Every commit the authority accepts is broadcast to
//! all replicas in version order:
//! 1. The replica's own commit confirms its pending proposal
//! 2. Any other commit is applied under the unconfirmed steps, which are
//!    rebased over it
//!
//! ## Key Invariants
//!
//! - The authority is authoritative
//! - Commits are processed strictly in version order
//! - Unconfirmed steps always apply in order to the document at `version`
//! - A step that no longer applies after a rebase is dropped, never retried
//! - Proposals are resent under the same ref until confirmed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod rebase;
mod replica;
mod state;
mod sync;
mod transport;

pub use config::{ReplicaConfig, DEFAULT_BATCH_SIZE};
pub use error::{SyncError, SyncResult};
pub use rebase::{rebase_steps, rebase_tail, unconfirmed_from, Rebaseable};
pub use replica::Replica;
pub use state::{IgnoreReason, PendingCommit, Receipt, ReceiveOutcome, ReplicaState};
pub use sync::{SyncCycleResult, SyncDriver, DEFAULT_PULL_LIMIT};
pub use transport::CommitTransport;
