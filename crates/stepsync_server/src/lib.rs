//! # stepsync Server
//!
//! The authority side of stepsync.
//!
//! This crate provides:
//! - The authority merge that forwards stale proposals through accepted
//!   history and applies what still fits
//! - The append-only commit log with its ref index
//! - [`Authority`], the canonical document and version counter
//! - A thread-safe [`SyncServer`] with pull, push and snapshot handlers
//!
//! # Protocol
//!
//! 1. A replica pushes a commit based on the last version it has seen
//! 2. The authority merges it and logs the result at the next version,
//!    under the proposal's ref
//! 3. Replicas pull every commit past their version, in order
//!
//! A proposal whose ref is already logged is answered with the logged
//! commit, so replicas may resend freely until they see confirmation.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod authority;
mod config;
mod error;
mod handler;
mod merge;
mod oplog;
mod server;

pub use authority::{Authority, MergeOutcome};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use merge::{authority_merge, merge_json, Merged};
pub use oplog::CommitLog;
pub use server::SyncServer;
