//! # stepsync Testkit
//!
//! Test utilities for stepsync.
//!
//! This crate provides:
//! - An in-process [`Network`] of replicas around one authority
//! - A [`ServerTransport`] that drives replicas against a shared server
//! - Test fixtures and logging setup
//! - Property-based session generators using proptest
//! - Seeded random-session stress runs
//!
//! ## Usage
//!
//! ```rust
//! use stepsync_testkit::prelude::*;
//!
//! let mut network = Network::new(2, "");
//! network.type_text(0, "hi", 0);
//! network.delay(1, |network| network.type_text(1, "!", 2));
//! network.conv("hi!");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod network;
pub mod stress;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::network::*;
    pub use crate::stress::*;
    pub use crate::transport::*;
}

pub use fixtures::*;
pub use generators::*;
pub use network::*;
pub use stress::*;
pub use transport::*;
