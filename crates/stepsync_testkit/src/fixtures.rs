//! Test fixtures and logging setup.

use crate::network::Network;
use std::sync::{Arc, Once};
use stepsync_server::{ServerConfig, SyncServer};
use stepsync_transform::{TextDoc, TextStep};
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Runs a test against a fresh network of `count` replicas.
///
/// # Example
///
/// ```rust
/// use stepsync_testkit::with_network;
///
/// with_network(2, "ab", |network| {
///     network.type_text(0, "c", 2);
///     network.conv("abc");
/// });
/// ```
pub fn with_network<F, R>(count: usize, text: &str, f: F) -> R
where
    F: FnOnce(&mut Network) -> R,
{
    init_test_logging();
    let mut network = Network::new(count, text);
    f(&mut network)
}

/// Creates a shareable text server at version 0.
pub fn text_server(text: &str) -> Arc<SyncServer<TextStep>> {
    Arc::new(SyncServer::new(ServerConfig::default(), TextDoc::from(text)))
}

/// Common starting points.
pub mod scenarios {
    use super::*;

    /// A network where replica 0 typed `text` and everyone has seen it.
    pub fn shared_text(count: usize, text: &str) -> Network {
        let mut network = Network::new(count, "");
        if !text.is_empty() {
            network.type_text(0, text, 0);
        }
        network
    }

    /// A network whose authority already holds `commits` single-character commits.
    pub fn with_history(count: usize, commits: usize) -> Network {
        let mut network = Network::new(count, "");
        for i in 0..commits {
            network.type_text(i % count.max(1), "x", i);
        }
        network
    }
}
