//! Stress tests for stepsync.
//!
//! These runs drive many replicas through long random sessions, or many
//! threads against one shared server, and report throughput.

use crate::fixtures::text_server;
use crate::generators::SessionAction;
use crate::network::Network;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use stepsync_protocol::{Commit, PushRequest};
use stepsync_transform::TextStep;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Commits the authority logged.
    pub commits: u64,
    /// Proposal steps the authority dropped.
    pub dropped_steps: usize,
    /// Whether every replica ended up matching the authority.
    pub converged: bool,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(
        total_ops: usize,
        commits: u64,
        dropped_steps: usize,
        converged: bool,
        duration: Duration,
    ) -> Self {
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total_ops as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops,
            commits,
            dropped_steps,
            converged,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Commits: {}", self.commits);
        println!("Dropped steps: {}", self.dropped_steps);
        println!("Converged: {}", self.converged);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of replicas (or threads, for concurrent tests).
    pub replicas: usize,
    /// Replica batch size.
    pub batch_size: usize,
    /// Chance that an operation is a network action rather than an edit.
    pub network_ratio: f64,
    /// RNG seed, so failures can be replayed.
    pub seed: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 2_000,
            replicas: 4,
            batch_size: stepsync_engine::DEFAULT_BATCH_SIZE,
            network_ratio: 0.3,
            seed: 0x5eed,
        }
    }
}

fn random_action(rng: &mut StdRng, config: &StressConfig) -> SessionAction {
    let replica = rng.gen_range(0..config.replicas);
    if rng.gen_bool(config.network_ratio) {
        return match rng.gen_range(0..3) {
            0 => SessionAction::Send { replica },
            1 => SessionAction::Sync { replica },
            _ => SessionAction::Broadcast { replica },
        };
    }

    let at = rng.gen::<usize>();
    if rng.gen_bool(0.7) {
        let text: String = (0..rng.gen_range(1..4))
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        SessionAction::Insert { replica, at, text }
    } else {
        SessionAction::Delete {
            replica,
            at,
            len: rng.gen_range(1..4),
        }
    }
}

/// Run a random editing session and settle it.
pub fn stress_random_session(config: &StressConfig) -> StressTestResult {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut network = Network::with_batch_size(config.replicas, "", config.batch_size);

    let start = Instant::now();
    for _ in 0..config.operations {
        random_action(&mut rng, config).apply(&mut network);
    }
    network.settle();

    StressTestResult::new(
        config.operations,
        network.authority().version(),
        network.dropped(),
        network.is_converged(),
        start.elapsed(),
    )
}

/// Waits for every worker, re-raising the first panic.
fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

/// Run stale proposals from many threads against one server.
///
/// Every proposal is based on version 0, so each one is merged through
/// the whole history accepted before it.
pub fn stress_concurrent_pushes(config: &StressConfig) -> StressTestResult {
    let server = text_server("");
    let accepted = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.replicas.max(1);

    let start = Instant::now();
    let handles: Vec<_> = (0..config.replicas)
        .map(|t| {
            let server = Arc::clone(&server);
            let accepted = Arc::clone(&accepted);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let commit = Commit::new(0, format!("t{t}-{i}"), vec![TextStep::insert(0, "x")]);
                    if let Ok(response) = server.handle_push(PushRequest::new(commit)) {
                        if response.success {
                            accepted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    join_workers(handles);

    let total = ops_per_thread * config.replicas;
    let commits = server.version();
    let converged = accepted.load(Ordering::Relaxed) == total
        && server.snapshot().doc.len() == total;

    StressTestResult::new(total, commits, 0, converged, start.elapsed())
}
