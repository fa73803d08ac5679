//! An in-process network of replicas around one authority.
//!
//! Commits travel synchronously: `send` hands a replica's pending commit
//! straight to the authority and `sync` delivers every logged commit the
//! replica has not seen yet. Replicas can be held back with [`Network::delay`]
//! to build up conflicting histories.

use stepsync_engine::{Replica, ReplicaConfig};
use stepsync_server::{Authority, MergeOutcome, ServerConfig};
use stepsync_transform::{TextDoc, TextStep};
use tracing::trace;

/// A simulated network of text replicas.
pub struct Network {
    authority: Authority<TextStep>,
    replicas: Vec<Replica<TextStep>>,
    delayed: Vec<usize>,
    dropped: usize,
}

impl Network {
    /// Creates `count` replicas and an authority, all holding `text`.
    pub fn new(count: usize, text: &str) -> Self {
        Self::with_batch_size(count, text, stepsync_engine::DEFAULT_BATCH_SIZE)
    }

    /// Like [`Network::new`], with a custom replica batch size.
    pub fn with_batch_size(count: usize, text: &str, batch_size: usize) -> Self {
        let replicas = (0..count)
            .map(|_| {
                Replica::new(
                    ReplicaConfig::default().with_batch_size(batch_size),
                    TextDoc::from(text),
                )
            })
            .collect();

        Self {
            authority: Authority::new(ServerConfig::default(), TextDoc::from(text)),
            replicas,
            delayed: Vec::new(),
            dropped: 0,
        }
    }

    /// Returns the number of replicas.
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Returns true if there are no replicas.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Returns the authority.
    pub fn authority(&self) -> &Authority<TextStep> {
        &self.authority
    }

    /// Returns replica `n`.
    pub fn replica(&self, n: usize) -> &Replica<TextStep> {
        &self.replicas[n]
    }

    /// Returns the text of replica `n`.
    pub fn text(&self, n: usize) -> String {
        self.replicas[n].doc().to_string()
    }

    /// Returns the length of replica `n`'s document.
    pub fn doc_len(&self, n: usize) -> usize {
        self.replicas[n].doc().len()
    }

    /// Total proposal steps the authority has dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Applies steps locally on replica `n` without sending anything.
    pub fn edit(&mut self, n: usize, steps: Vec<TextStep>) {
        self.replicas[n]
            .edit(steps)
            .expect("local edit should apply to the replica's document");
    }

    /// Applies steps on replica `n`, then broadcasts it.
    pub fn update(&mut self, n: usize, steps: Vec<TextStep>) {
        self.edit(n, steps);
        self.broadcast(n);
    }

    /// Inserts `text` at `pos` on replica `n`, then broadcasts it.
    pub fn type_text(&mut self, n: usize, text: &str, pos: usize) {
        self.update(n, vec![TextStep::insert(pos, text)]);
    }

    /// Deletes `from..to` on replica `n`, then broadcasts it.
    pub fn delete(&mut self, n: usize, from: usize, to: usize) {
        self.update(n, vec![TextStep::delete(from, to)]);
    }

    /// Hands replica `n`'s sendable commit to the authority.
    pub fn send(&mut self, n: usize) {
        let Some(commit) = self.replicas[n].sendable_commit() else {
            return;
        };

        let outcome = self
            .authority
            .receive(&commit)
            .expect("authority should accept a replica's proposal");
        if let MergeOutcome::Applied { dropped, .. } = &outcome {
            self.dropped += dropped;
        }
        trace!(
            replica = n,
            version = outcome.commit().version,
            duplicate = outcome.is_duplicate(),
            "proposal delivered"
        );
    }

    /// Delivers every commit replica `n` has not seen.
    pub fn sync(&mut self, n: usize) {
        let since = self.replicas[n].version();
        let replica = &mut self.replicas[n];
        for commit in self.authority.log().commits_since(since, usize::MAX) {
            replica
                .receive(commit)
                .expect("logged commit should apply to the replica");
        }
    }

    /// Sends replica `n`'s work and syncs every replica.
    ///
    /// Does nothing while `n` is delayed.
    pub fn broadcast(&mut self, n: usize) {
        if self.delayed.contains(&n) {
            return;
        }
        self.send(n);
        for i in 0..self.replicas.len() {
            self.sync(i);
        }
    }

    /// Runs `f` with replica `n` held back, then broadcasts it.
    pub fn delay(&mut self, n: usize, f: impl FnOnce(&mut Self)) {
        self.delayed.push(n);
        f(self);
        self.delayed.retain(|&d| d != n);
        self.broadcast(n);
    }

    /// Broadcasts until no replica holds unconfirmed steps.
    pub fn settle(&mut self) {
        let mut rounds = 0;
        loop {
            for i in 0..self.replicas.len() {
                self.broadcast(i);
            }
            if !self.replicas.iter().any(Replica::has_unconfirmed) {
                return;
            }
            rounds += 1;
            assert!(rounds < 10_000, "network did not settle");
        }
    }

    /// Returns true if every replica matches the authority and has nothing left to send.
    pub fn is_converged(&self) -> bool {
        let doc = self.authority.doc();
        self.replicas.iter().all(|replica| {
            replica.doc() == doc
                && replica.version() == self.authority.version()
                && !replica.has_unconfirmed()
        })
    }

    /// Settles the network and asserts every document equals `expected`.
    pub fn conv(&mut self, expected: &str) {
        self.settle();
        assert_eq!(self.authority.doc().to_string(), expected, "authority");
        for (i, replica) in self.replicas.iter().enumerate() {
            assert_eq!(replica.doc().to_string(), expected, "replica {i}");
            assert_eq!(replica.version(), self.authority.version(), "replica {i} version");
        }
    }
}
