//! Configuration for replicas.

use uuid::Uuid;

/// Default number of steps carried by one proposed commit.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Configuration for a replica.
#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    /// Authority version the replica's document reflects at start.
    pub start_version: u64,
    /// Identifier used in log output.
    pub replica_id: Uuid,
    /// Maximum number of steps per proposed commit.
    pub batch_size: usize,
}

impl ReplicaConfig {
    /// Creates a configuration starting at `start_version`.
    pub fn new(start_version: u64) -> Self {
        Self {
            start_version,
            replica_id: Uuid::new_v4(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the replica identifier.
    pub fn with_replica_id(mut self, replica_id: Uuid) -> Self {
        self.replica_id = replica_id;
        self
    }

    /// Sets the batch size. A size of zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
