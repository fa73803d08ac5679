//! Server configuration.

/// Configuration for the authority and sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of steps accepted in one proposal.
    pub max_proposal_steps: usize,
    /// Maximum batch size for pull responses.
    pub max_pull_batch: u32,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new() -> Self {
        Self {
            max_proposal_steps: 1000,
            max_pull_batch: 100,
        }
    }

    /// Sets the maximum proposal size.
    pub fn with_max_proposal_steps(mut self, max: usize) -> Self {
        self.max_proposal_steps = max;
        self
    }

    /// Sets the maximum pull batch size.
    pub fn with_max_pull_batch(mut self, size: u32) -> Self {
        self.max_pull_batch = size;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
