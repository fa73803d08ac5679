//! The authority's commit log.

use crate::error::{ServerError, ServerResult};
use std::collections::HashMap;
use stepsync_protocol::Commit;

/// Append-only log of accepted commits.
///
/// The commit at index `i` has version `i + 1`, so the log's length is
/// always the authority version. A `ref → version` index answers
/// duplicate proposals.
#[derive(Debug, Clone)]
pub struct CommitLog<S> {
    /// Commits in version order.
    commits: Vec<Commit<S>>,
    /// Ref of every logged commit to its version.
    refs: HashMap<String, u64>,
}

impl<S> CommitLog<S> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            commits: Vec::new(),
            refs: HashMap::new(),
        }
    }

    /// Returns the version of the last commit, or 0.
    pub fn version(&self) -> u64 {
        self.commits.len() as u64
    }

    /// Returns the number of commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Returns true if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Appends a commit.
    ///
    /// The commit must carry the next version and a ref not yet logged.
    pub fn append(&mut self, commit: Commit<S>) -> ServerResult<()> {
        let next = self.version() + 1;
        if commit.version != next {
            return Err(ServerError::InvalidRequest(format!(
                "commit version {} does not follow {}",
                commit.version,
                self.version()
            )));
        }
        if self.refs.contains_key(&commit.reference) {
            return Err(ServerError::InvalidRequest(format!(
                "ref {} already logged",
                commit.reference
            )));
        }

        self.refs.insert(commit.reference.clone(), next);
        self.commits.push(commit);
        Ok(())
    }

    /// Returns the commit at `version`.
    pub fn get(&self, version: u64) -> Option<&Commit<S>> {
        let index = version.checked_sub(1)?;
        self.commits.get(usize::try_from(index).ok()?)
    }

    /// Returns the commit logged under `reference`.
    pub fn get_by_ref(&self, reference: &str) -> Option<&Commit<S>> {
        self.refs.get(reference).and_then(|&version| self.get(version))
    }

    /// Returns up to `limit` commits after `version`.
    pub fn commits_since(&self, version: u64, limit: usize) -> &[Commit<S>] {
        let start = self.start_index(version);
        let end = start.saturating_add(limit).min(self.commits.len());
        &self.commits[start..end]
    }

    /// Returns true if more than `limit` commits follow `version`.
    pub fn has_more_after(&self, version: u64, limit: usize) -> bool {
        self.commits.len() - self.start_index(version) > limit
    }

    /// Iterates over all commits in version order.
    pub fn iter(&self) -> impl Iterator<Item = &Commit<S>> {
        self.commits.iter()
    }

    fn start_index(&self, version: u64) -> usize {
        usize::try_from(version)
            .unwrap_or(usize::MAX)
            .min(self.commits.len())
    }
}

impl<S> Default for CommitLog<S> {
    fn default() -> Self {
        Self::new()
    }
}
