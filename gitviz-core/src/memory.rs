use std::collections::{BTreeMap, HashMap};

use crate::error::RepoError;
use crate::source::{BranchInfo, CommitWithParents, HeadState, HistorySource, TagInfo};

#[derive(Debug, Clone, Default)]
enum MemoryHead {
    #[default]
    Unborn,
    Branch(String),
    Detached(String),
}

/// In-memory history with the same contract as [`crate::Repository`].
///
/// Commit ids are free-form strings, which keeps graph fixtures readable:
///
/// ```
/// use gitviz_core::{HistorySource, MemoryRepository};
///
/// let mut repo = MemoryRepository::new();
/// repo.commit("A", &[], 100, "root")
///     .commit("B", &["A"], 200, "second")
///     .branch("master", "B")
///     .checkout("master");
///
/// assert_eq!(repo.head_state().unwrap().commit_id(), Some("B"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    commits: HashMap<String, CommitWithParents>,
    branches: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    head: MemoryHead,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit; `timestamp` is the author time in seconds
    pub fn commit(&mut self, id: &str, parents: &[&str], timestamp: i64, message: &str) -> &mut Self {
        self.commits.insert(
            id.to_string(),
            CommitWithParents {
                id: id.to_string(),
                tree_id: format!("tree-{}", id),
                parents: parents.iter().map(|p| p.to_string()).collect(),
                message: message.to_string(),
                author: "Tester".to_string(),
                timestamp,
            },
        );
        self
    }

    /// Create or move a branch
    pub fn branch(&mut self, name: &str, commit_id: &str) -> &mut Self {
        self.branches.insert(name.to_string(), commit_id.to_string());
        self
    }

    pub fn tag(&mut self, name: &str, commit_id: &str) -> &mut Self {
        self.tags.insert(name.to_string(), commit_id.to_string());
        self
    }

    /// Point HEAD at a branch. A branch that does not exist yet leaves HEAD unborn.
    pub fn checkout(&mut self, branch: &str) -> &mut Self {
        self.head = MemoryHead::Branch(branch.to_string());
        self
    }

    pub fn detach(&mut self, commit_id: &str) -> &mut Self {
        self.head = MemoryHead::Detached(commit_id.to_string());
        self
    }
}

impl HistorySource for MemoryRepository {
    fn head_state(&self) -> Result<HeadState, RepoError> {
        Ok(match &self.head {
            MemoryHead::Unborn => HeadState::Unborn,
            MemoryHead::Branch(name) => match self.branches.get(name) {
                Some(commit_id) => HeadState::Branch {
                    name: name.clone(),
                    commit_id: commit_id.clone(),
                },
                None => HeadState::Unborn,
            },
            MemoryHead::Detached(commit_id) => HeadState::Detached {
                commit_id: commit_id.clone(),
            },
        })
    }

    fn local_branches(&self) -> Result<Vec<BranchInfo>, RepoError> {
        Ok(self
            .branches
            .iter()
            .map(|(name, commit_id)| BranchInfo {
                name: name.clone(),
                commit_id: commit_id.clone(),
            })
            .collect())
    }

    fn tags(&self) -> Result<Vec<TagInfo>, RepoError> {
        Ok(self
            .tags
            .iter()
            .map(|(name, target)| TagInfo {
                name: name.clone(),
                target: target.clone(),
            })
            .collect())
    }

    fn find_commit(&self, id: &str) -> Result<CommitWithParents, RepoError> {
        self.commits
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::CommitNotFound(id.to_string()))
    }
}
