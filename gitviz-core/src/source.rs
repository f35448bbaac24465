use serde::{Deserialize, Serialize};

use crate::error::RepoError;

/// Commit info with parent relationships for graph building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitWithParents {
    pub id: String,
    pub tree_id: String,
    pub parents: Vec<String>,
    pub message: String,
    pub author: String,
    /// Author time, seconds since the unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub commit_id: String,
}

/// A tag peeled down to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadState {
    Branch { name: String, commit_id: String },
    Detached { commit_id: String },
    Unborn,
}

impl HeadState {
    pub fn commit_id(&self) -> Option<&str> {
        match self {
            HeadState::Branch { commit_id, .. } | HeadState::Detached { commit_id } => {
                Some(commit_id)
            }
            HeadState::Unborn => None,
        }
    }

    pub fn branch_name(&self) -> Option<&str> {
        match self {
            HeadState::Branch { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Read-only view of a repository's history.
///
/// Everything the graph extractor needs comes through this trait, so the
/// extractor never touches libgit2 directly.
pub trait HistorySource {
    fn head_state(&self) -> Result<HeadState, RepoError>;

    /// Local branches, sorted by name
    fn local_branches(&self) -> Result<Vec<BranchInfo>, RepoError>;

    /// Tags peeled to commits, sorted by name
    fn tags(&self) -> Result<Vec<TagInfo>, RepoError>;

    fn find_commit(&self, id: &str) -> Result<CommitWithParents, RepoError>;
}
