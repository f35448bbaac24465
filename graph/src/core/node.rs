use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A commit node in the DAG, snapshotted at extraction time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNode {
    /// Unique commit ID (SHA)
    pub id: String,
    pub tree_id: String,
    /// Parent commit IDs, first parent first
    pub parents: SmallVec<[String; 2]>,
    /// Author timestamp
    pub timestamp: DateTime<Utc>,
    pub author: String,
    /// Commit message (short)
    pub message: String,
    /// Branch that claimed this commit during extraction
    pub branch: String,
    pub tag: Option<String>,
    pub is_head: bool,
    pub is_branch_head: bool,
}

impl CommitNode {
    pub fn new(
        id: String,
        parents: Vec<String>,
        timestamp: DateTime<Utc>,
        message: String,
        branch: String,
    ) -> Self {
        Self {
            id,
            tree_id: String::new(),
            parents: parents.into(),
            timestamp,
            author: String::new(),
            message,
            branch,
            tag: None,
            is_head: false,
            is_branch_head: false,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_tree(mut self, tree_id: impl Into<String>) -> Self {
        self.tree_id = tree_id.into();
        self
    }

    pub fn with_head(mut self, is_head: bool) -> Self {
        self.is_head = is_head;
        self
    }

    pub fn with_branch_head(mut self, is_branch_head: bool) -> Self {
        self.is_branch_head = is_branch_head;
        self
    }

    /// Check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check if this is a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// First seven characters of the id
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}
