use serde::{Deserialize, Serialize};

/// An ancestry link between two commits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source commit ID (child)
    pub from: String,
    /// Target commit ID (parent)
    pub to: String,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Regular parent-child relationship
    Regular,
    /// Merge edge (from merge commit to one of its parents)
    Merge,
}

impl Edge {
    pub fn new(from: String, to: String) -> Self {
        Self {
            from,
            to,
            edge_type: EdgeType::Regular,
        }
    }

    pub fn merge(from: String, to: String) -> Self {
        Self {
            from,
            to,
            edge_type: EdgeType::Merge,
        }
    }

    /// Edge from a child with `parent_count` parents
    pub fn for_parent_count(from: String, to: String, parent_count: usize) -> Self {
        if parent_count > 1 {
            Self::merge(from, to)
        } else {
            Self::new(from, to)
        }
    }
}
