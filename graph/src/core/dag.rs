use super::{edge::Edge, node::CommitNode};
use crate::error::{GraphError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Directed Acyclic Graph representing commit history.
///
/// Nodes keep their insertion order, which is the order extraction discovered
/// them in. Edges are deduplicated on `(from, to)`.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    nodes: Vec<CommitNode>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(String, String)>,
    /// Quick lookup: commit ID -> children IDs
    children: HashMap<String, Vec<String>>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit node. Returns false if a node with the same id exists,
    /// in which case the first one wins.
    pub fn insert(&mut self, node: CommitNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add an edge. Returns false for a duplicate.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.edge_keys.insert((edge.from.clone(), edge.to.clone())) {
            return false;
        }
        self.children
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());
        self.edges.push(edge);
        true
    }

    pub fn contains(&self, commit_id: &str) -> bool {
        self.index.contains_key(commit_id)
    }

    pub fn get(&self, commit_id: &str) -> Option<&CommitNode> {
        self.index.get(commit_id).map(|&i| &self.nodes[i])
    }

    /// Position of a node in insertion order
    pub fn position_of(&self, commit_id: &str) -> Option<usize> {
        self.index.get(commit_id).copied()
    }

    pub fn nodes(&self) -> &[CommitNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The commit HEAD points at, if it was extracted
    pub fn head(&self) -> Option<&CommitNode> {
        self.nodes.iter().find(|node| node.is_head)
    }

    /// Get all root commits (no parents)
    pub fn roots(&self) -> Vec<&CommitNode> {
        self.nodes.iter().filter(|node| node.is_root()).collect()
    }

    /// Get all leaf commits (no children)
    pub fn leaves(&self) -> Vec<&CommitNode> {
        self.nodes
            .iter()
            .filter(|node| !self.children.contains_key(&node.id))
            .collect()
    }

    /// Count of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Count of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if DAG contains orphan branches
    pub fn has_orphan_branches(&self) -> bool {
        self.roots().len() > 1
    }

    /// Check the structural invariants: every edge joins two known commits
    /// and exactly one commit is HEAD.
    pub fn validate(&self) -> Result<()> {
        for edge in &self.edges {
            if !self.contains(&edge.from) || !self.contains(&edge.to) {
                return Err(GraphError::MissingParentPosition {
                    child: edge.from.clone(),
                    parent: edge.to.clone(),
                });
            }
        }

        let heads = self.nodes.iter().filter(|node| node.is_head).count();
        if heads != 1 {
            return Err(GraphError::MalformedInput(format!(
                "expected exactly one HEAD commit, found {}",
                heads
            )));
        }
        Ok(())
    }

    /// Get statistics about the DAG
    pub fn stats(&self) -> DagStats {
        let merge_commits = self.nodes.iter().filter(|n| n.is_merge()).count();
        let branches: HashSet<&str> = self.nodes.iter().map(|n| n.branch.as_str()).collect();

        DagStats {
            total_commits: self.nodes.len(),
            total_edges: self.edges.len(),
            merge_commits,
            root_commits: self.roots().len(),
            leaf_commits: self.leaves().len(),
            branches: branches.len(),
            tagged_commits: self.nodes.iter().filter(|n| n.tag.is_some()).count(),
            has_orphans: self.has_orphan_branches(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DagStats {
    pub total_commits: usize,
    pub total_edges: usize,
    pub merge_commits: usize,
    pub root_commits: usize,
    pub leaf_commits: usize,
    pub branches: usize,
    pub tagged_commits: usize,
    pub has_orphans: bool,
}
