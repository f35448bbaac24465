use chrono::{TimeZone, Utc};
use gitviz_core::{BranchInfo, CommitWithParents, HeadState, HistorySource, RepoError};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

use crate::core::{CommitNode, Dag, Edge};
use crate::error::{GraphError, Result};

/// Branch name given to commits only reachable from a detached HEAD
pub const DETACHED_BRANCH: &str = "HEAD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Full ancestry of every local branch tip
    Full,
    /// The N most recent commits reachable from the active branch
    Recent(usize),
}

/// Walks a repository's history into a [`Dag`].
pub struct GitWalker<'a, S: HistorySource + ?Sized> {
    source: &'a S,
    head: HeadState,
    branches: Vec<BranchInfo>,
    /// Tip commit -> first branch (by name) pointing at it
    tips: HashMap<String, String>,
    /// Commit -> tag name; the last tag by name wins
    tags: HashMap<String, String>,
}

impl<'a, S: HistorySource + ?Sized> GitWalker<'a, S> {
    /// Snapshot HEAD, branches and tags. Fails on a repository without commits.
    pub fn new(source: &'a S) -> Result<Self> {
        let head = source.head_state()?;
        if head == HeadState::Unborn {
            return Err(RepoError::Unborn.into());
        }

        let branches = source.local_branches()?;
        let mut tips = HashMap::new();
        for branch in &branches {
            tips.entry(branch.commit_id.clone())
                .or_insert_with(|| branch.name.clone());
        }
        let tags = source
            .tags()?
            .into_iter()
            .map(|tag| (tag.target, tag.name))
            .collect();

        Ok(Self {
            source,
            head,
            branches,
            tips,
            tags,
        })
    }

    pub fn extract(&self, mode: ExtractMode) -> Result<Dag> {
        match mode {
            ExtractMode::Full => self.extract_full(),
            ExtractMode::Recent(n) => self.extract_recent(n),
        }
    }

    /// Walk every branch's first-parent spine, active branch first, then fold
    /// in merge parents that no spine claimed.
    pub fn extract_full(&self) -> Result<Dag> {
        let mut dag = Dag::new();
        let mut deferred = VecDeque::new();

        for (branch, tip) in self.branch_order() {
            debug!(branch = %branch, tip = %tip, "walking branch");
            self.walk_first_parents(&mut dag, &branch, tip, &mut deferred)?;
        }

        // Merge parents left over belong to no branch tip; they join the
        // lane of the branch that merged them.
        while let Some((branch, start)) = deferred.pop_front() {
            if dag.contains(&start) {
                continue;
            }
            debug!(branch = %branch, commit = %start, "folding merge parent into lane");
            self.walk_first_parents(&mut dag, &branch, start, &mut deferred)?;
        }

        info!(
            commits = dag.node_count(),
            edges = dag.edge_count(),
            "extracted full history"
        );
        Ok(dag)
    }

    /// Breadth-first walk from HEAD, keeping at most `n` commits.
    ///
    /// On a merge, a parent that is some branch's tip is queued under that
    /// branch; every other parent stays on the current branch.
    pub fn extract_recent(&self, n: usize) -> Result<Dag> {
        let limit = n.max(1);
        let start = match &self.head {
            HeadState::Branch { name, commit_id } => (name.clone(), commit_id.clone()),
            HeadState::Detached { commit_id } => {
                return Err(RepoError::DetachedHead {
                    commit_id: commit_id.clone(),
                }
                .into())
            }
            HeadState::Unborn => return Err(RepoError::Unborn.into()),
        };

        let mut dag = Dag::new();
        let mut queue = VecDeque::from([start]);
        // HEAD is the first commit taken
        let mut taken = 1;

        while let Some((branch, id)) = queue.pop_front() {
            // The DAG index doubles as the visited set
            if dag.contains(&id) {
                continue;
            }
            let node = self.to_node(self.source.find_commit(&id)?, &branch)?;
            let parent_count = node.parents.len();

            for parent in &node.parents {
                if taken >= limit {
                    break;
                }
                let owner = if parent_count > 1 {
                    self.tips.get(parent).unwrap_or(&branch).clone()
                } else {
                    branch.clone()
                };
                queue.push_back((owner, parent.clone()));
                dag.add_edge(Edge::for_parent_count(id.clone(), parent.clone(), parent_count));
                taken += 1;
            }
            dag.insert(node);
        }

        info!(
            limit,
            commits = dag.node_count(),
            edges = dag.edge_count(),
            "extracted recent history"
        );
        Ok(dag)
    }

    /// Active branch first, then the other local branches by name.
    ///
    /// A detached HEAD sitting on a branch tip puts that branch first. The
    /// pseudo-branch comes last so it only claims commits no branch reaches.
    fn branch_order(&self) -> Vec<(String, String)> {
        let first = match &self.head {
            HeadState::Branch { name, .. } => Some(name.as_str()),
            HeadState::Detached { commit_id } => self.tips.get(commit_id).map(String::as_str),
            HeadState::Unborn => None,
        };

        let mut order = Vec::with_capacity(self.branches.len() + 1);
        if let HeadState::Branch { name, commit_id } = &self.head {
            order.push((name.clone(), commit_id.clone()));
        }
        let (leading, rest): (Vec<&BranchInfo>, Vec<&BranchInfo>) = self
            .branches
            .iter()
            .filter(|branch| !matches!(&self.head, HeadState::Branch { name, .. } if *name == branch.name))
            .partition(|branch| Some(branch.name.as_str()) == first);
        order.extend(
            leading
                .into_iter()
                .chain(rest)
                .map(|branch| (branch.name.clone(), branch.commit_id.clone())),
        );

        if let HeadState::Detached { commit_id } = &self.head {
            order.push((DETACHED_BRANCH.to_string(), commit_id.clone()));
        }
        order
    }

    fn walk_first_parents(
        &self,
        dag: &mut Dag,
        branch: &str,
        start: String,
        deferred: &mut VecDeque<(String, String)>,
    ) -> Result<()> {
        let mut cursor = Some(start);

        while let Some(id) = cursor.take() {
            if dag.contains(&id) {
                break;
            }
            let node = self.to_node(self.source.find_commit(&id)?, branch)?;
            let parents = node.parents.clone();

            for parent in &parents {
                dag.add_edge(Edge::for_parent_count(id.clone(), parent.clone(), parents.len()));
            }
            dag.insert(node);

            for parent in parents.iter().skip(1) {
                if !dag.contains(parent) {
                    deferred.push_back((branch.to_string(), parent.clone()));
                }
            }
            cursor = parents.first().cloned();
        }
        Ok(())
    }

    /// Convert a raw commit to CommitNode
    fn to_node(&self, raw: CommitWithParents, branch: &str) -> Result<CommitNode> {
        let timestamp = Utc
            .timestamp_opt(raw.timestamp, 0)
            .single()
            .ok_or_else(|| {
                GraphError::MalformedInput(format!(
                    "commit {} has an out-of-range timestamp {}",
                    raw.id, raw.timestamp
                ))
            })?;

        Ok(CommitNode {
            is_head: self.head.commit_id() == Some(raw.id.as_str()),
            is_branch_head: self.tips.contains_key(&raw.id),
            tag: self.tags.get(&raw.id).cloned(),
            id: raw.id,
            tree_id: raw.tree_id,
            parents: raw.parents.into(),
            timestamp,
            author: raw.author,
            message: raw.message,
            branch: branch.to_string(),
        })
    }
}
