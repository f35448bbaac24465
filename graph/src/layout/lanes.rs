use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::config::LayoutConfig;
use crate::core::{CommitNode, Dag, EdgeType};
use crate::decor::{RefDecorator, HEAD_LABEL};
use crate::error::{GraphError, Result};
use crate::layout::order::chronological_order;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub hovertext: String,
    pub branch: String,
    pub tag: Option<String>,
    pub is_head: bool,
    pub is_branch_head: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedEdge {
    /// Child commit
    pub from: String,
    /// Parent commit
    pub to: String,
    pub edge_type: EdgeType,
    pub midpoint_x: f64,
    pub midpoint_y: f64,
    pub hovertext: String,
}

/// One branch's row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    pub branch: String,
    /// Order in which the branch was first seen
    pub index: usize,
    pub origin_x: f64,
    pub y: i32,
}

/// Everything a drawing client needs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
    pub lanes: Vec<Lane>,
    #[serde(skip)]
    positions: HashMap<String, Point>,
}

impl Layout {
    pub fn position(&self, commit_id: &str) -> Option<Point> {
        self.positions.get(commit_id).copied()
    }

    pub fn node(&self, commit_id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id == commit_id)
    }

    pub fn lane(&self, branch: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.branch == branch)
    }

    /// Commit id -> "HEAD" for the HEAD commit only
    pub fn head_labels(&self) -> BTreeMap<String, String> {
        self.nodes
            .iter()
            .filter(|node| node.is_head)
            .map(|node| (node.id.clone(), HEAD_LABEL.to_string()))
            .collect()
    }

    /// A one-commit graph is drawn as a lone centred node
    pub fn is_placeholder(&self) -> bool {
        self.nodes.len() == 1
    }
}

/// Height of the lane opened `index`-th: 0, 1, -1, 2, -2, ...
pub fn lane_height(index: usize) -> i32 {
    let magnitude = index.div_ceil(2) as i32;
    if index % 2 == 1 {
        magnitude
    } else {
        -magnitude
    }
}

/// Running state of one branch's lane
#[derive(Debug, Clone, Copy, PartialEq)]
struct LaneState {
    index: usize,
    origin_x: f64,
    x: f64,
    y: i32,
}

impl LaneState {
    fn open(index: usize, origin_x: f64) -> Self {
        Self {
            index,
            origin_x,
            x: origin_x,
            y: lane_height(index),
        }
    }

    fn advance(self, step: f64) -> Self {
        Self {
            x: self.x + step,
            ..self
        }
    }
}

/// Assigns every branch its own row and walks commits along it.
///
/// A heuristic for shallow branching: no crossing minimisation, one lane per
/// branch name, lanes fanned out above and below the first one.
#[derive(Debug, Clone, Default)]
pub struct LaneLayout {
    config: LayoutConfig,
    decorator: RefDecorator,
}

impl LaneLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            decorator: RefDecorator::default(),
        }
    }

    pub fn layout(&self, dag: &Dag) -> Result<Layout> {
        match dag.node_count() {
            0 => return Ok(Layout::default()),
            1 => return self.placeholder(dag),
            _ => {}
        }

        let order = chronological_order(dag)?;
        let first_parent = first_parents(dag);
        let mut lanes: HashMap<&str, LaneState> = HashMap::new();
        let mut positions: HashMap<String, Point> = HashMap::with_capacity(order.len());
        let mut nodes = Vec::with_capacity(order.len());

        for commit in order {
            let state = match lanes.get(commit.branch.as_str()) {
                Some(state) => state.advance(self.config.step),
                None => {
                    let origin_x = match first_parent.get(commit.id.as_str()) {
                        Some(&parent) => {
                            let parent_pos = positions.get(parent).ok_or_else(|| {
                                GraphError::MissingParentPosition {
                                    child: commit.id.clone(),
                                    parent: parent.to_string(),
                                }
                            })?;
                            parent_pos.x + self.config.branch_offset
                        }
                        None => 0.0,
                    };
                    let state = LaneState::open(lanes.len(), origin_x);
                    debug!(branch = %commit.branch, y = state.y, origin_x, "opened lane");
                    state
                }
            };
            lanes.insert(commit.branch.as_str(), state);

            let point = Point {
                x: state.x,
                y: f64::from(state.y),
            };
            positions.insert(commit.id.clone(), point);
            nodes.push(self.positioned(commit, point));
        }

        let edges = positioned_edges(dag, &positions)?;
        let mut lanes: Vec<Lane> = lanes
            .into_iter()
            .map(|(branch, state)| Lane {
                branch: branch.to_string(),
                index: state.index,
                origin_x: state.origin_x,
                y: state.y,
            })
            .collect();
        lanes.sort_by_key(|lane| lane.index);

        info!(nodes = nodes.len(), lanes = lanes.len(), "laid out graph");
        Ok(Layout {
            nodes,
            edges,
            lanes,
            positions,
        })
    }

    fn placeholder(&self, dag: &Dag) -> Result<Layout> {
        if let Some(edge) = dag.edges().first() {
            return Err(GraphError::MissingParentPosition {
                child: edge.from.clone(),
                parent: edge.to.clone(),
            });
        }

        let commit = &dag.nodes()[0];
        let [x, y] = self.config.placeholder;
        let point = Point { x, y };

        Ok(Layout {
            nodes: vec![self.positioned(commit, point)],
            edges: Vec::new(),
            lanes: Vec::new(),
            positions: HashMap::from([(commit.id.clone(), point)]),
        })
    }

    fn positioned(&self, commit: &CommitNode, point: Point) -> PositionedNode {
        let decoration = self.decorator.decorate(commit);
        PositionedNode {
            id: commit.id.clone(),
            x: point.x,
            y: point.y,
            label: decoration.label,
            hovertext: decoration.hovertext,
            branch: commit.branch.clone(),
            tag: commit.tag.clone(),
            is_head: commit.is_head,
            is_branch_head: commit.is_branch_head,
        }
    }
}

/// Child id -> first parent id, taken from the edges
fn first_parents(dag: &Dag) -> HashMap<&str, &str> {
    let mut parents = HashMap::new();
    for edge in dag.edges() {
        parents.entry(edge.from.as_str()).or_insert(edge.to.as_str());
    }
    parents
}

fn positioned_edges(dag: &Dag, positions: &HashMap<String, Point>) -> Result<Vec<PositionedEdge>> {
    dag.edges()
        .iter()
        .map(|edge| {
            let missing = || GraphError::MissingParentPosition {
                child: edge.from.clone(),
                parent: edge.to.clone(),
            };
            let from = positions.get(&edge.from).ok_or_else(missing)?;
            let to = positions.get(&edge.to).ok_or_else(missing)?;
            let mid = from.midpoint(*to);

            Ok(PositionedEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                edge_type: edge.edge_type,
                midpoint_x: mid.x,
                midpoint_y: mid.y,
                hovertext: edge.from.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Edge;
    use crate::git_backend::GitWalker;
    use chrono::{TimeZone, Utc};
    use gitviz_core::MemoryRepository;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn node(id: &str, parents: &[&str], secs: i64, branch: &str) -> CommitNode {
        CommitNode::new(
            id.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
            Utc.timestamp_opt(secs, 0).unwrap(),
            format!("commit {}", id),
            branch.to_string(),
        )
    }

    fn at(layout: &Layout, id: &str) -> (f64, f64) {
        let p = layout.position(id).unwrap();
        (p.x, p.y)
    }

    #[test]
    fn test_lane_heights_alternate_around_trunk() {
        let heights: Vec<i32> = (0..7).map(lane_height).collect();
        assert_eq!(heights, vec![0, 1, -1, 2, -2, 3, -3]);
    }

    #[test]
    fn test_linear_history_stays_on_one_lane() -> Result<()> {
        let mut repo = MemoryRepository::new();
        repo.commit("A", &[], 100, "a")
            .commit("B", &["A"], 200, "b")
            .commit("C", &["B"], 300, "c")
            .branch("master", "C")
            .checkout("master");
        let dag = GitWalker::new(&repo)?.extract_full()?;

        let layout = LaneLayout::default().layout(&dag)?;

        assert_eq!(at(&layout, "A"), (0.0, 0.0));
        assert_eq!(at(&layout, "B"), (0.5, 0.0));
        assert_eq!(at(&layout, "C"), (1.0, 0.0));
        assert_eq!(layout.lanes.len(), 1);
        assert_eq!(
            layout.head_labels(),
            BTreeMap::from([("C".to_string(), "HEAD".to_string())])
        );
        assert_eq!(layout.node("C").unwrap().label, "HEAD");
        assert_eq!(layout.node("A").unwrap().label, "");
        Ok(())
    }

    #[test]
    fn test_merged_branch_gets_its_own_lane() -> Result<()> {
        let mut repo = MemoryRepository::new();
        repo.commit("A", &[], 100, "root")
            .commit("B", &["A"], 200, "base")
            .commit("C", &["B"], 300, "other work")
            .commit("D", &["B", "C"], 400, "merge other")
            .commit("E", &["C"], 500, "more other work")
            .branch("master", "D")
            .branch("other", "E")
            .checkout("master");
        let dag = GitWalker::new(&repo)?.extract_full()?;

        let layout = LaneLayout::default().layout(&dag)?;

        assert_eq!(at(&layout, "A"), (0.0, 0.0));
        assert_eq!(at(&layout, "B"), (0.5, 0.0));
        assert_eq!(at(&layout, "C"), (0.75, 1.0));
        assert_eq!(at(&layout, "D"), (1.0, 0.0));
        assert_eq!(at(&layout, "E"), (1.25, 1.0));
        assert_eq!(layout.lane("other").unwrap().origin_x, 0.75);

        let merge_edges: Vec<&PositionedEdge> =
            layout.edges.iter().filter(|e| e.from == "D").collect();
        assert_eq!(merge_edges.len(), 2);
        let to_c = merge_edges.iter().find(|e| e.to == "C").unwrap();
        assert_eq!((to_c.midpoint_x, to_c.midpoint_y), (0.875, 0.5));
        assert_eq!(to_c.edge_type, EdgeType::Merge);
        assert_eq!(to_c.hovertext, "D");
        Ok(())
    }

    #[test]
    fn test_every_branch_gets_a_distinct_height() -> Result<()> {
        let mut dag = Dag::new();
        dag.insert(node("root", &[], 0, "master").with_head(true));
        for (i, branch) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            let id = format!("{}1", branch);
            dag.insert(node(&id, &["root"], 10 + i as i64, branch));
            dag.add_edge(Edge::new(id, "root".to_string()));
        }

        let layout = LaneLayout::default().layout(&dag)?;

        let heights: HashSet<i32> = layout.lanes.iter().map(|lane| lane.y).collect();
        assert_eq!(layout.lanes.len(), 7);
        assert_eq!(heights.len(), 7);
        assert_eq!(layout.lane("master").unwrap().y, 0);
        assert_eq!(layout.lane("a").unwrap().y, 1);
        assert_eq!(layout.lane("b").unwrap().y, -1);
        Ok(())
    }

    #[test]
    fn test_lane_x_increases_with_time() -> Result<()> {
        let mut repo = MemoryRepository::new();
        repo.commit("A", &[], 100, "a")
            .commit("B", &["A"], 200, "b")
            .commit("F1", &["B"], 250, "f1")
            .commit("C", &["B"], 300, "c")
            .commit("F2", &["F1"], 350, "f2")
            .commit("D", &["C", "F2"], 400, "merge")
            .commit("F3", &["F2"], 450, "f3")
            .branch("master", "D")
            .branch("feature", "F3")
            .checkout("master");
        let dag = GitWalker::new(&repo)?.extract_full()?;
        let layout = LaneLayout::default().layout(&dag)?;

        for lane in &layout.lanes {
            let mut commits: Vec<&CommitNode> =
                dag.nodes().iter().filter(|n| n.branch == lane.branch).collect();
            commits.sort_by_key(|n| n.timestamp);
            let xs: Vec<f64> = commits.iter().map(|n| layout.position(&n.id).unwrap().x).collect();
            assert_eq!(xs[0], lane.origin_x);
            assert!(xs.windows(2).all(|w| w[0] < w[1]), "{}: {:?}", lane.branch, xs);
        }
        Ok(())
    }

    #[test]
    fn test_single_commit_is_a_placeholder() -> Result<()> {
        let mut dag = Dag::new();
        dag.insert(node("only", &[], 100, "master").with_head(true));

        let layout = LaneLayout::default().layout(&dag)?;

        assert!(layout.is_placeholder());
        assert_eq!(at(&layout, "only"), (1.0, 1.0));
        assert!(layout.edges.is_empty());
        assert!(layout.lanes.is_empty());
        assert_eq!(layout.nodes[0].label, "HEAD");
        Ok(())
    }

    #[test]
    fn test_empty_graph_has_empty_layout() -> Result<()> {
        let layout = LaneLayout::default().layout(&Dag::new())?;
        assert_eq!(layout, Layout::default());
        Ok(())
    }

    #[test]
    fn test_unknown_parent_of_new_lane_is_an_error() {
        let mut dag = Dag::new();
        dag.insert(node("A", &[], 100, "master").with_head(true));
        dag.insert(node("B", &["A"], 200, "master"));
        dag.insert(node("X", &["ghost"], 300, "feature"));
        dag.add_edge(Edge::new("B".to_string(), "A".to_string()));
        dag.add_edge(Edge::new("X".to_string(), "ghost".to_string()));

        match LaneLayout::default().layout(&dag) {
            Err(GraphError::MissingParentPosition { child, parent }) => {
                assert_eq!(child, "X");
                assert_eq!(parent, "ghost");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_parent_on_known_lane_is_not_dropped() {
        let mut dag = Dag::new();
        dag.insert(node("A", &[], 100, "master").with_head(true));
        dag.insert(node("B", &["A", "ghost"], 200, "master"));
        dag.add_edge(Edge::merge("B".to_string(), "A".to_string()));
        dag.add_edge(Edge::merge("B".to_string(), "ghost".to_string()));

        assert!(matches!(
            LaneLayout::default().layout(&dag),
            Err(GraphError::MissingParentPosition { .. })
        ));
    }

    #[test]
    fn test_layout_is_deterministic() -> Result<()> {
        let mut dag = Dag::new();
        dag.insert(node("A", &[], 100, "master"));
        dag.insert(node("B", &["A"], 100, "topic"));
        dag.insert(node("C", &["A"], 100, "master").with_head(true));
        dag.add_edge(Edge::new("B".to_string(), "A".to_string()));
        dag.add_edge(Edge::new("C".to_string(), "A".to_string()));

        let engine = LaneLayout::default();
        assert_eq!(engine.layout(&dag)?, engine.layout(&dag)?);
        Ok(())
    }

    #[test]
    fn test_spacing_follows_config() -> Result<()> {
        let mut dag = Dag::new();
        dag.insert(node("A", &[], 100, "master"));
        dag.insert(node("B", &["A"], 200, "master").with_head(true));
        dag.insert(node("T", &["A"], 300, "topic"));
        dag.add_edge(Edge::new("B".to_string(), "A".to_string()));
        dag.add_edge(Edge::new("T".to_string(), "A".to_string()));

        let engine = LaneLayout::new(LayoutConfig {
            branch_offset: 0.5,
            step: 2.0,
            ..LayoutConfig::default()
        });
        let layout = engine.layout(&dag)?;

        assert_eq!(at(&layout, "B"), (2.0, 0.0));
        assert_eq!(at(&layout, "T"), (0.5, 1.0));
        Ok(())
    }
}
