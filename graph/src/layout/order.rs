use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::core::{CommitNode, Dag};
use crate::error::{GraphError, Result};

/// Commits earliest first.
///
/// Timestamps alone are not enough: commits created within the same second,
/// or with skewed clocks, would let a child come before its parent. Among the
/// commits whose in-DAG parents are all placed, the earliest goes next, with
/// extraction order breaking ties. Edges to commits outside the DAG impose no
/// ordering.
pub fn chronological_order(dag: &Dag) -> Result<Vec<&CommitNode>> {
    let nodes = dag.nodes();
    let mut pending_parents = vec![0usize; nodes.len()];
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();

    for edge in dag.edges() {
        if let (Some(child), Some(parent)) = (dag.position_of(&edge.from), dag.position_of(&edge.to)) {
            pending_parents[child] += 1;
            children.entry(parent).or_default().push(child);
        }
    }

    let mut ready: BinaryHeap<Reverse<(i64, usize)>> = pending_parents
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(i, _)| Reverse((nodes[i].timestamp.timestamp(), i)))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse((_, i))) = ready.pop() {
        order.push(&nodes[i]);
        for &child in children.get(&i).map(Vec::as_slice).unwrap_or_default() {
            pending_parents[child] -= 1;
            if pending_parents[child] == 0 {
                ready.push(Reverse((nodes[child].timestamp.timestamp(), child)));
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(GraphError::MalformedInput(format!(
            "edges form a cycle through {} commits",
            nodes.len() - order.len()
        )));
    }
    Ok(order)
}
