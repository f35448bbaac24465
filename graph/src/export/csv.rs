use chrono::{TimeZone, Utc};
use csv::{Reader, StringRecord, Writer};
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::debug;

use crate::core::{CommitNode, Dag, Edge, EdgeType};
use crate::error::{GraphError, Result};
use crate::layout::chronological_order;

pub const COMMIT_COLUMNS: [&str; 8] = [
    "commit_sha",
    "tree_sha",
    "commit_msg",
    "timestamp",
    "tag",
    "branch",
    "is_head",
    "is_head_of_branch",
];

pub const EDGE_COLUMNS: [&str; 2] = ["child_sha", "parent_sha"];

/// Optional in `edges.csv`; without it the type is inferred from the child's edge count
pub const EDGE_TYPE_COLUMN: &str = "edge_type";

/// One parsed row of `commits.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRow {
    pub commit_sha: String,
    pub tree_sha: String,
    pub commit_msg: String,
    pub timestamp: i64,
    pub tag: Option<String>,
    pub branch: String,
    pub is_head: bool,
    pub is_head_of_branch: bool,
}

/// One parsed row of `edges.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRow {
    pub child_sha: String,
    pub parent_sha: String,
    pub edge_type: Option<EdgeType>,
}

fn bool_field(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Write commits earliest first, parents before children
pub fn write_commits<W: Write>(dag: &Dag, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(COMMIT_COLUMNS)?;

    for commit in chronological_order(dag)? {
        let timestamp = commit.timestamp.timestamp().to_string();
        writer.write_record([
            commit.id.as_str(),
            commit.tree_id.as_str(),
            commit.message.as_str(),
            timestamp.as_str(),
            commit.tag.as_deref().unwrap_or(""),
            commit.branch.as_str(),
            bool_field(commit.is_head),
            bool_field(commit.is_branch_head),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_edges<W: Write>(dag: &Dag, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record([EDGE_COLUMNS[0], EDGE_COLUMNS[1], EDGE_TYPE_COLUMN])?;
    for edge in dag.edges() {
        writer.write_record([edge.from.as_str(), edge.to.as_str(), edge_type_field(edge.edge_type)])?;
    }
    writer.flush()?;
    Ok(())
}

fn edge_type_field(edge_type: EdgeType) -> &'static str {
    match edge_type {
        EdgeType::Regular => "regular",
        EdgeType::Merge => "merge",
    }
}

/// Header name -> column index, failing on any missing required column
fn column_index(headers: &StringRecord, required: &[&str]) -> Result<HashMap<String, usize>> {
    let index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !index.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(GraphError::MalformedInput(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }
    Ok(index)
}

struct Fields<'r> {
    record: &'r StringRecord,
    index: &'r HashMap<String, usize>,
    line: usize,
}

impl Fields<'_> {
    fn get(&self, column: &str) -> &str {
        self.index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    fn required(&self, column: &str) -> Result<String> {
        let value = self.get(column);
        if value.is_empty() {
            return Err(GraphError::MalformedInput(format!(
                "row {}: empty {}",
                self.line, column
            )));
        }
        Ok(value.to_string())
    }

    fn boolean(&self, column: &str) -> Result<bool> {
        let value = self.get(column).trim();
        if value.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(GraphError::MalformedInput(format!(
                "row {}: {} is not a boolean: {:?}",
                self.line, column, value
            )))
        }
    }

    fn edge_type(&self, column: &str) -> Result<Option<EdgeType>> {
        let value = self.get(column).trim();
        if value.is_empty() {
            Ok(None)
        } else if value.eq_ignore_ascii_case("regular") {
            Ok(Some(EdgeType::Regular))
        } else if value.eq_ignore_ascii_case("merge") {
            Ok(Some(EdgeType::Merge))
        } else {
            Err(GraphError::MalformedInput(format!(
                "row {}: {} is not an edge type: {:?}",
                self.line, column, value
            )))
        }
    }

    fn integer(&self, column: &str) -> Result<i64> {
        let value = self.get(column).trim();
        value.parse().map_err(|_| {
            GraphError::MalformedInput(format!(
                "row {}: {} is not an integer: {:?}",
                self.line, column, value
            ))
        })
    }
}

pub fn read_commits<R: Read>(input: R) -> Result<Vec<CommitRow>> {
    let mut reader = Reader::from_reader(input);
    let index = column_index(reader.headers()?, &COMMIT_COLUMNS)?;
    let mut rows = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let fields = Fields { record: &record, index: &index, line: i + 2 };
        let tag = fields.get("tag");

        rows.push(CommitRow {
            commit_sha: fields.required("commit_sha")?,
            tree_sha: fields.get("tree_sha").to_string(),
            commit_msg: fields.get("commit_msg").to_string(),
            timestamp: fields.integer("timestamp")?,
            tag: (!tag.is_empty()).then(|| tag.to_string()),
            branch: fields.required("branch")?,
            is_head: fields.boolean("is_head")?,
            is_head_of_branch: fields.boolean("is_head_of_branch")?,
        });
    }
    Ok(rows)
}

pub fn read_edges<R: Read>(input: R) -> Result<Vec<EdgeRow>> {
    let mut reader = Reader::from_reader(input);
    let index = column_index(reader.headers()?, &EDGE_COLUMNS)?;
    let mut rows = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let fields = Fields { record: &record, index: &index, line: i + 2 };
        rows.push(EdgeRow {
            child_sha: fields.required("child_sha")?,
            parent_sha: fields.required("parent_sha")?,
            edge_type: fields.edge_type(EDGE_TYPE_COLUMN)?,
        });
    }
    Ok(rows)
}

/// Rebuild a graph from parsed tables.
///
/// Commits are inserted earliest first; an edge's position among its child's
/// edges gives the parent order. Edges without a recorded type are merges
/// when their child has more than one edge.
pub fn assemble(mut commits: Vec<CommitRow>, edges: Vec<EdgeRow>) -> Result<Dag> {
    commits.sort_by_key(|row| row.timestamp);

    let mut parents: HashMap<&str, Vec<String>> = HashMap::new();
    for edge in &edges {
        parents
            .entry(edge.child_sha.as_str())
            .or_default()
            .push(edge.parent_sha.clone());
    }

    let mut dag = Dag::new();
    for row in &commits {
        let timestamp = Utc.timestamp_opt(row.timestamp, 0).single().ok_or_else(|| {
            GraphError::MalformedInput(format!(
                "commit {} has an out of range timestamp {}",
                row.commit_sha, row.timestamp
            ))
        })?;
        let mut node = CommitNode::new(
            row.commit_sha.clone(),
            parents.get(row.commit_sha.as_str()).cloned().unwrap_or_default(),
            timestamp,
            row.commit_msg.clone(),
            row.branch.clone(),
        )
        .with_tree(row.tree_sha.clone())
        .with_head(row.is_head)
        .with_branch_head(row.is_head_of_branch);
        if let Some(tag) = &row.tag {
            node = node.with_tag(tag.clone());
        }

        if !dag.insert(node) {
            return Err(GraphError::MalformedInput(format!(
                "duplicate commit {}",
                row.commit_sha
            )));
        }
    }

    for edge in &edges {
        for id in [&edge.child_sha, &edge.parent_sha] {
            if !dag.contains(id) {
                return Err(GraphError::MalformedInput(format!(
                    "edge {} -> {} references unknown commit {}",
                    edge.child_sha, edge.parent_sha, id
                )));
            }
        }
        let parent_count = parents.get(edge.child_sha.as_str()).map_or(0, Vec::len);
        let (from, to) = (edge.child_sha.clone(), edge.parent_sha.clone());
        dag.add_edge(match edge.edge_type {
            Some(EdgeType::Merge) => Edge::merge(from, to),
            Some(EdgeType::Regular) => Edge::new(from, to),
            None => Edge::for_parent_count(from, to, parent_count),
        });
    }

    dag.validate()?;
    debug!(commits = dag.node_count(), edges = dag.edge_count(), "assembled graph from tables");
    Ok(dag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EdgeType;
    use pretty_assertions::assert_eq;

    const COMMITS: &str = "\
commit_sha,tree_sha,commit_msg,timestamp,tag,branch,is_head,is_head_of_branch
c3,t3,merge,300,v1,master,TRUE,true
c1,t1,root,100,,master,False,false
c2,t2,\"feature, part 1\",200,,feature,false,True
";

    const EDGES: &str = "\
child_sha,parent_sha
c3,c1
c3,c2
c2,c1
";

    #[test]
    fn test_reads_rows_with_any_boolean_case() {
        let rows = read_commits(COMMITS.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            CommitRow {
                commit_sha: "c3".to_string(),
                tree_sha: "t3".to_string(),
                commit_msg: "merge".to_string(),
                timestamp: 300,
                tag: Some("v1".to_string()),
                branch: "master".to_string(),
                is_head: true,
                is_head_of_branch: true,
            }
        );
        assert_eq!(rows[1].tag, None);
        assert!(!rows[1].is_head);
        assert_eq!(rows[2].commit_msg, "feature, part 1");
        assert!(rows[2].is_head_of_branch);
    }

    #[test]
    fn test_assembles_graph_in_time_order() {
        let dag = assemble(
            read_commits(COMMITS.as_bytes()).unwrap(),
            read_edges(EDGES.as_bytes()).unwrap(),
        )
        .unwrap();

        let ids: Vec<&str> = dag.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(dag.get("c3").unwrap().parents.to_vec(), vec!["c1", "c2"]);
        assert_eq!(dag.head().unwrap().id, "c3");
        assert!(dag.edges().iter().filter(|e| e.from == "c3").all(|e| e.edge_type == EdgeType::Merge));
        assert!(dag.edges().iter().filter(|e| e.from == "c2").all(|e| e.edge_type == EdgeType::Regular));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let text = "commit_sha,tree_sha,commit_msg,timestamp,tag,branch,is_head\nc1,t1,m,1,,master,True\n";
        match read_commits(text.as_bytes()) {
            Err(GraphError::MalformedInput(msg)) => assert!(msg.contains("is_head_of_branch")),
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(
            read_edges("child_sha\nc1\n".as_bytes()),
            Err(GraphError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_bad_values_are_malformed() {
        let header = COMMIT_COLUMNS.join(",");
        let bad_bool = format!("{}\nc1,t1,m,1,,master,yes,False\n", header);
        let bad_time = format!("{}\nc1,t1,m,soon,,master,True,False\n", header);
        let no_branch = format!("{}\nc1,t1,m,1,,,True,False\n", header);

        for text in [bad_bool, bad_time, no_branch] {
            assert!(
                matches!(read_commits(text.as_bytes()), Err(GraphError::MalformedInput(_))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_unknown_edge_endpoint_is_malformed() {
        let edges = read_edges("child_sha,parent_sha\nc2,ghost\n".as_bytes()).unwrap();
        let commits = read_commits(COMMITS.as_bytes()).unwrap();

        match assemble(commits, edges) {
            Err(GraphError::MalformedInput(msg)) => assert!(msg.contains("ghost")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_recorded_edge_type_wins_over_edge_count() {
        let commits = read_commits(COMMITS.as_bytes()).unwrap();
        let edges = read_edges(
            "child_sha,parent_sha,edge_type\nc3,c1,MERGE\nc2,c1,regular\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(edges[0].edge_type, Some(EdgeType::Merge));

        let dag = assemble(commits, edges).unwrap();
        assert_eq!(dag.edges()[0].edge_type, EdgeType::Merge);
        assert_eq!(dag.edges()[1].edge_type, EdgeType::Regular);

        assert!(matches!(
            read_edges("child_sha,parent_sha,edge_type\nc3,c1,octopus\n".as_bytes()),
            Err(GraphError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_edges_are_written_with_their_type() {
        let dag = assemble(
            read_commits(COMMITS.as_bytes()).unwrap(),
            read_edges(EDGES.as_bytes()).unwrap(),
        )
        .unwrap();

        let mut out = Vec::new();
        write_edges(&dag, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["child_sha,parent_sha,edge_type", "c3,c1,merge", "c3,c2,merge", "c2,c1,regular"]
        );
    }

    #[test]
    fn test_duplicate_commit_is_malformed() {
        let text = format!(
            "{}\nc1,t1,a,1,,master,True,True\nc1,t1,b,2,,master,False,False\n",
            COMMIT_COLUMNS.join(",")
        );
        let commits = read_commits(text.as_bytes()).unwrap();
        assert!(matches!(assemble(commits, Vec::new()), Err(GraphError::MalformedInput(_))));
    }

    #[test]
    fn test_writes_booleans_and_time_order() {
        let dag = assemble(
            read_commits(COMMITS.as_bytes()).unwrap(),
            read_edges(EDGES.as_bytes()).unwrap(),
        )
        .unwrap();

        let mut out = Vec::new();
        write_commits(&dag, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], COMMIT_COLUMNS.join(","));
        assert_eq!(lines[1], "c1,t1,root,100,,master,False,False");
        assert_eq!(lines[2], "c2,t2,\"feature, part 1\",200,,feature,False,True");
        assert_eq!(lines[3], "c3,t3,merge,300,v1,master,True,True");
    }
}
