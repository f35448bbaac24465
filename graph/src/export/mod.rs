//! Two-table CSV form of a commit graph.
//!
//! `commits.csv` holds one row per commit and `edges.csv` one row per
//! child/parent link. A directory holding both can be laid out without
//! access to the repository it came from.

pub mod csv;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::core::Dag;
use crate::error::Result;

pub use self::csv::{
    assemble, read_commits, read_edges, write_commits, write_edges, CommitRow, EdgeRow,
    COMMIT_COLUMNS, EDGE_COLUMNS, EDGE_TYPE_COLUMN,
};

pub const COMMITS_FILE: &str = "commits.csv";
pub const EDGES_FILE: &str = "edges.csv";

/// Write both tables into `dir`, creating it if needed
pub fn export_dir<P: AsRef<Path>>(dag: &Dag, dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    write_commits(dag, BufWriter::new(File::create(dir.join(COMMITS_FILE))?))?;
    write_edges(dag, BufWriter::new(File::create(dir.join(EDGES_FILE))?))?;

    info!(dir = %dir.display(), commits = dag.node_count(), edges = dag.edge_count(), "exported graph");
    Ok(())
}

pub fn import_dir<P: AsRef<Path>>(dir: P) -> Result<Dag> {
    let dir = dir.as_ref();
    let commits = read_commits(File::open(dir.join(COMMITS_FILE))?)?;
    let edges = read_edges(File::open(dir.join(EDGES_FILE))?)?;

    let dag = assemble(commits, edges)?;
    info!(dir = %dir.display(), commits = dag.node_count(), "imported graph");
    Ok(dag)
}
