//! Repository to layout in one call.

use gitviz_core::{HistorySource, Repository};
use std::path::Path;
use tracing::info;

use crate::config::GitvizConfig;
use crate::core::Dag;
use crate::error::Result;
use crate::git_backend::{ExtractMode, GitWalker};
use crate::layout::{LaneLayout, Layout};

pub fn extract<S: HistorySource + ?Sized>(source: &S, mode: ExtractMode) -> Result<Dag> {
    GitWalker::new(source)?.extract(mode)
}

/// Extract with `mode` and lay the result out with `config`
pub fn build<S: HistorySource + ?Sized>(
    source: &S,
    mode: ExtractMode,
    config: &GitvizConfig,
) -> Result<(Dag, Layout)> {
    let dag = extract(source, mode)?;
    let layout = LaneLayout::new(config.layout.clone()).layout(&dag)?;
    Ok((dag, layout))
}

/// Open the repository at `path` and extract its history
pub fn extract_path<P: AsRef<Path>>(path: P, mode: ExtractMode) -> Result<Dag> {
    let repo = Repository::open(path.as_ref())?;
    info!(path = %path.as_ref().display(), ?mode, "opened repository");
    extract(&repo, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use gitviz_core::{MemoryRepository, RepoError};
    use tempfile::TempDir;

    #[test]
    fn test_build_applies_config_spacing() {
        let mut repo = MemoryRepository::new();
        repo.commit("A", &[], 100, "a")
            .commit("B", &["A"], 200, "b")
            .branch("master", "B")
            .checkout("master");
        let config = GitvizConfig::from_toml_str("[layout]\nstep = 2.0\n").unwrap();

        let (dag, layout) = build(&repo, config.extract.mode(), &config).unwrap();

        assert_eq!(dag.node_count(), 2);
        assert_eq!(layout.position("B").unwrap().x, 2.0);
    }

    #[test]
    fn test_extract_path_reports_open_failure() {
        let temp_dir = TempDir::new().unwrap();
        let err = extract_path(temp_dir.path().join("nope"), ExtractMode::Full).unwrap_err();
        assert!(matches!(err, GraphError::RepositoryAccess(RepoError::Open { .. })));
    }

    #[test]
    fn test_extract_path_rejects_empty_repository() {
        let temp_dir = TempDir::new().unwrap();
        Repository::init(temp_dir.path()).unwrap();
        let err = extract_path(temp_dir.path(), ExtractMode::Full).unwrap_err();
        assert!(matches!(err, GraphError::RepositoryAccess(RepoError::Unborn)));
    }
}
