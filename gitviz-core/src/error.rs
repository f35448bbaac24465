use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading history from a repository.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("failed to open repository at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("commit {0} not found")]
    CommitNotFound(String),

    #[error("invalid commit id '{0}'")]
    InvalidId(String),

    #[error("HEAD is detached at {commit_id}; no active branch")]
    DetachedHead { commit_id: String },

    #[error("repository has no commits yet")]
    Unborn,

    #[error(transparent)]
    Git(#[from] git2::Error),
}
