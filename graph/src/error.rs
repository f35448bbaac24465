use gitviz_core::RepoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// The repository could not be opened or its HEAD/branch state is unusable
    #[error("repository access failed: {0}")]
    RepositoryAccess(#[from] RepoError),

    /// An edge points at a commit that was never positioned
    #[error("commit {child} references {parent}, which has no position")]
    MissingParentPosition { child: String, parent: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
