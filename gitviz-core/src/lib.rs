pub mod error;
pub mod memory;
pub mod repository;
pub mod source;

pub use error::RepoError;
pub use memory::MemoryRepository;
pub use repository::Repository;
pub use source::{BranchInfo, CommitWithParents, HeadState, HistorySource, TagInfo};
