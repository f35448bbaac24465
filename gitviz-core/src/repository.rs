use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repository, RepositoryInitOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::RepoError;
use crate::source::{BranchInfo, CommitWithParents, HeadState, HistorySource, TagInfo};

/// Read-only handle on an on-disk git repository
pub struct Repository {
    path: PathBuf,
    git_repo: Git2Repository,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").field("path", &self.path).finish()
    }
}

impl Repository {
    /// Open an existing repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepoError> {
        let path = path.as_ref().to_path_buf();
        let git_repo = Git2Repository::open(&path).map_err(|source| RepoError::Open {
            path: path.clone(),
            source,
        })?;

        Ok(Repository { path, git_repo })
    }

    /// Initialize a new repository whose unborn HEAD points at `master`
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Self, RepoError> {
        let path = path.as_ref().to_path_buf();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let git_repo = Git2Repository::init_opts(&path, &opts)?;

        Ok(Repository { path, git_repo })
    }

    /// Underlying libgit2 handle, for fixtures that need to write history
    pub fn git(&self) -> &Git2Repository {
        &self.git_repo
    }

    fn parse_oid(id: &str) -> Result<Oid, RepoError> {
        Oid::from_str(id).map_err(|_| RepoError::InvalidId(id.to_string()))
    }
}

impl HistorySource for Repository {
    fn head_state(&self) -> Result<HeadState, RepoError> {
        let head = match self.git_repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(HeadState::Unborn);
            }
            Err(e) => return Err(e.into()),
        };
        let commit_id = head.peel_to_commit()?.id().to_string();

        if self.git_repo.head_detached()? {
            Ok(HeadState::Detached { commit_id })
        } else {
            let name = head.shorthand().unwrap_or("HEAD").to_string();
            Ok(HeadState::Branch { name, commit_id })
        }
    }

    fn local_branches(&self) -> Result<Vec<BranchInfo>, RepoError> {
        let mut branches = Vec::new();

        for branch in self.git_repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                debug!("skipping branch with a non-utf8 name");
                continue;
            };
            let commit = branch.get().peel_to_commit()?;

            branches.push(BranchInfo {
                name,
                commit_id: commit.id().to_string(),
            });
        }

        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    fn tags(&self) -> Result<Vec<TagInfo>, RepoError> {
        let mut tags = Vec::new();
        let tag_names = self.git_repo.tag_names(None)?;

        for name in tag_names.iter().flatten() {
            let object = self.git_repo.revparse_single(&format!("refs/tags/{}", name))?;
            // Tags on trees or blobs have no place in a commit graph
            match object.peel_to_commit() {
                Ok(commit) => tags.push(TagInfo {
                    name: name.to_string(),
                    target: commit.id().to_string(),
                }),
                Err(_) => debug!(tag = name, "tag does not point at a commit"),
            }
        }

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn find_commit(&self, id: &str) -> Result<CommitWithParents, RepoError> {
        let oid = Self::parse_oid(id)?;
        let commit = self.git_repo.find_commit(oid).map_err(|e| match e.code() {
            ErrorCode::NotFound => RepoError::CommitNotFound(id.to_string()),
            _ => RepoError::Git(e),
        })?;
        let author = commit.author();

        Ok(CommitWithParents {
            id: oid.to_string(),
            tree_id: commit.tree_id().to_string(),
            parents: commit.parent_ids().map(|p| p.to_string()).collect(),
            message: commit.summary().unwrap_or("").to_string(),
            author: author.name().unwrap_or("").to_string(),
            timestamp: author.when().seconds(),
        })
    }
}
