use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepoError>;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Unsupported index version: {0}")]
    UnsupportedIndexVersion(u32),

    #[error("Malformed .git file (expected 'gitdir: <path>'): {0}")]
    MalformedGitFile(PathBuf),

    #[error("No git repository found above {0}")]
    RepositoryNotFound(PathBuf),

    #[error("No go.mod found above {0}")]
    ModuleFileNotFound(PathBuf),

    #[error("Empty module path in {0}")]
    EmptyModulePath(PathBuf),
}
