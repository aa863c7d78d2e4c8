use std::path::PathBuf;
use thiserror::Error;
use tg_cache::CacheError;
use tg_repo::RepoError;
use tg_support::FormError;
use tg_validate::ValidationError;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Request(#[from] FormError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to parse project at {root}: {source}")]
    Parser {
        root: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Unknown contracts: {0}")]
    UnknownContracts(String),
}
