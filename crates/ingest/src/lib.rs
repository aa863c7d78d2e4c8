//! # tg ingest
//!
//! Turns a host request into a validated project model, reusing the cached
//! model when the working tree has not changed since it was built.
//!
//! The cache key is `(project id, branch)` and an entry is only trusted when
//! its stored marker matches the current one. Without repository metadata
//! the project is parsed and validated on every call and nothing is cached.

mod error;
mod ingestor;
mod options;
mod parser;

pub use error::{IngestError, Result};
pub use ingestor::{
    apply_filter, debug_dump_path, IngestOutcome, Ingestor, DEBUG_DUMP_DIR, RESPONSE_FROM_CACHE,
};
pub use options::{IngestOptions, IngestRequest, DEFAULT_CONTRACTS_DIR, PROJECT_KEY};
pub use parser::{ModelFileParser, ProjectParser};
