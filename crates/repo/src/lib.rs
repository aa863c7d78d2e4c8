//! # tg repo
//!
//! Reads git metadata straight from disk (no `git` executable needed) to
//! answer two questions about a source tree:
//!
//! - **Which project is this?** [`resolve_identity`]: base58 UUIDv5 of the
//!   normalized `origin` URL and the Go module path.
//! - **Has anything changed?** [`compute_marker`]: SHA-256 over the tracked,
//!   modified, untracked and deleted source file sets.
//!
//! ```text
//! .git/index ──> Index Reader ──┐
//! .gitignore ──> Ignore Matcher ├──> File Classifier ──> Marker Computer
//! working tree ─────────────────┘
//! .git/HEAD   ──> Branch Resolver
//! .git/config + go.mod ──> Project Identity
//! ```

pub mod base58;
mod branch;
mod classify;
mod error;
mod identity;
mod ignore_rules;
mod index;
mod marker;
mod module_path;
mod repo;

pub use branch::{current_branch, normalize_branch, resolve_branch};
pub use classify::{blob_object_hash, FileClassifier, RepoScanOptions, TrackedFile};
pub use error::{RepoError, Result};
pub use identity::{
    derive_project_id, normalize_remote_url, project_id, read_origin_url, resolve_identity,
    ProjectIdentity,
};
pub use ignore_rules::IgnoreRules;
pub use index::{parse_index, parse_index_bytes, IndexEntry, INDEX_SIGNATURE};
#[cfg(any(test, feature = "test-support"))]
pub use index::{encode_index, write_index};
pub use marker::{
    combine, compute_marker, content_hash, deleted_hash, marker_from_classifier, sha256_hex,
    tracked_hash, MarkerReport,
};
pub use module_path::{find_module_file, parse_module_directive, read_module_path, MODULE_FILE_NAME};
pub use repo::RepoPaths;
