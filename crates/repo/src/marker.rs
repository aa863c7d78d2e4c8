use crate::classify::{FileClassifier, RepoScanOptions, TrackedFile};
use crate::error::Result;
use crate::repo::RepoPaths;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Fingerprint of a working-tree state plus the pieces it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerReport {
    pub marker: String,
    pub tracked_hash: String,
    pub modified_hash: String,
    pub untracked_hash: String,
    pub deleted_hash: String,
    pub tracked_files: usize,
    pub modified_files: usize,
    pub untracked_files: usize,
    pub deleted_files: usize,
}

/// Compute the marker for the repository enclosing `root`.
///
/// Outside a repository all four file sets are empty.
pub fn compute_marker(root: &Path, options: &RepoScanOptions) -> Result<MarkerReport> {
    let classifier = match RepoPaths::discover(root)? {
        Some(repo) => FileClassifier::open(&repo, options.clone())?,
        None => {
            log::debug!("No repository above {}; marker covers an empty tree", root.display());
            FileClassifier::empty(root, options.clone())
        }
    };
    marker_from_classifier(&classifier)
}

pub fn marker_from_classifier(classifier: &FileClassifier) -> Result<MarkerReport> {
    let tracked = classifier.tracked();
    let modified = classifier.modified()?;
    let untracked = classifier.untracked();
    let deleted = classifier.deleted();
    let root = classifier.root();

    let tracked_hash = tracked_hash(&tracked);
    let modified_hash = content_hash(root, &modified)?;
    let untracked_hash = content_hash(root, &untracked)?;
    let deleted_hash = deleted_hash(&deleted);
    let marker = combine(&tracked_hash, &modified_hash, &untracked_hash, &deleted_hash);

    log::debug!(
        "Marker {marker}: {} tracked, {} modified, {} untracked, {} deleted",
        tracked.len(),
        modified.len(),
        untracked.len(),
        deleted.len()
    );

    Ok(MarkerReport {
        marker,
        tracked_hash,
        modified_hash,
        untracked_hash,
        deleted_hash,
        tracked_files: tracked.len(),
        modified_files: modified.len(),
        untracked_files: untracked.len(),
        deleted_files: deleted.len(),
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// `path:object_hash\n` per file, sorted by path.
pub fn tracked_hash(files: &[TrackedFile]) -> String {
    let mut sorted: Vec<&TrackedFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut hasher = Sha256::new();
    for file in sorted {
        hasher.update(file.path.as_bytes());
        hasher.update(b":");
        hasher.update(file.object_hash.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// `path:sha256(content)\n` per file, sorted by path. Files that vanish
/// while hashing are skipped.
pub fn content_hash(root: &Path, paths: &[String]) -> Result<String> {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for path in sorted {
        let content = match fs::read(root.join(path)) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        };
        hasher.update(path.as_bytes());
        hasher.update(b":");
        hasher.update(sha256_hex(&content).as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Sorted paths joined with `\n`.
pub fn deleted_hash(paths: &[String]) -> String {
    let mut sorted: Vec<&str> = paths.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sha256_hex(sorted.join("\n").as_bytes())
}

pub fn combine(tracked: &str, modified: &str, untracked: &str, deleted: &str) -> String {
    sha256_hex([tracked, modified, untracked, deleted].join("\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_sets_hash_the_empty_string() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(tracked_hash(&[]), EMPTY_SHA256);
        assert_eq!(content_hash(temp.path(), &[]).unwrap(), EMPTY_SHA256);
        assert_eq!(deleted_hash(&[]), EMPTY_SHA256);
    }

    #[test]
    fn tracked_hash_is_order_independent() {
        let a = TrackedFile {
            path: "a.go".to_string(),
            object_hash: "01".to_string(),
        };
        let b = TrackedFile {
            path: "b.go".to_string(),
            object_hash: "02".to_string(),
        };
        let forward = tracked_hash(&[a.clone(), b.clone()]);
        assert_eq!(forward, tracked_hash(&[b, a]));
        assert_eq!(forward, sha256_hex(b"a.go:01\nb.go:02\n"));
    }

    #[test]
    fn content_hash_uses_raw_sha256_and_skips_vanished_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("x.go"), "package x\n").unwrap();
        let paths = vec!["x.go".to_string(), "gone.go".to_string()];
        let expected = format!("x.go:{}\n", sha256_hex(b"package x\n"));
        assert_eq!(
            content_hash(temp.path(), &paths).unwrap(),
            sha256_hex(expected.as_bytes())
        );
    }

    #[test]
    fn deleted_hash_joins_sorted_paths() {
        let paths = vec!["b.go".to_string(), "a.go".to_string()];
        assert_eq!(deleted_hash(&paths), sha256_hex(b"a.go\nb.go"));
    }

    #[test]
    fn combine_joins_with_newlines() {
        assert_eq!(combine("1", "2", "3", "4"), sha256_hex(b"1\n2\n3\n4"));
    }

    #[test]
    fn report_serializes_camel_case() {
        let temp = tempfile::tempdir().unwrap();
        let report = compute_marker(temp.path(), &RepoScanOptions::default()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["trackedFiles"], 0);
        assert_eq!(value["deletedHash"], EMPTY_SHA256);
        assert_eq!(value["marker"], report.marker.as_str());
    }
}
