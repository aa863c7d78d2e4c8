use crate::error::{RepoError, Result};
use crate::ignore_rules::IgnoreRules;
use crate::index::{hex_lower, parse_index, IndexEntry};
use crate::repo::RepoPaths;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

const DEFAULT_SOURCE_SUFFIXES: &[&str] = &[".go"];
const DEFAULT_IGNORE_FILE: &str = ".gitignore";
const DOT_GIT: &str = ".git";

/// What counts as a source file and where ignore rules live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoScanOptions {
    /// Suffixes compared case-insensitively against the path
    pub source_suffixes: Vec<String>,
    /// Ignore file name, relative to the worktree root
    pub ignore_file: String,
}

impl Default for RepoScanOptions {
    fn default() -> Self {
        Self {
            source_suffixes: DEFAULT_SOURCE_SUFFIXES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
        }
    }
}

impl RepoScanOptions {
    pub fn is_source_file(&self, path: &str) -> bool {
        let lowered = path.to_ascii_lowercase();
        self.source_suffixes
            .iter()
            .any(|suffix| lowered.ends_with(&suffix.to_ascii_lowercase()))
    }
}

/// Path and indexed object id of a tracked source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrackedFile {
    pub path: String,
    pub object_hash: String,
}

/// Git blob object id: SHA-1 over `"blob <size>\0"` followed by the content.
pub fn blob_object_hash(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    hex_lower(&hasher.finalize())
}

/// Partitions a working tree against its index.
///
/// Without an index file every query is empty.
pub struct FileClassifier {
    root: PathBuf,
    entries: Option<Vec<IndexEntry>>,
    ignore: IgnoreRules,
    options: RepoScanOptions,
}

impl FileClassifier {
    pub fn open(repo: &RepoPaths, options: RepoScanOptions) -> Result<Self> {
        let index_path = repo.index_path();
        let entries = match parse_index(&index_path) {
            Ok(entries) => Some(entries),
            Err(RepoError::IoError(err)) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No index at {}", index_path.display());
                None
            }
            Err(err) => return Err(err),
        };
        let ignore = IgnoreRules::load(&repo.worktree_root.join(&options.ignore_file))?;
        Ok(Self {
            root: repo.worktree_root.clone(),
            entries,
            ignore,
            options,
        })
    }

    /// Classifier over an empty tree, used when no repository exists.
    pub fn empty(root: impl AsRef<Path>, options: RepoScanOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            entries: None,
            ignore: IgnoreRules::default(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries
            .iter()
            .flatten()
            .filter(|entry| self.options.is_source_file(&entry.path))
    }

    /// Index entries for source files.
    pub fn tracked(&self) -> Vec<TrackedFile> {
        self.source_entries()
            .map(|entry| TrackedFile {
                path: entry.path.clone(),
                object_hash: entry.object_hash(),
            })
            .collect()
    }

    /// Tracked files whose size or mtime moved and whose blob hash no longer
    /// matches the index.
    pub fn modified(&self) -> Result<Vec<String>> {
        let mut modified = Vec::new();
        for entry in self.source_entries() {
            let path = self.root.join(&entry.path);
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if !meta.is_file() || !stat_differs(entry, &meta) {
                continue;
            }
            let content = match fs::read(&path) {
                Ok(content) => content,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if blob_object_hash(&content) != entry.object_hash() {
                modified.push(entry.path.clone());
            }
        }
        Ok(modified)
    }

    /// Source files on disk that are neither indexed nor ignored.
    pub fn untracked(&self) -> Vec<String> {
        let Some(entries) = &self.entries else {
            return Vec::new();
        };
        let indexed: HashSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        let root = self.root.clone();
        let ignore = &self.ignore;
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if entry.file_type().is_dir() && entry.file_name() == DOT_GIT {
                    return false;
                }
                relative_slash_path(&root, entry.path())
                    .map_or(true, |rel| !ignore.is_ignored(&rel))
            });

        let mut untracked = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let Some(rel) = relative_slash_path(&self.root, entry.path()) else {
                        continue;
                    };
                    if indexed.contains(rel.as_str()) || !self.options.is_source_file(&rel) {
                        continue;
                    }
                    untracked.push(rel);
                }
                Err(err) => log::warn!("Failed to read entry: {err}"),
            }
        }
        untracked
    }

    /// Indexed source files missing from the working tree.
    pub fn deleted(&self) -> Vec<String> {
        self.source_entries()
            .filter(|entry| {
                matches!(
                    fs::symlink_metadata(self.root.join(&entry.path)),
                    Err(err) if err.kind() == ErrorKind::NotFound
                )
            })
            .map(|entry| entry.path.clone())
            .collect()
    }
}

fn stat_differs(entry: &IndexEntry, meta: &fs::Metadata) -> bool {
    #[allow(clippy::cast_possible_truncation)]
    let size = meta.len() as u32;
    if size != entry.size {
        return true;
    }
    let mtime_seconds = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    #[allow(clippy::cast_possible_truncation)]
    let mtime_seconds = mtime_seconds as u32;
    mtime_seconds != entry.mtime_seconds
}

/// `root`-relative path joined with `/`, `None` outside `root`.
pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}
