use crate::error::{CacheError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tg_model::Project;
use tg_repo::normalize_branch;

/// Extension of cache entries (`<base>/<projectID>/<branch>.astg`).
pub const CACHE_FILE_EXTENSION: &str = "astg";

const CACHE_DIR_NAME: &str = "tg";
const CACHE_SUBDIR_NAME: &str = "astg";

/// Identifies one cache entry and the state it must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub project_id: String,
    /// Raw branch name; normalized when building the path
    pub branch: String,
    pub marker: String,
}

impl CacheKey {
    pub fn new(
        project_id: impl Into<String>,
        branch: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            branch: branch.into(),
            marker: marker.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheMissReason {
    Missing,
    NotAFile,
    Corrupt,
    ProjectIdEmpty,
    ProjectIdMismatch,
    MarkerEmpty,
    MarkerMismatch,
}

impl fmt::Display for CacheMissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Missing => "missing",
            Self::NotAFile => "not a file",
            Self::Corrupt => "corrupt",
            Self::ProjectIdEmpty => "empty project id",
            Self::ProjectIdMismatch => "project id mismatch",
            Self::MarkerEmpty => "empty marker",
            Self::MarkerMismatch => "marker mismatch",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Box<Project>),
    Miss(CacheMissReason),
}

impl CacheLookup {
    pub fn into_project(self) -> Option<Project> {
        match self {
            Self::Hit(project) => Some(*project),
            Self::Miss(_) => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// File-backed cache of fully built projects keyed by project id and branch.
#[derive(Debug, Clone)]
pub struct CacheStore {
    base: PathBuf,
}

impl CacheStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// `<user cache dir>/tg/astg`, or the temp dir when the platform has no
    /// cache dir.
    pub fn default_base() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_DIR_NAME)
            .join(CACHE_SUBDIR_NAME)
    }

    pub fn at_default_location() -> Self {
        Self::new(Self::default_base())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn entry_path(&self, project_id: &str, branch: &str) -> PathBuf {
        self.base
            .join(project_id)
            .join(format!("{}.{CACHE_FILE_EXTENSION}", normalize_branch(branch)))
    }

    /// Stamp `project` with the key's project id and marker and persist it.
    ///
    /// The entry is written next to its final path and renamed into place;
    /// on failure the partial file is removed before the error returns.
    pub fn save(&self, project: &mut Project, key: &CacheKey) -> Result<PathBuf> {
        if key.project_id.is_empty() {
            return Err(CacheError::EmptyProjectId);
        }
        project.project_id.clone_from(&key.project_id);
        project.marker.clone_from(&key.marker);

        let path = self.entry_path(&key.project_id, &key.branch);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(project)?;
        let tmp = path.with_extension(format!("{CACHE_FILE_EXTENSION}.tmp"));
        if let Err(err) = write_compressed(&tmp, &json).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }

        log::debug!("Cached project {} at {}", key.project_id, path.display());
        Ok(path)
    }

    /// Load the entry for `key` if it was built from the same project and
    /// working-tree state.
    ///
    /// Undecodable entries are deleted and other read errors propagate.
    /// Entries for another project or marker are left in place.
    pub fn load(&self, key: &CacheKey) -> Result<CacheLookup> {
        let path = self.entry_path(&key.project_id, &key.branch);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No cache entry at {}", path.display());
                return Ok(CacheLookup::Miss(CacheMissReason::Missing));
            }
            Err(err) => return Err(err.into()),
        };
        if meta.is_dir() {
            return Ok(CacheLookup::Miss(CacheMissReason::NotAFile));
        }

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(CacheLookup::Miss(CacheMissReason::Missing));
            }
            Err(err) => return Err(err.into()),
        };
        let bytes = match decode_compressed(file) {
            Ok(bytes) => bytes,
            Err(err) if is_corrupt(&err) => {
                log::warn!("Cache entry {} is not valid gzip: {err}", path.display());
                remove_corrupt(&path);
                return Ok(CacheLookup::Miss(CacheMissReason::Corrupt));
            }
            Err(err) => return Err(err.into()),
        };
        let project: Project = match serde_json::from_slice(&bytes) {
            Ok(project) => project,
            Err(err) => {
                log::warn!("Cache entry {} does not decode: {err}", path.display());
                remove_corrupt(&path);
                return Ok(CacheLookup::Miss(CacheMissReason::Corrupt));
            }
        };

        let verdict = if project.project_id.is_empty() {
            Some(CacheMissReason::ProjectIdEmpty)
        } else if project.project_id != key.project_id {
            Some(CacheMissReason::ProjectIdMismatch)
        } else if project.marker.is_empty() {
            Some(CacheMissReason::MarkerEmpty)
        } else if project.marker != key.marker {
            Some(CacheMissReason::MarkerMismatch)
        } else {
            None
        };

        match verdict {
            Some(reason) => {
                log::debug!("Cache entry {} rejected: {reason}", path.display());
                Ok(CacheLookup::Miss(reason))
            }
            None => Ok(CacheLookup::Hit(Box::new(project))),
        }
    }

    /// Drop the entry for `project_id`/`branch`; `false` when there was none.
    pub fn remove(&self, project_id: &str, branch: &str) -> Result<bool> {
        match fs::remove_file(self.entry_path(project_id, branch)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn write_compressed(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    encoder.write_all(bytes)?;
    let writer = encoder.finish()?;
    let file = writer.into_inner().map_err(std::io::IntoInnerError::into_error)?;
    file.sync_all()
}

fn decode_compressed(file: File) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Decoder errors that mean the stored bytes are bad, not the filesystem.
fn is_corrupt(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof
    )
}

fn remove_corrupt(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        log::warn!("Failed to remove corrupt cache entry {}: {err}", path.display());
    }
}
