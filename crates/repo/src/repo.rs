use crate::error::{RepoError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DOT_GIT: &str = ".git";
const GITDIR_PREFIX: &str = "gitdir:";

/// Resolved locations of a repository's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Directory holding `.git` (index paths are relative to it)
    pub worktree_root: PathBuf,
    /// Per-worktree metadata directory (`HEAD`, `index`)
    pub git_dir: PathBuf,
    /// Shared metadata directory (`config`); equals `git_dir` outside linked worktrees
    pub common_dir: PathBuf,
}

impl RepoPaths {
    /// Walk upward from `start` looking for a `.git` directory, or a `.git` file
    /// whose first line reads `gitdir: <path>`.
    ///
    /// Returns `Ok(None)` when no ancestor carries repository metadata.
    pub fn discover(start: &Path) -> Result<Option<Self>> {
        let start = fs::canonicalize(start)?;
        for dir in start.ancestors() {
            let candidate = dir.join(DOT_GIT);
            if candidate.is_dir() {
                return Ok(Some(Self::from_git_dir(dir, candidate)?));
            }
            if candidate.is_file() {
                let git_dir = read_gitdir_file(&candidate, dir)?;
                return Ok(Some(Self::from_git_dir(dir, git_dir)?));
            }
        }
        Ok(None)
    }

    /// Like [`RepoPaths::discover`] but absence is an error.
    pub fn require(start: &Path) -> Result<Self> {
        Self::discover(start)?.ok_or_else(|| RepoError::RepositoryNotFound(start.to_path_buf()))
    }

    fn from_git_dir(worktree_root: &Path, git_dir: PathBuf) -> Result<Self> {
        let common_dir = resolve_common_dir(&git_dir)?;
        Ok(Self {
            worktree_root: worktree_root.to_path_buf(),
            git_dir,
            common_dir,
        })
    }

    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    pub fn head_path(&self) -> PathBuf {
        self.git_dir.join("HEAD")
    }

    pub fn config_path(&self) -> PathBuf {
        self.common_dir.join("config")
    }
}

/// Reads `gitdir: <path>`; relative paths resolve against the directory
/// containing the `.git` file.
fn read_gitdir_file(dot_git_file: &Path, base_dir: &Path) -> Result<PathBuf> {
    let content = fs::read_to_string(dot_git_file)?;
    let target = parse_gitdir_line(&content)
        .ok_or_else(|| RepoError::MalformedGitFile(dot_git_file.to_path_buf()))?;
    Ok(base_dir.join(target))
}

fn parse_gitdir_line(content: &str) -> Option<&str> {
    let first = content.lines().next()?;
    let target = first.strip_prefix(GITDIR_PREFIX)?.trim();
    (!target.is_empty()).then_some(target)
}

/// Linked worktrees point at the main repository through a `commondir` file.
fn resolve_common_dir(git_dir: &Path) -> Result<PathBuf> {
    let commondir_file = git_dir.join("commondir");
    if !commondir_file.is_file() {
        return Ok(git_dir.to_path_buf());
    }
    let content = fs::read_to_string(&commondir_file)?;
    match content.lines().next().map(str::trim) {
        Some(rel) if !rel.is_empty() => Ok(git_dir.join(rel)),
        _ => Ok(git_dir.to_path_buf()),
    }
}
