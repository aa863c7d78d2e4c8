use crate::error::Result;
use crate::repo::RepoPaths;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const HEAD_REF_PREFIX: &str = "ref: refs/heads/";
const DEFAULT_BRANCH_TOKEN: &str = "default";
const MAX_BRANCH_TOKEN_BYTES: usize = 255;

/// Branch checked out in `repo`, empty for a detached or unreadable HEAD.
pub fn current_branch(repo: &RepoPaths) -> Result<String> {
    let head_path = repo.head_path();
    let head = match fs::read_to_string(&head_path) {
        Ok(head) => head,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("No HEAD at {}", head_path.display());
            return Ok(String::new());
        }
        Err(err) => return Err(err.into()),
    };
    Ok(branch_from_head(&head).to_string())
}

/// Branch of the repository enclosing `start`; empty when there is none.
pub fn resolve_branch(start: &Path) -> Result<String> {
    match RepoPaths::discover(start)? {
        Some(repo) => current_branch(&repo),
        None => Ok(String::new()),
    }
}

fn branch_from_head(head: &str) -> &str {
    head.lines()
        .next()
        .and_then(|line| line.trim().strip_prefix(HEAD_REF_PREFIX))
        .map_or("", str::trim)
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_whitespace()
}

/// Turn a branch name into a token safe to use as a file name.
///
/// Runs of separators, wildcards and whitespace become one `-`; leading and
/// trailing `-`/`.` are stripped; the result is capped at 255 bytes. Anything
/// that reduces to nothing becomes `default`.
pub fn normalize_branch(branch: &str) -> String {
    let mut token = String::with_capacity(branch.len());
    for c in branch.chars() {
        let c = if is_forbidden(c) { '-' } else { c };
        if c == '-' && token.ends_with('-') {
            continue;
        }
        token.push(c);
    }

    let mut token = token.trim_matches(|c| c == '-' || c == '.').to_string();
    if token.len() > MAX_BRANCH_TOKEN_BYTES {
        let mut cut = MAX_BRANCH_TOKEN_BYTES;
        while !token.is_char_boundary(cut) {
            cut -= 1;
        }
        token.truncate(cut);
        token.truncate(token.trim_end_matches('-').len());
    }

    if token.is_empty() {
        DEFAULT_BRANCH_TOKEN.to_string()
    } else {
        token
    }
}
