use crate::base58;
use crate::error::Result;
use crate::module_path::read_module_path;
use crate::repo::RepoPaths;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use uuid::Uuid;

/// Stable identity of a project, independent of branch and working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdentity {
    pub project_id: String,
    /// Normalized `origin` URL, empty without a remote
    pub remote: String,
    pub module_path: String,
}

/// Resolve the identity of the project rooted at `root`.
///
/// Requires repository metadata above `root` and a non-empty module path.
/// A git config that exists but cannot be read is an error, not a missing
/// remote.
pub fn resolve_identity(root: &Path) -> Result<ProjectIdentity> {
    let repo = RepoPaths::require(root)?;
    let remote = normalize_remote_url(&read_origin_url(&repo.config_path())?);
    let module_path = read_module_path(root)?;
    let project_id = derive_project_id(&remote, &module_path);
    Ok(ProjectIdentity {
        project_id,
        remote,
        module_path,
    })
}

pub fn project_id(root: &Path) -> Result<String> {
    Ok(resolve_identity(root)?.project_id)
}

/// Base58 of UUIDv5(DNS, `remote:module` or `module`).
pub fn derive_project_id(normalized_remote: &str, module_path: &str) -> String {
    let name = if normalized_remote.is_empty() {
        module_path.to_string()
    } else {
        format!("{normalized_remote}:{module_path}")
    };
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes());
    base58::encode(uuid.as_bytes())
}

/// Raw `url` of the `origin` remote in a git config file; empty when the
/// file or the remote is absent.
pub fn read_origin_url(config_path: &Path) -> Result<String> {
    match fs::read_to_string(config_path) {
        Ok(text) => Ok(parse_origin_url(&text).unwrap_or_default()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("No git config at {}", config_path.display());
            Ok(String::new())
        }
        Err(err) => Err(err.into()),
    }
}

fn parse_origin_url(config: &str) -> Option<String> {
    let mut in_origin = false;
    for line in config.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_origin = is_origin_header(line);
            continue;
        }
        if !in_origin {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() == "url" {
            return Some(value.trim().to_string());
        }
    }
    None
}

fn is_origin_header(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact == "[remote\"origin\"]" || compact == "[remote.origin]"
}

/// Reduce a remote URL to `host/path`.
///
/// `git@host:path`, `ssh://git@host/path` and `https://host/path` all
/// normalize to the same token; standard ports and a trailing `.git` are
/// dropped.
pub fn normalize_remote_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let as_https = to_https_shape(raw);
    match split_url(&as_https) {
        Some((host, path)) => {
            let host = host
                .strip_suffix(":443")
                .or_else(|| host.strip_suffix(":22"))
                .unwrap_or(host);
            let joined = format!("{host}/{}", trim_git_suffix(path.trim_matches('/')));
            joined.trim_matches('/').to_string()
        }
        None => manual_normalize(&as_https),
    }
}

fn to_https_shape(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("ssh://") {
        let rest = rest.split_once('@').map_or(rest, |(_, host_path)| host_path);
        return format!("https://{rest}");
    }
    if !raw.contains("://") {
        if let Some((user_host, path)) = raw.split_once(':') {
            if let Some((_, host)) = user_host.split_once('@') {
                return format!("https://{host}/{}", path.trim_start_matches('/'));
            }
        }
    }
    raw.to_string()
}

/// `scheme://[user@]host[:port]/path` → `(host[:port], path)`.
fn split_url(url: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
        return None;
    }
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.is_empty() {
        return None;
    }
    Some((host, path))
}

fn manual_normalize(raw: &str) -> String {
    let without_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let trimmed = without_scheme.trim_matches('/');
    trim_git_suffix(trimmed).trim_matches('/').to_string()
}

fn trim_git_suffix(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    path.strip_suffix(".git").unwrap_or(path)
}
