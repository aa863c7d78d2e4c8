use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One parsed ignore line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// `name/`: the directory at any depth, and everything below it
    Dir(String),
    /// `/name` or `/name/`: anchored at the repository root, with its subtree
    Rooted(String),
    /// `prefix*`, `*suffix`, `prefix*suffix`; a leading `/` is dropped
    Wildcard { prefix: String, suffix: String },
    /// exact path or its subtree
    Literal(String),
}

impl Pattern {
    fn parse(line: &str) -> Option<Self> {
        let rooted = line.starts_with('/');
        let body = line.trim_start_matches('/');
        if body.contains('*') {
            // Wildcards are matched from the root, rooted or not.
            let (prefix, rest) = body.split_once('*')?;
            let suffix = rest.rsplit('*').next().unwrap_or_default();
            return Some(Self::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            });
        }
        if let Some(dir) = body.strip_suffix('/') {
            let dir = dir.trim_end_matches('/');
            if dir.is_empty() {
                return None;
            }
            return Some(if rooted {
                Self::Rooted(dir.to_string())
            } else {
                Self::Dir(dir.to_string())
            });
        }
        if body.is_empty() {
            return None;
        }
        Some(if rooted {
            Self::Rooted(body.to_string())
        } else {
            Self::Literal(body.to_string())
        })
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Dir(dir) => {
                path == dir
                    || path.starts_with(&format!("{dir}/"))
                    || path.ends_with(&format!("/{dir}"))
                    || path.contains(&format!("/{dir}/"))
            }
            Self::Rooted(name) | Self::Literal(name) => subtree_of(path, name),
            Self::Wildcard { prefix, suffix } => {
                path.len() >= prefix.len() + suffix.len()
                    && path.starts_with(prefix.as_str())
                    && path.ends_with(suffix.as_str())
            }
        }
    }
}

fn subtree_of(path: &str, root: &str) -> bool {
    path == root || (path.starts_with(root) && path.as_bytes().get(root.len()) == Some(&b'/'))
}

/// Subset of `.gitignore` semantics, evaluated against repository-relative
/// paths with `/` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    /// Load rules from `path`; a missing file yields no rules.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No ignore file at {}", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut patterns = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('!') {
                log::debug!("Negated ignore pattern not supported: {line}");
                continue;
            }
            if let Some(pattern) = Pattern::parse(line) {
                patterns.push(pattern);
            }
        }
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let normalized = rel_path.replace('\\', "/");
        let path = normalized.trim_start_matches("./").trim_matches('/');
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}
