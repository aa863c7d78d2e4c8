use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tg_model::Project;

/// Builds a project model from contract sources.
pub trait ProjectParser {
    fn parse_project(&self, root: &Path, contracts_dir: &Path) -> anyhow::Result<Project>;
}

impl<F> ProjectParser for F
where
    F: Fn(&Path, &Path) -> anyhow::Result<Project>,
{
    fn parse_project(&self, root: &Path, contracts_dir: &Path) -> anyhow::Result<Project> {
        self(root, contracts_dir)
    }
}

/// Loads a prebuilt project model from a JSON file.
#[derive(Debug, Clone)]
pub struct ModelFileParser {
    path: PathBuf,
}

impl ModelFileParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectParser for ModelFileParser {
    fn parse_project(&self, root: &Path, _contracts_dir: &Path) -> anyhow::Result<Project> {
        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to decode model file {}", path.display()))
    }
}
