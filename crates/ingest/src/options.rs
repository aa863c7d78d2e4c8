use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tg_model::Project;
use tg_support::{form, ContractFilter, FormValues};

pub const DEFAULT_CONTRACTS_DIR: &str = "./contracts";

/// Request key carrying an already built project.
pub const PROJECT_KEY: &str = "project";

const DEBUG_LOG_LEVEL: &str = "debug";

/// Recognised keys of the request bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Contract sources, relative to the project root
    #[serde(rename = "contracts-dir")]
    pub contracts_dir: String,

    /// Selection list, see [`ContractFilter::parse`]
    pub contracts: String,

    /// Skip the cache lookup; the result is still written back
    #[serde(rename = "no-cache")]
    pub no_cache: bool,

    /// Output path for downstream emitters
    pub out: String,

    #[serde(rename = "log-level")]
    pub log_level: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            contracts_dir: DEFAULT_CONTRACTS_DIR.to_string(),
            contracts: String::new(),
            no_cache: false,
            out: String::new(),
            log_level: String::new(),
        }
    }
}

impl IngestOptions {
    pub fn from_values(values: &FormValues) -> Result<Self> {
        Ok(form::decode(values)?)
    }

    pub fn to_values(&self) -> Result<FormValues> {
        Ok(form::encode(self)?)
    }

    pub fn contract_filter(&self) -> Result<ContractFilter> {
        Ok(ContractFilter::parse(&self.contracts)?)
    }

    pub fn is_debug(&self) -> bool {
        self.log_level.eq_ignore_ascii_case(DEBUG_LOG_LEVEL)
    }
}

/// One ingestion request against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub root: PathBuf,
    pub options: IngestOptions,
    /// Already built project; ingestion is skipped when present
    pub project: Option<Project>,
}

impl IngestRequest {
    pub fn new(root: impl Into<PathBuf>, options: IngestOptions) -> Self {
        Self {
            root: root.into(),
            options,
            project: None,
        }
    }

    /// Build a request from a host bag. A `project` value holds the project
    /// as JSON.
    pub fn from_values(root: impl Into<PathBuf>, values: &FormValues) -> Result<Self> {
        let options = IngestOptions::from_values(values)?;
        let project = match values.get(PROJECT_KEY) {
            Some(json) if !json.is_empty() => Some(serde_json::from_str(json)?),
            _ => None,
        };
        Ok(Self {
            root: root.into(),
            options,
            project,
        })
    }

    #[must_use]
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(project);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bag(pairs: &[(&str, &str)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_to_missing_keys() {
        let options = IngestOptions::from_values(&FormValues::new()).unwrap();
        assert_eq!(options, IngestOptions::default());
        assert_eq!(options.contracts_dir, "./contracts");
        assert!(options.contract_filter().unwrap().is_all());
    }

    #[test]
    fn decodes_request_bag() {
        let request = IngestRequest::from_values(
            "/repo",
            &bag(&[
                ("contracts-dir", "./api"),
                ("contracts", "Users Orders"),
                ("no-cache", "true"),
                ("out", "./gen"),
                ("log-level", "DEBUG"),
                ("templates", "ignored"),
            ]),
        )
        .unwrap();
        assert_eq!(request.options.contracts_dir, "./api");
        assert!(request.options.no_cache);
        assert!(request.options.is_debug());
        assert_eq!(request.options.out, "./gen");
        assert!(request.project.is_none());
        assert!(!request.options.contract_filter().unwrap().is_all());
    }

    #[test]
    fn project_value_is_json() {
        let project = Project::new("github.com/acme/x");
        let json = serde_json::to_string(&project).unwrap();
        let request = IngestRequest::from_values("/repo", &bag(&[("project", json.as_str())])).unwrap();
        assert_eq!(request.project, Some(project));
    }

    #[test]
    fn options_encode_back_to_bag() {
        let options = IngestOptions {
            no_cache: true,
            ..IngestOptions::default()
        };
        assert_eq!(
            options.to_values().unwrap(),
            bag(&[("contracts-dir", "./contracts"), ("no-cache", "true")])
        );
    }
}
