use crate::{IngestArgs, StatusArgs, ValidateArgs};
use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tg_cache::{CacheKey, CacheLookup, CacheStore};
use tg_ingest::{IngestOptions, IngestRequest, Ingestor, ModelFileParser};
use tg_model::Project;
use tg_repo::{compute_marker, resolve_branch, resolve_identity, MarkerReport, RepoScanOptions};
use tg_validate::validate_project;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RootStatus {
    root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_path: Option<String>,
    branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_path: Option<PathBuf>,
    /// `hit`, a miss reason, or `unavailable` without a project identity
    cache: String,
    marker: MarkerReport,
}

fn root_status(root: &Path, cache: &CacheStore) -> Result<RootStatus> {
    let branch = resolve_branch(root)
        .with_context(|| format!("Failed to read branch of {}", root.display()))?;
    let marker = compute_marker(root, &RepoScanOptions::default())
        .with_context(|| format!("Failed to compute marker for {}", root.display()))?;

    let Ok(identity) = resolve_identity(root) else {
        return Ok(RootStatus {
            root: root.to_path_buf(),
            project_id: None,
            remote: None,
            module_path: None,
            branch,
            cache_path: None,
            cache: "unavailable".to_string(),
            marker,
        });
    };

    let key = CacheKey::new(identity.project_id.clone(), branch.clone(), marker.marker.clone());
    let state = match cache.load(&key)? {
        CacheLookup::Hit(_) => "hit".to_string(),
        CacheLookup::Miss(reason) => reason.to_string(),
    };
    Ok(RootStatus {
        root: root.to_path_buf(),
        cache_path: Some(cache.entry_path(&identity.project_id, &branch)),
        project_id: Some(identity.project_id),
        remote: Some(identity.remote),
        module_path: Some(identity.module_path),
        branch,
        cache: state,
        marker,
    })
}

/// Status of every root, each computed on its own blocking task.
pub async fn status(args: StatusArgs, cache: CacheStore) -> Result<Value> {
    let handles: Vec<_> = args
        .roots
        .into_iter()
        .map(|root| {
            let cache = cache.clone();
            tokio::task::spawn_blocking(move || root_status(&root, &cache))
        })
        .collect();

    let mut statuses = Vec::with_capacity(handles.len());
    for handle in handles {
        statuses.push(handle.await.context("Status task failed")??);
    }
    Ok(serde_json::to_value(statuses)?)
}

pub fn ingest(args: &IngestArgs, cache: CacheStore) -> Result<Value> {
    let options = IngestOptions {
        contracts_dir: args.contracts_dir.clone(),
        contracts: args.contracts.clone(),
        no_cache: args.no_cache,
        out: args.out.clone(),
        log_level: args.log_level.clone(),
    };
    let mut values = options.to_values()?;
    for pair in &args.values {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got {pair:?}"))?;
        values.insert(key.trim().to_string(), value.to_string());
    }

    let request = IngestRequest::from_values(&args.root, &values)?;
    let ingestor = Ingestor::new(ModelFileParser::new(&args.model), cache);
    let outcome = ingestor
        .ingest(request)
        .with_context(|| format!("Failed to ingest {}", args.root.display()))?;
    Ok(serde_json::to_value(outcome.to_response()?)?)
}

pub fn validate(args: &ValidateArgs) -> Result<Value> {
    let text = fs::read_to_string(&args.model)
        .with_context(|| format!("Failed to read model file {}", args.model.display()))?;
    let project: Project = serde_json::from_str(&text)
        .with_context(|| format!("Failed to decode model file {}", args.model.display()))?;
    validate_project(&project)
        .with_context(|| format!("{} is not a valid project", args.model.display()))?;
    Ok(json!({
        "valid": true,
        "modulePath": project.module_path,
        "contracts": project.contracts.len(),
    }))
}
