use crate::error::{IngestError, Result};
use crate::options::IngestRequest;
use crate::parser::ProjectParser;
use std::fs;
use std::path::{Path, PathBuf};
use tg_cache::{CacheKey, CacheLookup, CacheStore};
use tg_model::{GitMeta, Project};
use tg_repo::{
    compute_marker, normalize_branch, read_module_path, resolve_branch, resolve_identity,
    MarkerReport, ProjectIdentity, RepoScanOptions,
};
use tg_support::{ContractFilter, Response, ResponseBuilder, RESPONSE_OUT, RESPONSE_PROJECT};
use tg_validate::validate_project;

/// Directory under the project root receiving debug dumps.
pub const DEBUG_DUMP_DIR: &str = ".tg";

/// Response key reporting whether the project came from cache.
pub const RESPONSE_FROM_CACHE: &str = "fromCache";

/// Result of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Resolved output path
    pub out: PathBuf,
    pub project: Project,
    pub from_cache: bool,
    /// Cache entry read or written, `None` when caching was unavailable
    pub cache_path: Option<PathBuf>,
    /// Working-tree state the project was matched or built against
    pub marker: Option<MarkerReport>,
}

impl IngestOutcome {
    pub fn to_response(&self) -> Result<Response> {
        Ok(ResponseBuilder::new()
            .set(RESPONSE_OUT, &self.out)?
            .set(RESPONSE_PROJECT, &self.project)?
            .flag(RESPONSE_FROM_CACHE, self.from_cache)
            .build())
    }
}

/// Repository state a cache entry is keyed on.
struct RepoState {
    identity: ProjectIdentity,
    branch: String,
    marker: MarkerReport,
}

impl RepoState {
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(
            self.identity.project_id.clone(),
            self.branch.clone(),
            self.marker.marker.clone(),
        )
    }
}

/// Runs ingestion requests: cache lookup, parse, validate, cache write.
///
/// ```text
/// request ──> out dir ──> identity + branch + marker ──> cache hit? ──yes──┐
///                                                          │no             │
///                                   parse ──> validate ──> save ───────────┴──> filter ──> outcome
/// ```
pub struct Ingestor<P> {
    parser: P,
    cache: CacheStore,
    scan: RepoScanOptions,
}

impl<P: ProjectParser> Ingestor<P> {
    pub fn new(parser: P, cache: CacheStore) -> Self {
        Self {
            parser,
            cache,
            scan: RepoScanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_scan_options(mut self, scan: RepoScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome> {
        let IngestRequest {
            root,
            options,
            project,
        } = request;

        let out = resolve_out(&root, &options.out);
        let filter = options.contract_filter()?;

        if let Some(project) = project {
            log::debug!("Project supplied by host; skipping ingestion");
            let project = apply_filter(project, &filter)?;
            create_out(&root, &out)?;
            return Ok(IngestOutcome {
                out,
                project,
                from_cache: false,
                cache_path: None,
                marker: None,
            });
        }

        let state = self.repo_state(&root)?;
        let (project, from_cache, cache_path) =
            match self.lookup(state.as_ref(), options.no_cache)? {
                Some((project, path)) => (project, true, Some(path)),
                None => {
                    let (project, path) =
                        self.build(&root, &options.contracts_dir, state.as_ref())?;
                    (project, false, path)
                }
            };

        if options.is_debug() {
            dump_debug(&root, &project);
        }

        let project = apply_filter(project, &filter)?;
        create_out(&root, &out)?;
        Ok(IngestOutcome {
            out,
            project,
            from_cache,
            cache_path,
            marker: state.map(|state| state.marker),
        })
    }

    /// Identity, branch and marker of `root`, or `None` when the project
    /// cannot be identified and caching is off.
    fn repo_state(&self, root: &Path) -> Result<Option<RepoState>> {
        let identity = match resolve_identity(root) {
            Ok(identity) => identity,
            Err(err) => {
                log::debug!("No project identity for {}: {err}", root.display());
                return Ok(None);
            }
        };
        let branch = resolve_branch(root)?;
        let marker = match compute_marker(root, &self.scan) {
            Ok(marker) => marker,
            Err(err) => {
                log::warn!("Cannot compute marker for {}: {err}", root.display());
                return Ok(None);
            }
        };
        log::debug!(
            "Project {} on '{}' at marker {}",
            identity.project_id,
            branch,
            marker.marker
        );
        Ok(Some(RepoState {
            identity,
            branch,
            marker,
        }))
    }

    fn lookup(
        &self,
        state: Option<&RepoState>,
        no_cache: bool,
    ) -> Result<Option<(Project, PathBuf)>> {
        let Some(state) = state else {
            return Ok(None);
        };
        if no_cache {
            log::debug!("Cache lookup disabled for {}", state.identity.project_id);
            return Ok(None);
        }

        let key = state.cache_key();
        match self.cache.load(&key)? {
            CacheLookup::Hit(project) => {
                log::info!(
                    "Loaded {} from cache ({} contracts)",
                    project.module_path,
                    project.contracts.len()
                );
                Ok(Some((*project, self.cache.entry_path(&key.project_id, &key.branch))))
            }
            CacheLookup::Miss(reason) => {
                log::debug!("Cache miss for {}: {reason}", key.project_id);
                Ok(None)
            }
        }
    }

    /// Parse and validate; only a valid project reaches the cache.
    fn build(
        &self,
        root: &Path,
        contracts_dir: &str,
        state: Option<&RepoState>,
    ) -> Result<(Project, Option<PathBuf>)> {
        let mut project = self
            .parser
            .parse_project(root, &root.join(contracts_dir))
            .map_err(|err| IngestError::Parser {
                root: root.to_path_buf(),
                source: err.into(),
            })?;

        if project.module_path.is_empty() {
            project.module_path = match state {
                Some(state) => state.identity.module_path.clone(),
                None => read_module_path(root).unwrap_or_default(),
            };
        }
        if let Some(state) = state {
            project.git = Some(GitMeta {
                branch: state.branch.clone(),
                remote: state.identity.remote.clone(),
            });
        }

        validate_project(&project)?;

        let cache_path = match state {
            Some(state) => Some(self.cache.save(&mut project, &state.cache_key())?),
            None => None,
        };
        log::info!(
            "Ingested {} ({} contracts, {} types)",
            project.module_path,
            project.contracts.len(),
            project.types.len()
        );
        Ok((project, cache_path))
    }
}

/// Resolve `out` against `root`; an empty `out` is the root itself.
fn resolve_out(root: &Path, out: &str) -> PathBuf {
    if out.is_empty() {
        root.to_path_buf()
    } else {
        root.join(out)
    }
}

/// Create the directory `out` lives in: the parent for a file path (one with
/// an extension), the path itself otherwise.
fn create_out(root: &Path, out: &Path) -> Result<()> {
    if out == root {
        return Ok(());
    }
    if out.extension().is_some() {
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
    } else {
        fs::create_dir_all(out)?;
    }
    Ok(())
}

/// Keep the selected contracts. Every included name must exist.
pub fn apply_filter(mut project: Project, filter: &ContractFilter) -> Result<Project> {
    if filter.is_all() {
        return Ok(project);
    }
    let unknown = filter.unknown_includes(
        project
            .contracts
            .iter()
            .flat_map(|contract| [contract.name.as_str(), contract.id.as_str()]),
    );
    if !unknown.is_empty() {
        return Err(IngestError::UnknownContracts(unknown.join(", ")));
    }
    project
        .contracts
        .retain(|contract| filter.selects([contract.name.as_str(), contract.id.as_str()]));
    Ok(project)
}

/// Path of the debug dump for `project` under `root`.
pub fn debug_dump_path(root: &Path, project: &Project) -> PathBuf {
    root.join(DEBUG_DUMP_DIR)
        .join(format!("{}.json", normalize_branch(project.branch())))
}

fn dump_debug(root: &Path, project: &Project) {
    let path = debug_dump_path(root, project);
    match write_dump(&path, project) {
        Ok(()) => log::debug!("Wrote project dump to {}", path.display()),
        Err(err) => log::warn!("Failed to write project dump {}: {err}", path.display()),
    }
}

fn write_dump(path: &Path, project: &Project) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(project)?)?;
    Ok(())
}
