use crate::error::{RepoError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MODULE_FILE_NAME: &str = "go.mod";

/// Locate the `go.mod` governing `start`.
///
/// Asks the Go toolchain first (`go env GOMOD`); when it is missing or says
/// "no module", walks up the directory tree instead.
pub fn find_module_file(start: &Path) -> Result<PathBuf> {
    if let Some(path) = go_env_gomod(start) {
        return Ok(path);
    }
    walk_up_for_module_file(start)
}

fn go_env_gomod(start: &Path) -> Option<PathBuf> {
    let output = Command::new("go")
        .arg("env")
        .arg("GOMOD")
        .current_dir(start)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let reported = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if reported.is_empty() || reported == "/dev/null" || reported == "NUL" {
        return None;
    }
    let path = PathBuf::from(reported);
    path.is_file().then_some(path)
}

pub fn walk_up_for_module_file(start: &Path) -> Result<PathBuf> {
    let start = fs::canonicalize(start)?;
    start
        .ancestors()
        .map(|dir| dir.join(MODULE_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or(RepoError::ModuleFileNotFound(start))
}

/// Module path declared by the `go.mod` above `start`; empty is an error.
pub fn read_module_path(start: &Path) -> Result<String> {
    let module_file = find_module_file(start)?;
    let content = fs::read_to_string(&module_file)?;
    parse_module_directive(&content).ok_or(RepoError::EmptyModulePath(module_file))
}

/// Value of the `module` directive. Accepts quoted paths and trailing
/// `//` comments.
pub fn parse_module_directive(content: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) && !rest.starts_with('"') {
            continue;
        }
        let rest = rest.split("//").next().unwrap_or_default().trim();
        let path = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest)
            .trim();
        return (!path.is_empty()).then(|| path.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_module_directive_shapes() {
        assert_eq!(
            parse_module_directive("module github.com/acme/x\n\ngo 1.22\n"),
            Some("github.com/acme/x".to_string())
        );
        assert_eq!(
            parse_module_directive("// header\nmodule \"github.com/acme/y\" // quoted\n"),
            Some("github.com/acme/y".to_string())
        );
        assert_eq!(parse_module_directive("module\n"), None);
        assert_eq!(parse_module_directive("modules x\n"), None);
        assert_eq!(parse_module_directive("go 1.22\n"), None);
    }

    #[test]
    fn walk_finds_module_file_in_ancestor() {
        let temp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        fs::write(root.join(MODULE_FILE_NAME), "module example.com/m\n").unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();

        let found = walk_up_for_module_file(&root.join("a/b")).unwrap();
        assert_eq!(found, root.join(MODULE_FILE_NAME));
        assert_eq!(read_module_path(&root.join("a/b")).unwrap(), "example.com/m");
    }

    #[test]
    fn empty_module_directive_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(MODULE_FILE_NAME), "go 1.22\n").unwrap();
        let err = read_module_path(temp.path()).unwrap_err();
        assert!(matches!(err, RepoError::EmptyModulePath(_)));
    }
}
