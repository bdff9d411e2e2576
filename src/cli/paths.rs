use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Nearest ancestor of `start` (inclusive) that contains `.git`.
pub fn find_git_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Find the git root directory by searching upward from the current directory.
pub fn find_git_root() -> Option<PathBuf> {
    let current = std::env::current_dir().ok()?;
    find_git_root_from(&current)
}

/// Resolve the workspace root: an explicit `--dir`, else the git root, else
/// the current directory.
pub fn resolve_workspace_root(dir: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = dir {
        return PathBuf::from(path)
            .canonicalize()
            .with_context(|| format!("Workspace path does not exist: {}", path));
    }
    match find_git_root() {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_git_root_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_git_root_from(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_explicit_dir_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(resolve_workspace_root(missing.to_str()).is_err());
        let resolved = resolve_workspace_root(dir.path().to_str()).unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }
}
