//! Writes an accepted changeset back into the workspace.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use crate::domain::FileBlock;

/// Signed line delta between the file on disk and `new_content`.
///
/// A file that does not exist yet counts all of its lines as added.
pub fn line_delta(path: &Path, new_content: &str) -> i64 {
    match fs::read_to_string(path) {
        Ok(current) => new_content.matches('\n').count() as i64 - current.matches('\n').count() as i64,
        Err(_) => new_content.lines().count() as i64,
    }
}

/// Resolve `filename` under `root`, refusing absolute paths and `..` escapes.
pub fn resolve_target(root: &Path, filename: &str) -> Option<PathBuf> {
    let relative = Path::new(filename);
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth.checked_sub(1)?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if depth == 0 {
        return None;
    }
    Some(root.join(relative))
}

#[derive(Debug, Default, PartialEq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub refused: Vec<String>,
}

/// Write blocks in order, so a duplicate filename ends with its last block.
pub fn write_files(root: &Path, files: &[FileBlock]) -> Result<WriteReport> {
    let mut report = WriteReport::default();

    for file in files {
        let Some(target) = resolve_target(root, &file.filename) else {
            warn!("Refusing to write outside the workspace: {}", file.filename);
            report.refused.push(file.filename.clone());
            continue;
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&target, &file.contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!("Successfully wrote file: {}", target.display());
        report.written.push(target);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_line_delta() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        assert_eq!(line_delta(&path, "one\ntwo\nthree"), 3);

        fs::write(&path, "one\ntwo\nthree\n").unwrap();
        assert_eq!(line_delta(&path, "one\n"), -2);
        assert_eq!(line_delta(&path, "1\n2\n3\n4\n"), 1);
    }

    #[test]
    fn test_resolve_target() {
        let root = Path::new("/work");
        assert_eq!(resolve_target(root, "src/a.rs"), Some(PathBuf::from("/work/src/a.rs")));
        assert_eq!(resolve_target(root, "src/../b.rs"), Some(PathBuf::from("/work/src/../b.rs")));
        assert_eq!(resolve_target(root, "../escape.rs"), None);
        assert_eq!(resolve_target(root, "a/../../escape.rs"), None);
        assert_eq!(resolve_target(root, "/etc/passwd"), None);
        assert_eq!(resolve_target(root, "."), None);
    }

    #[test]
    fn test_write_files_creates_dirs_and_applies_in_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            FileBlock::new("lib/util.py", "v1"),
            FileBlock::new("../outside.py", "nope"),
            FileBlock::new("lib/util.py", "v2"),
        ];
        let report = write_files(dir.path(), &files).unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.refused, vec!["../outside.py".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("lib/util.py")).unwrap(), "v2");
        assert!(!dir.path().parent().unwrap().join("outside.py").exists());
    }
}
