//! Upload eligibility.
//!
//! `IgnoreSpec` compiles the workspace `.gitignore`, the built-in defaults
//! and any user patterns into a single gitignore matcher, in that order, so
//! later patterns (including `!` negations) override earlier ones.

use crate::workspace::filetype::{has_binary_extension, is_binary_file};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default maximum file size in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

/// Rules applied to every workspace, after `.gitignore`.
pub const DEFAULT_IGNORE_RULES: &[&str] = &[
    "/.git/",
    "/.github/",
    "/.next/",
    "__pycache__/",
    "/node_modules/",
    "/venv/",
    ".arcode.cache.pkl",
    ".arcode.checksum.txt",
    ".arcode.embeddings",
    ".DS_Store",
    ".env",
];

/// Compiled ignore rules for one workspace.
#[derive(Debug, Clone)]
pub struct IgnoreSpec {
    matcher: Gitignore,
    patterns: Vec<String>,
}

impl IgnoreSpec {
    /// Build from explicit rule lines, in precedence order.
    pub fn from_lines<I, S>(root: &Path, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root);
        let mut patterns = Vec::new();

        for line in lines {
            let line = line.as_ref().trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            match builder.add_line(None, line) {
                Ok(_) => patterns.push(line.to_string()),
                Err(e) => warn!("Ignoring invalid pattern '{}': {}", line, e),
            }
        }

        let matcher = match builder.build() {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to compile ignore rules: {}", e);
                Gitignore::empty()
            }
        };

        Self { matcher, patterns }
    }

    /// Build the spec for a workspace: `.gitignore`, defaults, then `extra`.
    pub fn for_workspace(root: &Path, extra: &[String]) -> Self {
        let gitignore_path = root.join(".gitignore");
        let gitignore_lines: Vec<String> = match fs::read_to_string(&gitignore_path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Failed to read {}: {}", gitignore_path.display(), e);
                Vec::new()
            }
        };

        let lines = gitignore_lines
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_IGNORE_RULES.iter().copied())
            .chain(extra.iter().map(String::as_str));

        Self::from_lines(root, lines)
    }

    /// True when `relative_path` (or any parent directory) is ignored.
    pub fn is_ignored(&self, relative_path: &str, is_dir: bool) -> bool {
        let path = normalize_relative(relative_path);
        if path.is_empty() {
            return false;
        }
        matches!(
            self.matcher.matched_path_or_any_parents(path, is_dir),
            Match::Ignore(_)
        )
    }

    /// The rule lines that compiled, in precedence order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

fn normalize_relative(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_start_matches('/')
}

/// Decides, per candidate path, whether it may enter the prompt.
#[derive(Debug, Clone)]
pub struct UploadFilter {
    root: PathBuf,
    spec: IgnoreSpec,
    max_file_size: u64,
}

impl UploadFilter {
    pub fn new(root: impl Into<PathBuf>, spec: IgnoreSpec, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            spec,
            max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn spec(&self) -> &IgnoreSpec {
        &self.spec
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Pure predicate. Unreadable files are rejected, never fatal.
    pub fn should_upload(&self, relative_path: &str) -> bool {
        let relative_path = normalize_relative(relative_path);

        if self.spec.is_ignored(relative_path, false) {
            debug!("Skipping ignored file: {}", relative_path);
            return false;
        }

        let full_path = self.root.join(relative_path);
        if has_binary_extension(&full_path) {
            debug!("Skipping binary file: {}", relative_path);
            return false;
        }

        let metadata = match fs::metadata(&full_path) {
            Ok(m) => m,
            Err(e) => {
                debug!("Skipping unreadable file {}: {}", relative_path, e);
                return false;
            }
        };
        if !metadata.is_file() {
            return false;
        }
        if metadata.len() > self.max_file_size {
            debug!(
                "Skipping large file ({} bytes): {}",
                metadata.len(),
                relative_path
            );
            return false;
        }

        if is_binary_file(&full_path) {
            debug!("Skipping binary file: {}", relative_path);
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_spec_skips_comments_and_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let spec = IgnoreSpec::from_lines(temp_dir.path(), ["# comment", "", "   ", "*.log"]);
        assert_eq!(spec.patterns(), ["*.log".to_string()]);
        assert!(spec.is_ignored("debug.log", false));
        assert!(!spec.is_ignored("debug.txt", false));
    }

    #[test]
    fn test_later_negation_overrides_earlier_rule() {
        let temp_dir = TempDir::new().unwrap();
        let spec = IgnoreSpec::from_lines(temp_dir.path(), ["*.log", "!keep.log"]);
        assert!(spec.is_ignored("other.log", false));
        assert!(!spec.is_ignored("keep.log", false));
    }

    #[test]
    fn test_directory_rule_applies_to_children() {
        let temp_dir = TempDir::new().unwrap();
        let spec = IgnoreSpec::from_lines(temp_dir.path(), DEFAULT_IGNORE_RULES.iter());
        assert!(spec.is_ignored("node_modules/react/index.js", false));
        assert!(spec.is_ignored(".git/HEAD", false));
        assert!(spec.is_ignored("pkg/__pycache__/mod.pyc", false));
        assert!(spec.is_ignored("sub/.env", false));
        // Anchored rules only match at the root
        assert!(!spec.is_ignored("web/node_modules_docs.md", false));
        assert!(!spec.is_ignored("src/main.rs", false));
    }

    #[test]
    fn test_user_patterns_come_after_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "dist/\n").unwrap();
        let spec = IgnoreSpec::for_workspace(temp_dir.path(), &["!.env".to_string()]);
        assert!(spec.is_ignored("dist/bundle.js", false));
        assert!(!spec.is_ignored(".env", false));
        assert_eq!(spec.patterns().first().map(String::as_str), Some("dist/"));
        assert_eq!(spec.patterns().last().map(String::as_str), Some("!.env"));
    }

    #[test]
    fn test_should_upload_text_and_binary() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.py"), "x".repeat(50)).unwrap();
        fs::write(temp_dir.path().join("b.png"), [0x89, 0x50, 0x4e, 0x47, 0, 0]).unwrap();

        let spec = IgnoreSpec::for_workspace(temp_dir.path(), &[]);
        let filter = UploadFilter::new(temp_dir.path(), spec, DEFAULT_MAX_FILE_SIZE);

        assert!(filter.should_upload("a.py"));
        assert!(filter.should_upload("./a.py"));
        assert!(!filter.should_upload("b.png"));
    }

    #[test]
    fn test_should_upload_rejects_missing_large_and_ignored() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("big.txt"), "y".repeat(101)).unwrap();
        fs::write(temp_dir.path().join("small.txt"), "y".repeat(100)).unwrap();
        fs::write(temp_dir.path().join(".env"), "SECRET=1").unwrap();
        fs::create_dir(temp_dir.path().join("dir")).unwrap();

        let spec = IgnoreSpec::for_workspace(temp_dir.path(), &[]);
        let filter = UploadFilter::new(temp_dir.path(), spec, 100);

        assert!(!filter.should_upload("missing.txt"));
        assert!(!filter.should_upload("big.txt"));
        assert!(filter.should_upload("small.txt"));
        assert!(!filter.should_upload(".env"));
        assert!(!filter.should_upload("dir"));
    }

    #[test]
    fn test_binary_extension_wins_over_text_content() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("data.pdf"), "plain ascii").unwrap();
        let spec = IgnoreSpec::from_lines(temp_dir.path(), Vec::<String>::new());
        let filter = UploadFilter::new(temp_dir.path(), spec, DEFAULT_MAX_FILE_SIZE);
        assert!(!filter.should_upload("data.pdf"));
    }
}
