//! Tests for workspace module.

use crate::workspace::filetype::BINARY_EXTENSIONS;
use crate::workspace::scanner::collect_candidates;
use crate::workspace::{
    directory_checksum, eligible_files, render_tree, scan_workspace, IgnoreSpec, UploadFilter,
    DEFAULT_MAX_FILE_SIZE,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(path).unwrap();
    f.write_all(content).unwrap();
}

fn default_filter(root: &Path) -> UploadFilter {
    let spec = IgnoreSpec::for_workspace(root, &[]);
    UploadFilter::new(root, spec, DEFAULT_MAX_FILE_SIZE)
}

#[test]
fn test_scan_text_file_and_skip_png() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.py", &[b'#'; 50]);
    write_file(temp_dir.path(), "b.png", &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]);

    let filter = default_filter(temp_dir.path());
    assert!(filter.should_upload("a.py"));
    assert!(!filter.should_upload("b.png"));

    let files = scan_workspace(&filter);
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.py"]);
    assert!(files[0].score.is_none());
}

#[test]
fn test_candidates_skip_default_ignored_directories() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "src/main.rs", b"fn main() {}\n");
    write_file(temp_dir.path(), ".git/HEAD", b"ref: refs/heads/main\n");
    write_file(temp_dir.path(), "node_modules/x/index.js", b"module.exports = 1;\n");
    write_file(temp_dir.path(), "app/__pycache__/m.cpython.pyc", b"junk");

    let spec = IgnoreSpec::for_workspace(temp_dir.path(), &[]);
    let candidates = collect_candidates(temp_dir.path(), &spec);
    let paths: Vec<&str> = candidates.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["src/main.rs"]);
    assert_eq!(candidates[0].raw_size, 13);
}

#[test]
fn test_gitignore_and_user_patterns() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), ".gitignore", b"*.log\ntemp/\n# comment\n");
    write_file(temp_dir.path(), "debug.log", b"log line\n");
    write_file(temp_dir.path(), "temp/scratch.txt", b"scratch\n");
    write_file(temp_dir.path(), "notes.bak", b"backup\n");
    write_file(temp_dir.path(), "main.rs", b"fn main() {}\n");

    let spec = IgnoreSpec::for_workspace(temp_dir.path(), &["*.bak".to_string()]);
    let filter = UploadFilter::new(temp_dir.path(), spec, DEFAULT_MAX_FILE_SIZE);
    let eligible: Vec<String> = eligible_files(&filter).into_iter().map(|c| c.path).collect();

    assert!(eligible.contains(&".gitignore".to_string()));
    assert!(eligible.contains(&"main.rs".to_string()));
    assert!(!eligible.contains(&"debug.log".to_string()));
    assert!(!eligible.contains(&"temp/scratch.txt".to_string()));
    assert!(!eligible.contains(&"notes.bak".to_string()));
}

#[test]
fn test_user_negation_reincludes_default_ignored_file() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), ".env.example", b"KEY=\n");
    write_file(temp_dir.path(), ".env", b"KEY=1\n");

    let spec = IgnoreSpec::for_workspace(temp_dir.path(), &["!.env".to_string()]);
    let filter = UploadFilter::new(temp_dir.path(), spec, DEFAULT_MAX_FILE_SIZE);
    assert!(filter.should_upload(".env"));
    assert!(filter.should_upload(".env.example"));
}

#[test]
fn test_binary_extension_never_uploads() {
    let temp_dir = TempDir::new().unwrap();
    let filter = default_filter(temp_dir.path());

    for ext in BINARY_EXTENSIONS {
        let rel = format!("file.{}", ext);
        write_file(temp_dir.path(), &rel, b"looks like text\n");
        assert!(!filter.should_upload(&rel), "{} should be rejected", rel);
    }
}

#[test]
fn test_oversized_file_is_skipped_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "huge.txt", &vec![b'a'; 2048]);
    write_file(temp_dir.path(), "tiny.txt", b"a\n");

    let spec = IgnoreSpec::for_workspace(temp_dir.path(), &[]);
    let filter = UploadFilter::new(temp_dir.path(), spec, 1024);
    let files = scan_workspace(&filter);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "tiny.txt");
}

#[test]
fn test_walk_order_is_sorted_by_name() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "b.txt", b"b\n");
    write_file(temp_dir.path(), "a/z.txt", b"z\n");
    write_file(temp_dir.path(), "c.txt", b"c\n");

    let filter = default_filter(temp_dir.path());
    let paths: Vec<String> = scan_workspace(&filter).into_iter().map(|f| f.path).collect();
    assert_eq!(paths, vec!["a/z.txt", "b.txt", "c.txt"]);
}

#[test]
fn test_tree_from_eligible_paths() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "src/lib.rs", b"pub fn f() {}\n");
    write_file(temp_dir.path(), "Cargo.toml", b"[package]\n");

    let filter = default_filter(temp_dir.path());
    let eligible = eligible_files(&filter);
    let tree = render_tree(eligible.iter().map(|c| c.path.as_str()));
    assert_eq!(tree, "Cargo.toml\nsrc\n    lib.rs\n");
}

#[test]
fn test_checksum_stable_across_scans() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "one.txt", b"1\n");
    write_file(temp_dir.path(), "two.txt", b"2\n");

    let filter = default_filter(temp_dir.path());
    let first = directory_checksum(&scan_workspace(&filter));
    let second = directory_checksum(&scan_workspace(&filter));
    assert_eq!(first, second);

    write_file(temp_dir.path(), "two.txt", b"22\n");
    let third = directory_checksum(&scan_workspace(&filter));
    assert_ne!(first, third);
}
