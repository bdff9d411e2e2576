//! Workspace traversal.
//!
//! Uses `ignore::WalkBuilder` for the recursive walk, but with the standard
//! filters turned off: the only ignore rules are the workspace's
//! `IgnoreSpec`, which prunes whole directories during the walk and is
//! applied again per file by `UploadFilter`.

use crate::domain::{CandidateFile, UploadableFile};
use crate::workspace::filter::{IgnoreSpec, UploadFilter};
use ignore::WalkBuilder;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Workspace-relative path with `/` separators.
pub fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let s = relative.to_string_lossy().replace('\\', "/");
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn build_walker(root: &Path, spec: &IgnoreSpec) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    builder.standard_filters(false);
    builder.hidden(false);
    builder.follow_links(false);
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let spec = spec.clone();
    let walk_root = root.to_path_buf();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            return true;
        }
        match relative_path(entry.path(), &walk_root) {
            Some(rel) => !spec.is_ignored(&rel, true),
            None => true,
        }
    });

    builder
}

/// Every regular file under `root` outside ignored directories, in walk order.
pub fn collect_candidates(root: &Path, spec: &IgnoreSpec) -> Vec<CandidateFile> {
    let mut candidates = Vec::new();

    debug!("Scanning workspace: {}", root.display());

    for entry in build_walker(root, spec).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error walking directory: {}", e);
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let Some(path) = relative_path(entry.path(), root) else {
            warn!("Failed to get relative path for {}", entry.path().display());
            continue;
        };
        let raw_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        candidates.push(CandidateFile { path, raw_size });
    }

    debug!("Found {} candidate files", candidates.len());
    candidates
}

/// Candidates that pass the upload filter, in walk order.
pub fn eligible_files(filter: &UploadFilter) -> Vec<CandidateFile> {
    collect_candidates(filter.root(), filter.spec())
        .into_iter()
        .filter(|c| filter.should_upload(&c.path))
        .collect()
}

/// Read eligible files into memory. Invalid UTF-8 is replaced, not rejected.
pub fn read_files(root: &Path, eligible: &[CandidateFile]) -> Vec<UploadableFile> {
    let mut files = Vec::with_capacity(eligible.len());
    for candidate in eligible {
        match fs::read(root.join(&candidate.path)) {
            Ok(bytes) => files.push(UploadableFile::unranked(
                candidate.path.clone(),
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(e) => warn!("Failed to read file {}: {}", candidate.path, e),
        }
    }
    files
}

/// Full-scan mode: every eligible file with its content.
pub fn scan_workspace(filter: &UploadFilter) -> Vec<UploadableFile> {
    let eligible = eligible_files(filter);
    read_files(filter.root(), &eligible)
}
