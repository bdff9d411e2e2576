//! Workspace file selection.
//!
//! This module handles the workspace walk, ignore rules, binary detection,
//! the directory tree shown to the model and the checksum that keys the
//! embedding cache.

pub mod checksum;
pub mod filetype;
pub mod filter;
pub mod scanner;
pub mod tree;
#[cfg(test)]
mod tests;

// Re-exports
pub use checksum::directory_checksum;
pub use filter::{IgnoreSpec, UploadFilter, DEFAULT_MAX_FILE_SIZE};
pub use scanner::{eligible_files, read_files, scan_workspace};
pub use tree::render_tree;
