//! Content hashing for cache invalidation.

use crate::domain::UploadableFile;
use sha2::{Digest, Sha256};

/// SHA256 hex of a single string, used for cache keys.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable hash over the filtered file set, independent of walk order.
///
/// Paths are part of the hash, so a rename invalidates the cache as well.
pub fn directory_checksum(files: &[UploadableFile]) -> String {
    let mut sorted: Vec<&UploadableFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut hasher = Sha256::new();
    for file in sorted {
        hasher.update(file.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(file.content.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_ignores_order() {
        let a = UploadableFile::unranked("a.rs", "fn a() {}");
        let b = UploadableFile::unranked("b.rs", "fn b() {}");
        assert_eq!(
            directory_checksum(&[a.clone(), b.clone()]),
            directory_checksum(&[b, a])
        );
    }

    #[test]
    fn test_checksum_changes_with_content_and_path() {
        let base = directory_checksum(&[UploadableFile::unranked("a.rs", "x")]);
        assert_eq!(base.len(), 64);
        assert_ne!(base, directory_checksum(&[UploadableFile::unranked("a.rs", "y")]));
        assert_ne!(base, directory_checksum(&[UploadableFile::unranked("b.rs", "x")]));
    }

    #[test]
    fn test_checksum_separates_path_and_content() {
        // "ab" + "c" must not collide with "a" + "bc"
        let left = directory_checksum(&[UploadableFile::unranked("ab", "c")]);
        let right = directory_checksum(&[UploadableFile::unranked("a", "bc")]);
        assert_ne!(left, right);
    }

    #[test]
    fn test_hash_text_is_lowercase_hex() {
        let hash = hash_text("query");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
