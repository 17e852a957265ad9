use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Language;

/// A file row in the store. `path` is repo-relative with forward slashes;
/// `sha256` is the decisive freshness signal, `mtime` a coarse tie-breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub repo_id: i64,
    pub path: String,
    pub lang: Language,
    pub sha256: String,
    pub mtime: i64,
    pub size_bytes: i64,
    pub last_indexed_at: i64,
}

/// A file discovered on disk by the walker, before hashing or parsing.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: String,
    pub absolute_path: PathBuf,
    pub lang: Language,
    pub mtime: i64,
    pub size: u64,
}

/// A currently-discovered file as presented to change detection.
#[derive(Debug, Clone)]
pub struct SeenFile {
    pub path: String,
    pub sha256: String,
    pub mtime: i64,
}

/// Change-detection buckets. Unchanged files appear in none of them.
#[derive(Debug, Default)]
pub struct FileChanges {
    pub new: Vec<String>,
    pub changed: Vec<String>,
    pub deleted: Vec<FileRecord>,
}

/// Computes the SHA-256 hash of file content as lowercase hex.
pub fn compute_sha256(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(content.as_bytes());
    format!("{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_sha256() {
        let content = "export const x = 1;\n";
        let hash = compute_sha256(content);

        // SHA-256 produces a 64-character hex string
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_sha256(content));
        assert_ne!(hash, compute_sha256("export const x = 2;\n"));
    }
}
