//! Reading documents under review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::Path;

use crate::Result;

/// Snapshot of a document as served to the browser client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub path: String,
    pub content: String,
    /// Content split on `\n`; a trailing newline yields a final empty line
    pub lines: Vec<String>,
    pub hash: String,
    pub last_modified: DateTime<Utc>,
}

/// Hash document content as `sha256:<hex>`
pub fn compute_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("sha256:{:x}", digest)
}

/// Read a document from disk
///
/// Returns `Ok(None)` if the path does not name a readable file. Bytes that
/// are not valid UTF-8 are decoded lossily.
pub fn read_document(path: impl AsRef<Path>) -> Result<Option<DocumentContent>> {
    let path = path.as_ref();

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        tracing::debug!(path = %path.display(), "Document path is not a file");
        return Ok(None);
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Could not read document");
            return Ok(None);
        }
    };
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let last_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(Some(DocumentContent {
        path: path.display().to_string(),
        lines: content.split('\n').map(str::to_string).collect(),
        hash: compute_hash(&content),
        content,
        last_modified,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_compute_hash_is_prefixed_sha256() {
        let hash = compute_hash("hello");
        assert_eq!(
            hash,
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_read_document_splits_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.md");
        std::fs::write(&path, "# Title\n\nBody\n").unwrap();

        let doc = read_document(&path).unwrap().unwrap();
        assert_eq!(doc.lines, vec!["# Title", "", "Body", ""]);
        assert_eq!(doc.hash, compute_hash("# Title\n\nBody\n"));
        assert_eq!(doc.path, path.display().to_string());
    }

    #[test]
    fn test_read_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let doc = read_document(temp_dir.path().join("missing.md")).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_read_directory_is_not_a_document() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_document(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_read_document_decodes_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.md");
        std::fs::write(&path, b"# Caf\xe9 notes\n").unwrap();

        let doc = read_document(&path).unwrap().unwrap();
        assert_eq!(doc.lines, vec!["# Caf\u{FFFD} notes", ""]);
    }
}
