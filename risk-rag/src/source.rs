//! Record sources: where raw records come from, and how their content is
//! fingerprinted.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{RagError, Result};
use crate::record::RawRecord;

/// A storage backend holding the raw records as a JSON array.
///
/// Sources are read in full every time; the corpus index decides whether the
/// bytes changed by comparing [`fingerprint`]s.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read the complete serialized record set.
    async fn read(&self) -> Result<Vec<u8>>;

    /// Human-readable name for logs and errors.
    fn describe(&self) -> String;

    /// Read and parse every record.
    async fn load(&self) -> Result<Vec<RawRecord>> {
        parse_records(&self.read().await?)
    }
}

/// A [`RecordSource`] backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| RagError::StorageError {
            source_name: self.describe(),
            message: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Content hash of a serialized record set (hex SHA-256).
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Parse a JSON array of objects into raw records.
///
/// # Errors
///
/// Returns [`RagError::ParseError`] if the bytes are not a JSON array of
/// objects.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    serde_json::from_slice(bytes)
        .map_err(|e| RagError::ParseError(format!("expected a JSON array of records: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_changes_with_content_of_same_length() {
        assert_eq!(fingerprint(b"[1]"), fingerprint(b"[1]"));
        assert_ne!(fingerprint(b"[1]"), fingerprint(b"[2]"));
    }

    #[test]
    fn parse_rejects_non_arrays() {
        assert!(matches!(parse_records(b"{\"a\": 1}"), Err(RagError::ParseError(_))));
        assert!(matches!(parse_records(b"[1, 2]"), Err(RagError::ParseError(_))));
        assert_eq!(parse_records(b"[{}, {\"status\": \"open\"}]").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("absent.json"));
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, RagError::StorageError { .. }));
    }
}
