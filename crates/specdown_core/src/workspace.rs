//! Parallel document loading.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use specdown_ast::Document;
use tracing::{debug, warn};

use crate::error::CoreError;

/// A parsed document and the path it came from.
#[derive(Debug)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: Document,
}

/// Result of [`load_documents`]: every file ends up in exactly one list.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<LoadedDocument>,
    pub failures: Vec<(PathBuf, CoreError)>,
}

/// Reads and parses one file, refusing files over `max_size` bytes.
pub fn load_document(path: &Path, max_size: u64) -> Result<Document, CoreError> {
    let size = fs::metadata(path)?.len();
    if size > max_size {
        return Err(CoreError::TooLarge {
            size,
            limit: max_size,
        });
    }
    let bytes = fs::read(path)?;
    let document = specdown_parser::parse_bytes(&bytes)?;
    debug!("Parsed {} ({} bytes)", path.display(), bytes.len());
    Ok(document)
}

/// Loads `paths` in parallel. Input order is preserved in both lists.
pub fn load_documents(paths: &[PathBuf], max_size: u64) -> LoadOutcome {
    let results: Vec<Result<LoadedDocument, (PathBuf, CoreError)>> = paths
        .par_iter()
        .map(|path| {
            load_document(path, max_size)
                .map(|document| LoadedDocument {
                    path: path.clone(),
                    document,
                })
                .map_err(|e| (path.clone(), e))
        })
        .collect();

    let mut outcome = LoadOutcome::default();
    for result in results {
        match result {
            Ok(loaded) => outcome.documents.push(loaded),
            Err((path, error)) => {
                warn!("Skipping {}: {}", path.display(), error);
                outcome.failures.push((path, error));
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_documents_empty() {
        let outcome = load_documents(&[], 1024);
        assert!(outcome.documents.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_too_large_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.md");
        fs::write(&path, "# Big\n").unwrap();

        let err = load_document(&path, 3).unwrap_err();
        assert!(matches!(err, CoreError::TooLarge { size: 6, limit: 3 }));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, b"# Bad \xff\n").unwrap();

        let outcome = load_documents(std::slice::from_ref(&path), 1024);
        assert!(outcome.documents.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].1, CoreError::Parse(_)));
    }
}
