// ============================================================
// Layer 4 — Embedding Store
// ============================================================
// Loads the id → vector table the windowing pipeline uses to
// embed input windows.
//
// On-disk format (one file per embedding size):
//
//   {prefix}{embedding_size}.json
//   {
//     "17": ["the", 5031, [0.12, -0.40, ...]],
//     "18": ["cat",   88, [0.91,  0.03, ...]]
//   }
//
// Each entry is an array whose LAST element is the vector; the
// elements before it are metadata and are ignored here.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::domain::error::{DataError, TokenId};

/// Fixed-size embedding vector per token id. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    embedding_size: usize,
    vectors:        HashMap<TokenId, Vec<f32>>,
}

impl EmbeddingTable {
    /// Build a table from in-memory vectors, checking every length.
    pub fn from_vectors(
        embedding_size: usize,
        vectors:        HashMap<TokenId, Vec<f32>>,
    ) -> Result<Self, DataError> {
        for (&id, vector) in &vectors {
            if vector.len() != embedding_size {
                return Err(DataError::EmbeddingDimension {
                    id,
                    expected: embedding_size,
                    found:    vector.len(),
                });
            }
        }
        Ok(Self { embedding_size, vectors })
    }

    /// Path of the store for a given embedding size.
    pub fn store_path(prefix: &str, embedding_size: usize) -> PathBuf {
        PathBuf::from(format!("{prefix}{embedding_size}.json"))
    }

    /// Load `{prefix}{embedding_size}.json`.
    pub fn load(prefix: &str, embedding_size: usize) -> Result<Self, DataError> {
        let path = Self::store_path(prefix, embedding_size);
        Self::load_file(&path, embedding_size)
    }

    pub fn load_file(path: &Path, embedding_size: usize) -> Result<Self, DataError> {
        let json = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let root: HashMap<String, Vec<Value>> = serde_json::from_str(&json)
            .map_err(|e| store_error(path, e.to_string()))?;

        let mut vectors = HashMap::with_capacity(root.len());
        for (key, entry) in root {
            let id: TokenId = key
                .parse()
                .map_err(|_| store_error(path, format!("key '{key}' is not a token id")))?;

            let last = entry
                .last()
                .ok_or_else(|| store_error(path, format!("entry for id {id} is empty")))?;

            let vector: Vec<f32> = serde_json::from_value(last.clone()).map_err(|_| {
                store_error(path, format!("last element for id {id} is not a numeric vector"))
            })?;

            vectors.insert(id, vector);
        }

        let table = Self::from_vectors(embedding_size, vectors)?;
        tracing::info!(
            "Loaded {} embeddings of size {} from '{}'",
            table.len(),
            embedding_size,
            path.display()
        );
        Ok(table)
    }

    /// Vector for `id`, or a MissingEmbedding error. Never substitutes.
    pub fn lookup(&self, id: TokenId) -> Result<&[f32], DataError> {
        self.vectors
            .get(&id)
            .map(Vec::as_slice)
            .ok_or(DataError::MissingEmbedding { id })
    }

    pub fn embedding_size(&self) -> usize {
        self.embedding_size
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn store_error(path: &Path, reason: String) -> DataError {
    DataError::Store { path: path.to_path_buf(), reason }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_store(dir: &Path, size: usize, json: &str) -> String {
        let prefix = dir.join("idWordVec_").to_string_lossy().into_owned();
        fs::write(EmbeddingTable::store_path(&prefix, size), json).unwrap();
        prefix
    }

    #[test]
    fn test_uses_last_element_of_each_entry() {
        let dir    = tempdir().unwrap();
        let prefix = write_store(
            dir.path(),
            2,
            r#"{"1": ["one", 40, [0.5, 1.5]], "2": [[9.0, 9.0], [2.0, 3.0]]}"#,
        );

        let table = EmbeddingTable::load(&prefix, 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(1).unwrap(), &[0.5, 1.5]);
        // Only the final element counts, even if earlier ones look like vectors
        assert_eq!(table.lookup(2).unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_missing_id_is_lookup_error() {
        let table = EmbeddingTable::from_vectors(1, HashMap::from([(1, vec![0.0])])).unwrap();
        assert!(matches!(table.lookup(7), Err(DataError::MissingEmbedding { id: 7 })));
    }

    #[test]
    fn test_wrong_vector_length_is_rejected() {
        let dir    = tempdir().unwrap();
        let prefix = write_store(dir.path(), 3, r#"{"4": ["w", [1.0, 2.0]]}"#);
        let err    = EmbeddingTable::load(&prefix, 3).unwrap_err();
        assert!(matches!(
            err,
            DataError::EmbeddingDimension { id: 4, expected: 3, found: 2 }
        ));
    }

    #[test]
    fn test_non_numeric_key_is_store_error() {
        let dir    = tempdir().unwrap();
        let prefix = write_store(dir.path(), 1, r#"{"cat": ["w", [1.0]]}"#);
        assert!(matches!(EmbeddingTable::load(&prefix, 1), Err(DataError::Store { .. })));
    }

    #[test]
    fn test_empty_entry_is_store_error() {
        let dir    = tempdir().unwrap();
        let prefix = write_store(dir.path(), 1, r#"{"3": []}"#);
        assert!(matches!(EmbeddingTable::load(&prefix, 1), Err(DataError::Store { .. })));
    }

    #[test]
    fn test_missing_store_is_io_error() {
        let dir    = tempdir().unwrap();
        let prefix = dir.path().join("nothing_").to_string_lossy().into_owned();
        assert!(matches!(EmbeddingTable::load(&prefix, 8), Err(DataError::Io { .. })));
    }
}
