// ============================================================
// Layer 4 — Vocabulary Store
// ============================================================
// word → id mapping persisted as a JSON object:
//
//   { "the": 0, "cat": 1, ... }
//
// The windowing pipeline works on pre-tokenised ids and never
// consults this store. It is only used to size the softmax
// output layer (vocab_size).

use std::{collections::HashMap, fs, path::Path};

use crate::domain::error::{DataError, TokenId};

#[derive(Debug, Clone)]
pub struct Vocabulary {
    word_to_id: HashMap<String, TokenId>,
}

impl Vocabulary {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let json = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let word_to_id = serde_json::from_str(&json).map_err(|e| DataError::Store {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let vocab = Self { word_to_id };
        tracing::info!("Vocabulary size: {}", vocab.len());
        Ok(vocab)
    }

    pub fn len(&self) -> usize {
        self.word_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_to_id.is_empty()
    }
}
