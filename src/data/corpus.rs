// ============================================================
// Layer 4 — Corpus Reader
// ============================================================
// Corpus files are plain text: integer token ids separated by
// arbitrary whitespace (spaces, tabs, newlines). One file is
// one document or shard.
//
// The data manifest is a text file whose whitespace-separated
// contents are the ordered list of corpus file paths.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{DataError, TokenId};

/// Read a corpus file into its ordered token ids.
pub fn read_token_ids(path: &Path) -> Result<Vec<TokenId>, DataError> {
    let text = read_text(path)?;
    parse_token_ids(path, &text)
}

/// Parse whitespace-separated ids; `path` is only used for error reporting.
pub fn parse_token_ids(path: &Path, text: &str) -> Result<Vec<TokenId>, DataError> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<TokenId>().map_err(|_| DataError::Parse {
                path:  path.to_path_buf(),
                token: token.to_string(),
            })
        })
        .collect()
}

/// Number of whitespace-separated words in a file (the `wc -w` rule).
pub fn count_words(path: &Path) -> Result<usize, DataError> {
    Ok(read_text(path)?.split_whitespace().count())
}

/// Read the manifest and return the corpus paths in listed order.
pub fn read_manifest(path: &Path) -> Result<Vec<PathBuf>, DataError> {
    let text = read_text(path)?;
    Ok(text.split_whitespace().map(PathBuf::from).collect())
}

fn read_text(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
