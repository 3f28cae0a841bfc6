use std::path::PathBuf;

use thiserror::Error;

/// Token ids as they appear in corpus files.
pub type TokenId = u32;

/// Failures while turning corpus files into batches.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid token '{token}' in '{path}'")]
    Parse { path: PathBuf, token: String },

    #[error("token id {id} has no embedding")]
    MissingEmbedding { id: TokenId },

    #[error("embedding for id {id} has {found} components, expected {expected}")]
    EmbeddingDimension {
        id:       TokenId,
        expected: usize,
        found:    usize,
    },

    #[error("store error in '{path}': {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("invalid pipeline shape: {0}")]
    InvalidShape(String),

    #[error("no file in the list is long enough to produce a batch")]
    Exhausted,
}

/// Failures in the run configuration, reported before training starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid model preset '{0}' (expected small, medium, large or test)")]
    UnknownPreset(String),

    #[error("invalid task set '{0}' (expected all, train, valid or test)")]
    UnknownTasks(String),

    #[error("data manifest '{0}' does not exist")]
    MissingManifest(PathBuf),

    #[error("16-bit training is not available on the CPU backend; drop --cpu or --use-fp16")]
    HalfPrecisionOnCpu,

    #[error("{0} store is empty")]
    EmptyStore(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::MissingEmbedding { id: 17 };
        assert!(err.to_string().contains("17"));

        let err = DataError::Parse { path: "a.txt".into(), token: "x1".into() };
        assert!(err.to_string().contains("x1"));
        assert!(err.to_string().contains("a.txt"));

        let err = DataError::EmbeddingDimension { id: 3, expected: 4, found: 2 };
        assert!(err.to_string().contains("expected 4"));

        let err = ConfigError::MissingManifest("files.txt".into());
        assert!(err.to_string().contains("files.txt"));

        assert!(ConfigError::HalfPrecisionOnCpu.to_string().contains("--use-fp16"));
        assert_eq!(ConfigError::EmptyStore("vocabulary").to_string(), "vocabulary store is empty");
    }
}
