//! Error types for fitting, searching and persisting a retrieval model.
//!
//! Tokenizing and stemming never fail. Only the operations that touch the
//! filesystem or need a fitted model return these errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// `fit` was called with no documents.
    #[error("cannot fit a model on an empty corpus")]
    EmptyCorpus,

    /// Every document was reduced to zero terms by preprocessing.
    #[error("corpus of {num_docs} documents produced an empty vocabulary")]
    EmptyVocabulary { num_docs: usize },

    /// The requested number of topics was zero.
    #[error("number of topics must be at least 1")]
    InvalidTopicCount,

    /// A search or export was attempted before any successful fit or load.
    #[error("no model has been fitted or loaded")]
    NotFitted,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode model artifact: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode model artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model artifact version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// A decoded artifact is internally inconsistent.
    #[error("model artifact is inconsistent: {0}")]
    ArtifactMismatch(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
