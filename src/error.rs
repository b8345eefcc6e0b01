use std::io;
use thiserror::Error;

/// Errors surfaced while loading the embedding model.
///
/// Feature extraction itself never fails: out-of-vocabulary tokens are
/// dropped and an empty comparison maps to the undefined-distance bucket.
#[derive(Debug, Error)]
pub enum SimilarityError {
    /// Neither the serialized cache nor the raw word2vec distribution could
    /// be used. The message carries the underlying diagnostic.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
    /// A cache or word2vec payload did not match the expected layout.
    #[error("model parse failure: {0}")]
    Parse(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
