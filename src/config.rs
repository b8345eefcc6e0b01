use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration naming the embedding model locations on disk and
/// the negation-detection defaults.
///
/// # Example
/// ```no_run
/// use pairsim::{SimilarityConfig, SimilarityContext, sim_vector_for_pair};
///
/// let cfg = SimilarityConfig {
///     cache_path: "./models/google-news.cache".into(),
///     word2vec_path: "./models/GoogleNews-vectors-negative300.bin.gz".into(),
///     ..Default::default()
/// };
///
/// let ctx = SimilarityContext::load(cfg).unwrap();
/// let features = sim_vector_for_pair("the cat sat", "a dog ran", &ctx);
/// assert_eq!(features.len(), 11);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityConfig {
    /// Serialized embedding-table cache (fast path). Rewritten after every
    /// successful load from the raw distribution.
    pub cache_path: PathBuf,
    /// Gzip-compressed word2vec binary distribution (slow path).
    pub word2vec_path: PathBuf,
    /// Window width for negation phrase extraction. Even values are widened
    /// to the next odd number so the window stays centered on the match.
    pub ngram: usize,
    /// Negation marker searched for in the raw texts. A marker containing a
    /// space is collapsed to a single token before matching.
    pub negation_word: String,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("./data/similarity/GoogleNews-vectors-negative300.cache"),
            word2vec_path: PathBuf::from("./data/similarity/GoogleNews-vectors-negative300.bin.gz"),
            ngram: 4,
            negation_word: "not".into(),
        }
    }
}
