//! pairsim: semantic relationship features for text pairs.
//!
//! Given a premise and a hypothesis, this crate produces an 11-element
//! feature vector for downstream entailment/contradiction classifiers:
//!
//! - **Positions 0–6**: one-hot bucket of the word-mover distance between
//!   the two texts, computed over a pretrained word2vec embedding table with
//!   stop words removed.
//! - **Positions 7–10**: one-hot encoding of which text contains a
//!   contextual negation phrase (neither / first / second / both), detected
//!   on the raw text.
//!
//! ## Model loading
//!
//! The embedding table comes from a pretrained word2vec distribution (the
//! GoogleNews 300-dimension release in the reference setup). The first load
//! parses the gzip-compressed binary, unit-normalizes every vector, and
//! writes a serialized cache next to it; later loads read the cache
//! directly. Load once, up front:
//!
//! ```no_run
//! use pairsim::{SimilarityConfig, SimilarityContext, sim_vector_for_pair};
//!
//! let ctx = SimilarityContext::load(SimilarityConfig::default()).unwrap();
//! let features = sim_vector_for_pair(
//!     "a man is eating food",
//!     "a man is not eating",
//!     &ctx,
//! );
//! assert_eq!(features.len(), 11);
//! ```
//!
//! [`SimilarityContext::shared`] wraps the same load in a process-wide
//! once-cell for callers that want the table loaded at most once no matter
//! how many threads ask for it.
//!
//! ## What this crate does not do
//!
//! No embedding training, no tokenization beyond whitespace splits and
//! lower-casing, and no classifier: the output vector is the input to one.

mod cache;
mod distance;
mod word2vec;

pub mod config;
pub mod error;
pub mod model;
pub mod negation;
pub mod stopwords;
pub mod types;

pub use crate::config::SimilarityConfig;
pub use crate::error::SimilarityError;
pub use crate::model::WordEmbeddings;
pub use crate::negation::negation_phrases;
pub use crate::types::{DistanceBucket, FeatureVector, ModelSource, NegationSignal};

use fxhash::FxHashSet;
use tracing::{debug, info, warn};

/// Immutable bundle of everything feature extraction needs: configuration,
/// the stop-word set, and the embedding table. Built once by [`load`]
/// (or [`shared`]) and then only read.
///
/// [`load`]: SimilarityContext::load
/// [`shared`]: SimilarityContext::shared
#[derive(Debug)]
pub struct SimilarityContext {
    config: SimilarityConfig,
    stop_words: &'static FxHashSet<&'static str>,
    embeddings: WordEmbeddings,
    source: ModelSource,
}

impl SimilarityContext {
    /// Loads the embedding table per `config`: serialized cache first, raw
    /// word2vec distribution second. A successful raw parse rewrites the
    /// cache for the next process.
    ///
    /// Fails with [`SimilarityError::ModelUnavailable`] when neither source
    /// is usable; callers must not attempt feature extraction in that case.
    pub fn load(config: SimilarityConfig) -> Result<Self, SimilarityError> {
        let (embeddings, source) = load_embeddings(&config)?;
        Ok(Self {
            config,
            stop_words: stopwords::stop_words(),
            embeddings,
            source,
        })
    }

    /// Process-wide variant of [`load`](Self::load): the first caller loads,
    /// concurrent callers block on the same cell, later callers get the
    /// existing context. The configuration only matters for whichever call
    /// performs the load. A failed load is retried by the next caller.
    pub fn shared(config: &SimilarityConfig) -> Result<&'static Self, SimilarityError> {
        cache::shared_context(config)
    }

    /// Builds a context around an existing table, bypassing the filesystem.
    /// Intended for tests and for embedding tables produced elsewhere.
    pub fn with_embeddings(config: SimilarityConfig, embeddings: WordEmbeddings) -> Self {
        Self {
            config,
            stop_words: stopwords::stop_words(),
            embeddings,
            source: ModelSource::Word2vec,
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    pub fn embeddings(&self) -> &WordEmbeddings {
        &self.embeddings
    }

    /// Which on-disk source satisfied the load.
    pub fn source(&self) -> ModelSource {
        self.source
    }
}

fn load_embeddings(
    config: &SimilarityConfig,
) -> Result<(WordEmbeddings, ModelSource), SimilarityError> {
    if config.cache_path.exists() {
        info!(path = %config.cache_path.display(), "embedding cache found, loading");
        match cache::read_cache(&config.cache_path) {
            Ok(embeddings) => {
                info!(
                    words = embeddings.len(),
                    dim = embeddings.dimension(),
                    "embedding cache loaded"
                );
                return Ok((embeddings, ModelSource::Cache));
            }
            Err(err) => {
                warn!(error = %err, "embedding cache unreadable, falling back to word2vec source");
            }
        }
    }

    if !config.word2vec_path.exists() {
        return Err(SimilarityError::ModelUnavailable(format!(
            "no cache at {} and no word2vec distribution at {}",
            config.cache_path.display(),
            config.word2vec_path.display()
        )));
    }

    info!(path = %config.word2vec_path.display(), "parsing word2vec distribution");
    let embeddings = word2vec::read_word2vec_gz(&config.word2vec_path)
        .map_err(|err| SimilarityError::ModelUnavailable(err.to_string()))?;
    info!(
        words = embeddings.len(),
        dim = embeddings.dimension(),
        "word2vec distribution loaded"
    );

    // A cache-write failure costs the next process a re-parse, nothing more.
    if let Err(err) = cache::write_cache(&config.cache_path, &embeddings) {
        warn!(error = %err, path = %config.cache_path.display(), "failed to persist embedding cache");
    }

    Ok((embeddings, ModelSource::Word2vec))
}

/// Computes the 11-element feature vector for a text pair using the window
/// size and negation word from the context's configuration.
pub fn sim_vector_for_pair(text1: &str, text2: &str, ctx: &SimilarityContext) -> FeatureVector {
    sim_vector_for_pair_with(
        text1,
        text2,
        ctx.config.ngram,
        &ctx.config.negation_word,
        ctx,
    )
}

/// Fully parameterized variant of [`sim_vector_for_pair`].
pub fn sim_vector_for_pair_with(
    text1: &str,
    text2: &str,
    ngram: usize,
    word: &str,
    ctx: &SimilarityContext,
) -> FeatureVector {
    let distance = word_mover_distance_for_pair(text1, text2, ctx);
    let bucket = DistanceBucket::from_distance(distance);
    let signal = negation::negation_signal(text1, text2, word, ngram);
    debug!(distance, bucket = ?bucket, signal = ?signal, "feature vector computed");

    let mut vector: FeatureVector = [0; 11];
    vector[..7].copy_from_slice(&bucket.one_hot());
    vector[7..].copy_from_slice(&signal.encode());
    vector
}

/// Raw word-mover distance for a pair: lower-cased, whitespace-split,
/// stop-word-filtered tokens compared over the embedding table. `+∞` when
/// either side has no in-vocabulary tokens left.
pub fn word_mover_distance_for_pair(text1: &str, text2: &str, ctx: &SimilarityContext) -> f64 {
    let first = distance::content_tokens(text1, ctx.stop_words);
    let second = distance::content_tokens(text2, ctx.stop_words);
    distance::word_mover_distance(&first, &second, &ctx.embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small table of unit vectors at fixed angles; distances between
    /// adjacent words are easy to reason about.
    fn context() -> SimilarityContext {
        let embeddings = WordEmbeddings::from_vectors(
            2,
            vec![
                ("cat".to_string(), vec![1.0, 0.0]),
                ("feline".to_string(), vec![0.995, 0.0998]),
                ("dog".to_string(), vec![0.9, 0.436]),
                ("rocket".to_string(), vec![-1.0, 0.0]),
                ("sat".to_string(), vec![0.0, 1.0]),
                ("good".to_string(), vec![0.6, 0.8]),
            ],
        )
        .unwrap();
        SimilarityContext::with_embeddings(SimilarityConfig::default(), embeddings)
    }

    #[test]
    fn identical_texts_land_in_the_first_bucket() {
        let ctx = context();
        let vector = sim_vector_for_pair("the cat sat", "the cat sat", &ctx);
        assert_eq!(vector, [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn near_synonyms_stay_in_the_first_bucket() {
        let ctx = context();
        // |cat - feline| ≈ 0.1: bucket 0.
        let vector = sim_vector_for_pair("the cat", "a feline", &ctx);
        assert_eq!(&vector[..7], &[1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn moderately_related_words_move_buckets() {
        let ctx = context();
        // |cat - dog| ≈ 0.45: bucket 2.
        let vector = sim_vector_for_pair("cat", "dog", &ctx);
        assert_eq!(&vector[..7], &[0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn opposite_vectors_exceed_the_last_finite_boundary() {
        let ctx = context();
        // |cat - rocket| = 2: finite and > 1, bucket 5.
        let vector = sim_vector_for_pair("cat", "rocket", &ctx);
        assert_eq!(&vector[..7], &[0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn out_of_vocabulary_pair_is_undefined() {
        let ctx = context();
        let vector = sim_vector_for_pair("zebra quagga", "cat", &ctx);
        assert_eq!(&vector[..7], &[0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn stop_word_only_text_is_undefined() {
        let ctx = context();
        let vector = sim_vector_for_pair("the a of", "cat", &ctx);
        assert_eq!(&vector[..7], &[0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn distance_segment_always_has_exactly_one_bit() {
        let ctx = context();
        let pairs = [
            ("the cat sat", "the cat sat"),
            ("cat", "dog"),
            ("cat", "rocket"),
            ("zebra", "cat"),
            ("", ""),
            ("the cat is not good", "a dog is good"),
        ];
        for (a, b) in pairs {
            let vector = sim_vector_for_pair(a, b, &ctx);
            let ones: usize = vector[..7].iter().map(|bit| *bit as usize).sum();
            assert_eq!(ones, 1, "pair ({a:?}, {b:?}) produced {vector:?}");
        }
    }

    #[test]
    fn negation_in_first_text_only() {
        let ctx = context();
        let vector = sim_vector_for_pair("the cat is not good", "the cat sat", &ctx);
        assert_eq!(&vector[7..], &[0, 1, 0, 0]);
    }

    #[test]
    fn negation_in_second_text_only() {
        let ctx = context();
        let vector = sim_vector_for_pair("the cat sat", "the cat is not good", &ctx);
        assert_eq!(&vector[7..], &[0, 0, 1, 0]);
    }

    #[test]
    fn negation_in_both_texts() {
        let ctx = context();
        let vector = sim_vector_for_pair("it is not good", "it is not good", &ctx);
        assert_eq!(&vector[7..], &[0, 0, 0, 1]);
    }

    #[test]
    fn negation_in_neither_text() {
        let ctx = context();
        let vector = sim_vector_for_pair("the cat sat", "the cat sat", &ctx);
        assert_eq!(&vector[7..], &[0, 0, 0, 0]);
    }

    #[test]
    fn negation_does_not_affect_the_distance_segment() {
        let ctx = context();
        // "not" is a stop word, so both pairs compare the same tokens.
        let with = sim_vector_for_pair("the cat is not good", "good cat", &ctx);
        let without = sim_vector_for_pair("the cat is good", "good cat", &ctx);
        assert_eq!(&with[..7], &without[..7]);
    }

    #[test]
    fn custom_ngram_and_word_flow_through() {
        let ctx = context();
        let vector = sim_vector_for_pair_with("the cat sat", "a cat never sat", 4, "never", &ctx);
        assert_eq!(&vector[7..], &[0, 0, 1, 0]);
    }

    #[test]
    fn symmetry_of_the_distance_api() {
        let ctx = context();
        let forward = word_mover_distance_for_pair("cat sat good", "dog rocket", &ctx);
        let backward = word_mover_distance_for_pair("dog rocket", "cat sat good", &ctx);
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn context_accessors() {
        let ctx = context();
        assert_eq!(ctx.config().ngram, 4);
        assert_eq!(ctx.source(), ModelSource::Word2vec);
        assert!(ctx.embeddings().contains("cat"));
    }
}
