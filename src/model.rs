use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SimilarityError;

/// Immutable word → unit-vector table, shared for the process lifetime.
///
/// All vectors have the same dimension and are L2-normalized on insertion so
/// distance computations see the same geometry regardless of whether the
/// table came from the raw word2vec distribution or the serialized cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordEmbeddings {
    dim: usize,
    vectors: FxHashMap<String, Vec<f32>>,
}

impl WordEmbeddings {
    /// Builds a table from `(word, vector)` pairs, normalizing each vector.
    ///
    /// Rejects vectors whose length differs from `dim`. Duplicate words keep
    /// the last vector seen.
    pub fn from_vectors<I>(dim: usize, pairs: I) -> Result<Self, SimilarityError>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        if dim == 0 {
            return Err(SimilarityError::Parse(
                "embedding dimension must be non-zero".into(),
            ));
        }

        let mut vectors = FxHashMap::default();
        for (word, mut vector) in pairs {
            if vector.len() != dim {
                return Err(SimilarityError::Parse(format!(
                    "vector for {:?} has {} dimensions, expected {dim}",
                    word,
                    vector.len()
                )));
            }
            l2_normalize(&mut vector);
            vectors.insert(word, vector);
        }

        Ok(Self { dim, vectors })
    }

    /// Constructor for already-normalized tables (cache load, raw parse).
    pub(crate) fn from_normalized(dim: usize, vectors: FxHashMap<String, Vec<f32>>) -> Self {
        Self { dim, vectors }
    }

    /// Unit vector for `word`, or `None` when out of vocabulary.
    pub fn lookup(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    /// Dimension every stored vector shares.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Vocabulary size.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// In-place L2 normalization. Zero vectors are left untouched.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm_sq: f32 = vector.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for value in vector.iter_mut() {
            *value *= inv_norm;
        }
    }
}
