use serde::{Deserialize, Serialize};

/// Final feature vector: 7 distance-bucket positions followed by 4 negation
/// positions. Each entry is 0 or 1.
pub type FeatureVector = [u8; 11];

/// Which on-disk source satisfied the embedding load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelSource {
    /// The serialized cache file was read directly.
    Cache,
    /// The raw word2vec distribution was parsed (and the cache rewritten).
    Word2vec,
}

/// Bucketed word-mover distance between two texts.
///
/// Buckets are half-open below and closed above, except the first which is
/// closed on both ends. Exactly one bucket applies to any distance value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DistanceBucket {
    /// 0 ≤ d ≤ 0.2
    VeryClose,
    /// 0.2 < d ≤ 0.4
    Close,
    /// 0.4 < d ≤ 0.6
    Moderate,
    /// 0.6 < d ≤ 0.8
    Distant,
    /// 0.8 < d ≤ 1.0
    VeryDistant,
    /// finite d > 1.0
    Far,
    /// d = +∞: one of the texts had no in-vocabulary tokens left.
    Undefined,
}

impl DistanceBucket {
    /// Maps a word-mover distance onto its bucket via a single ordered
    /// dispatch over the interval upper bounds.
    pub fn from_distance(distance: f64) -> Self {
        if distance.is_infinite() {
            return DistanceBucket::Undefined;
        }
        match distance {
            d if d <= 0.2 => DistanceBucket::VeryClose,
            d if d <= 0.4 => DistanceBucket::Close,
            d if d <= 0.6 => DistanceBucket::Moderate,
            d if d <= 0.8 => DistanceBucket::Distant,
            d if d <= 1.0 => DistanceBucket::VeryDistant,
            _ => DistanceBucket::Far,
        }
    }

    /// Position of this bucket inside the 7-element segment.
    pub fn index(self) -> usize {
        match self {
            DistanceBucket::VeryClose => 0,
            DistanceBucket::Close => 1,
            DistanceBucket::Moderate => 2,
            DistanceBucket::Distant => 3,
            DistanceBucket::VeryDistant => 4,
            DistanceBucket::Far => 5,
            DistanceBucket::Undefined => 6,
        }
    }

    /// One-hot encoding of this bucket.
    pub fn one_hot(self) -> [u8; 7] {
        let mut segment = [0u8; 7];
        segment[self.index()] = 1;
        segment
    }
}

/// Which of the two input texts contains a contextual negation phrase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegationSignal {
    /// Neither text produced a phrase: all-zero segment.
    Neither,
    /// Only the first text produced phrases.
    FirstOnly,
    /// Only the second text produced phrases.
    SecondOnly,
    /// Both texts produced phrases.
    Both,
}

impl NegationSignal {
    /// Combines per-text phrase presence into the joint signal.
    pub fn from_presence(first: bool, second: bool) -> Self {
        match (first, second) {
            (true, true) => NegationSignal::Both,
            (true, false) => NegationSignal::FirstOnly,
            (false, true) => NegationSignal::SecondOnly,
            (false, false) => NegationSignal::Neither,
        }
    }

    /// 4-element segment encoding. `Neither` is the all-zero case.
    pub fn encode(self) -> [u8; 4] {
        match self {
            NegationSignal::Neither => [0, 0, 0, 0],
            NegationSignal::FirstOnly => [0, 1, 0, 0],
            NegationSignal::SecondOnly => [0, 0, 1, 0],
            NegationSignal::Both => [0, 0, 0, 1],
        }
    }
}
