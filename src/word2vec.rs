//! Reader for the gzip-compressed word2vec binary distribution format.
//!
//! Layout: an ASCII header line `"<vocab_count> <dimension>\n"`, then per
//! entry a space-terminated word followed by `dimension` little-endian f32
//! values, with an optional `\n` separator between entries. Vectors are
//! L2-normalized as they are read.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use fxhash::FxHashMap;

use crate::error::SimilarityError;
use crate::model::{WordEmbeddings, l2_normalize};

pub(crate) fn read_word2vec_gz(path: &Path) -> Result<WordEmbeddings, SimilarityError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(GzDecoder::new(file));
    parse_word2vec(&mut reader)
}

fn parse_word2vec<R: BufRead>(reader: &mut R) -> Result<WordEmbeddings, SimilarityError> {
    let (vocab_count, dim) = parse_header(reader)?;

    let mut vectors: FxHashMap<String, Vec<f32>> = FxHashMap::default();
    vectors.reserve(vocab_count);
    let mut raw = vec![0u8; dim * 4];

    for entry in 0..vocab_count {
        let word = read_word(reader).map_err(|err| {
            SimilarityError::Parse(format!("entry {entry}: unreadable word: {err}"))
        })?;
        reader.read_exact(&mut raw).map_err(|err| {
            SimilarityError::Parse(format!("entry {entry} ({word:?}): truncated vector: {err}"))
        })?;

        let mut vector = Vec::with_capacity(dim);
        for chunk in raw.chunks_exact(4) {
            vector.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        l2_normalize(&mut vector);
        vectors.insert(word, vector);
    }

    Ok(WordEmbeddings::from_normalized(dim, vectors))
}

/// Reads and validates the `"<vocab> <dim>"` header line.
fn parse_header<R: BufRead>(reader: &mut R) -> Result<(usize, usize), SimilarityError> {
    let mut header = String::new();
    reader.read_line(&mut header)?;

    let mut fields = header.split_whitespace();
    let vocab_count: usize = fields
        .next()
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| SimilarityError::Parse(format!("malformed word2vec header {header:?}")))?;
    let dim: usize = fields
        .next()
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| SimilarityError::Parse(format!("malformed word2vec header {header:?}")))?;

    if dim == 0 || fields.next().is_some() {
        return Err(SimilarityError::Parse(format!(
            "malformed word2vec header {header:?}"
        )));
    }

    Ok((vocab_count, dim))
}

/// Reads a vocabulary word terminated by a single space. Newline bytes left
/// over from the previous entry's separator are skipped.
fn read_word<R: BufRead>(reader: &mut R) -> Result<String, SimilarityError> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        match byte[0] {
            b' ' => break,
            b'\n' => continue,
            other => bytes.push(other),
        }
    }
    String::from_utf8(bytes)
        .map_err(|_| SimilarityError::Parse("vocabulary word is not valid UTF-8".into()))
}
