//! Disk cache for the parsed embedding table.
//!
//! File format:
//! - Header: magic bytes `PSIM`, format version u8
//! - Body: bincode-serialized [`WordEmbeddings`]
//! - Footer: xxhash64 checksum of all preceding bytes, little-endian
//!
//! Writes go through a temp file + rename so a concurrent reader never
//! observes a torn cache.

use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use xxhash_rust::xxh64::xxh64;

use crate::SimilarityContext;
use crate::config::SimilarityConfig;
use crate::error::SimilarityError;
use crate::model::WordEmbeddings;

pub(crate) const CACHE_MAGIC: [u8; 4] = *b"PSIM";
pub(crate) const CACHE_VERSION: u8 = 1;

// Header (magic + version) plus checksum footer.
const MIN_CACHE_LEN: usize = 4 + 1 + 8;

static SHARED_CONTEXT: OnceCell<SimilarityContext> = OnceCell::new();

/// At-most-once process-wide context loader. The first caller pays the load;
/// concurrent callers block until it finishes. A failed load is not sticky:
/// the next caller retries.
pub(crate) fn shared_context(
    config: &SimilarityConfig,
) -> Result<&'static SimilarityContext, SimilarityError> {
    SHARED_CONTEXT.get_or_try_init(|| SimilarityContext::load(config.clone()))
}

pub(crate) fn write_cache(
    path: &Path,
    embeddings: &WordEmbeddings,
) -> Result<(), SimilarityError> {
    let mut data = Vec::new();
    data.extend_from_slice(&CACHE_MAGIC);
    data.push(CACHE_VERSION);

    let body = bincode::serialize(embeddings)
        .map_err(|err| SimilarityError::Parse(format!("cache serialization failed: {err}")))?;
    data.extend_from_slice(&body);

    let checksum = xxh64(&data, 0);
    data.extend_from_slice(&checksum.to_le_bytes());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &data)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

pub(crate) fn read_cache(path: &Path) -> Result<WordEmbeddings, SimilarityError> {
    let data = fs::read(path)?;

    if data.len() < MIN_CACHE_LEN {
        return Err(SimilarityError::Parse("cache file too small".into()));
    }

    let checksum_offset = data.len() - 8;
    let stored: [u8; 8] = data[checksum_offset..]
        .try_into()
        .map_err(|_| SimilarityError::Parse("invalid checksum bytes".into()))?;
    let stored = u64::from_le_bytes(stored);
    let computed = xxh64(&data[..checksum_offset], 0);
    if stored != computed {
        return Err(SimilarityError::Parse(format!(
            "cache checksum mismatch: stored={stored:#x}, computed={computed:#x}"
        )));
    }

    if data[0..4] != CACHE_MAGIC {
        return Err(SimilarityError::Parse("invalid cache magic bytes".into()));
    }

    let version = data[4];
    if version != CACHE_VERSION {
        return Err(SimilarityError::Parse(format!(
            "unsupported cache version {version} (expected {CACHE_VERSION})"
        )));
    }

    bincode::deserialize(&data[5..checksum_offset])
        .map_err(|err| SimilarityError::Parse(format!("cache deserialization failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WordEmbeddings {
        WordEmbeddings::from_vectors(
            3,
            vec![
                ("alpha".to_string(), vec![1.0, 0.0, 0.0]),
                ("beta".to_string(), vec![0.0, 2.0, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn cache_roundtrip_preserves_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.cache");

        let embeddings = table();
        write_cache(&path, &embeddings).unwrap();
        let restored = read_cache(&path).unwrap();

        assert_eq!(embeddings, restored);
    }

    #[test]
    fn write_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("embeddings.cache");

        write_cache(&path, &table()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn read_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.cache");
        fs::write(&path, b"PSIM").unwrap();

        let result = read_cache(&path);
        assert!(matches!(result, Err(SimilarityError::Parse(_))));
    }

    #[test]
    fn read_rejects_flipped_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.cache");
        write_cache(&path, &table()).unwrap();

        let mut data = fs::read(&path).unwrap();
        let middle = data.len() / 2;
        data[middle] ^= 0xFF;
        fs::write(&path, &data).unwrap();

        let result = read_cache(&path);
        assert!(matches!(result, Err(SimilarityError::Parse(_))));
    }

    #[test]
    fn read_rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.cache");
        write_cache(&path, &table()).unwrap();

        let mut data = fs::read(&path).unwrap();
        data[0] = b'X';
        // Recompute the checksum so the magic check is what fails.
        let checksum_offset = data.len() - 8;
        let checksum = xxh64(&data[..checksum_offset], 0);
        data[checksum_offset..].copy_from_slice(&checksum.to_le_bytes());
        fs::write(&path, &data).unwrap();

        let err = read_cache(&path).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn read_rejects_future_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.cache");
        write_cache(&path, &table()).unwrap();

        let mut data = fs::read(&path).unwrap();
        data[4] = CACHE_VERSION + 1;
        let checksum_offset = data.len() - 8;
        let checksum = xxh64(&data[..checksum_offset], 0);
        data[checksum_offset..].copy_from_slice(&checksum.to_le_bytes());
        fs::write(&path, &data).unwrap();

        let err = read_cache(&path).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_cache(&dir.path().join("absent.cache"));
        assert!(matches!(result, Err(SimilarityError::Io(_))));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.cache");
        write_cache(&path, &table()).unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}
