//! On-disk embedding cache.
//!
//! The cache file holds positionally aligned `vectors` and `records` arrays
//! plus the fingerprint of the corpus they were built from. It is always
//! written whole: serialized to a sibling temp file, synced, then renamed over
//! the target, so a crash mid-write leaves either the old file or the new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;
use crate::types::Review;

/// Bumped whenever the on-disk layout changes; older files are rebuilt.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// One cached review and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingEntry {
    pub record: Review,
    pub vector: Vec<f32>,
}

/// A complete set of embeddings for one corpus.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    fingerprint: String,
    built_at: DateTime<Utc>,
    entries: Vec<EmbeddingEntry>,
}

impl EmbeddingIndex {
    #[must_use]
    pub fn new(fingerprint: String, built_at: DateTime<Utc>, entries: Vec<EmbeddingEntry>) -> Self {
        Self {
            fingerprint,
            built_at,
            entries,
        }
    }

    /// Fingerprint of the corpus these embeddings were computed from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    #[must_use]
    pub fn entries(&self) -> &[EmbeddingEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    fingerprint: String,
    built_at: DateTime<Utc>,
    vectors: Vec<Vec<f32>>,
    records: Vec<Review>,
}

/// Reads and writes the embedding cache file.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    path: PathBuf,
}

impl EmbeddingCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the cache file, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Cache`] if the file has a different format
    /// version or misaligned arrays, and [`SentimentError::Json`] /
    /// [`SentimentError::Io`] if it cannot be read or decoded.
    pub fn load(&self) -> Result<Option<EmbeddingIndex>, SentimentError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cache: CacheFile = serde_json::from_reader(BufReader::new(file))?;
        if cache.version != CACHE_FORMAT_VERSION {
            return Err(SentimentError::Cache(format!(
                "cache format version {} (expected {CACHE_FORMAT_VERSION})",
                cache.version
            )));
        }
        if cache.vectors.len() != cache.records.len() {
            return Err(SentimentError::Cache(format!(
                "cache has {} vectors for {} records",
                cache.vectors.len(),
                cache.records.len()
            )));
        }

        let entries = cache
            .records
            .into_iter()
            .zip(cache.vectors)
            .map(|(record, vector)| EmbeddingEntry { record, vector })
            .collect();

        Ok(Some(EmbeddingIndex::new(
            cache.fingerprint,
            cache.built_at,
            entries,
        )))
    }

    /// Persist `index`, replacing any existing file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Io`] or [`SentimentError::Json`] if the file
    /// cannot be written. The previous file, if any, is left untouched.
    pub fn save(&self, index: &EmbeddingIndex) -> Result<(), SentimentError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            fingerprint: index.fingerprint.clone(),
            built_at: index.built_at,
            vectors: index.entries.iter().map(|e| e.vector.clone()).collect(),
            records: index.entries.iter().map(|e| e.record.clone()).collect(),
        };

        let tmp_path = self.temp_path();
        let result = write_synced(&tmp_path, &file).and_then(|()| {
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }
}

fn write_synced(path: &Path, cache: &CacheFile) -> Result<(), SentimentError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, cache)?;
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| SentimentError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}
