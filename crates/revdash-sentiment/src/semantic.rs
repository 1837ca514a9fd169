//! Meaning-based search over the embedding cache.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::corpus::AnnotatedCorpus;
use crate::embeddings::Embedder;
use crate::error::SentimentError;
use crate::types::{Review, SearchResults};
use crate::vector_store::{EmbeddingCache, EmbeddingEntry, EmbeddingIndex};

/// Build progress is logged every this many reviews.
const PROGRESS_EVERY: usize = 100;

/// A cached review with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredReview {
    #[serde(flatten)]
    pub record: Review,
    pub similarity_score: f64,
}

/// Where the active embedding index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    /// The in-memory index already matched the corpus.
    Current,
    /// Loaded from the cache file.
    Loaded,
    /// Computed from scratch via the embedder.
    Built,
}

/// Result of [`SemanticSearch::ensure_built`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub source: IndexSource,
    pub entries: usize,
    /// Reviews left out of the index (no comments, or the embedder failed).
    pub skipped: usize,
    /// Whether the index is on disk. `false` if persisting a fresh build failed.
    pub persisted: bool,
    pub fingerprint: String,
}

/// Cosine similarity `a·b / (|a||b|)`, accumulated in `f64`.
///
/// Returns `0.0` when either norm is zero or the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank `entries` by similarity to `query`, best first, keeping at most `top_k`.
///
/// Equal scores keep their cache order.
#[must_use]
pub fn rank(entries: &[EmbeddingEntry], query: &[f32], top_k: usize) -> Vec<ScoredReview> {
    let mut scored: Vec<(usize, f64)> = entries
        .iter()
        .enumerate()
        .map(|(pos, entry)| (pos, cosine_similarity(&entry.vector, query)))
        .collect();

    // `sort_by` is stable, which is what makes tie order deterministic.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(pos, similarity_score)| ScoredReview {
            record: entries[pos].record.clone(),
            similarity_score,
        })
        .collect()
}

/// The published index and whether it has reached the cache file.
#[derive(Clone)]
struct ActiveIndex {
    index: Arc<EmbeddingIndex>,
    persisted: bool,
}

/// Owns the embedding index and answers semantic queries against it.
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    cache: EmbeddingCache,
    concurrency: usize,
    active: RwLock<Option<ActiveIndex>>,
}

impl SemanticSearch {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, cache: EmbeddingCache, concurrency: usize) -> Self {
        Self {
            embedder,
            cache,
            concurrency: concurrency.max(1),
            active: RwLock::new(None),
        }
    }

    /// The active index, if one has been loaded or built.
    #[must_use]
    pub fn index(&self) -> Option<Arc<EmbeddingIndex>> {
        self.active().map(|active| active.index)
    }

    fn active(&self) -> Option<ActiveIndex> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the active index was built from `corpus`.
    #[must_use]
    pub fn is_current_for(&self, corpus: &AnnotatedCorpus) -> bool {
        self.index()
            .is_some_and(|idx| idx.fingerprint() == corpus.fingerprint())
    }

    fn publish(&self, index: Arc<EmbeddingIndex>, persisted: bool) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) =
            Some(ActiveIndex { index, persisted });
    }

    /// Write `index` to the cache file; `false` if the write failed.
    async fn persist(&self, index: &Arc<EmbeddingIndex>) -> bool {
        let cache = self.cache.clone();
        let to_save = Arc::clone(index);
        match tokio::task::spawn_blocking(move || cache.save(&to_save)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(
                    path = %self.cache.path().display(),
                    error = %e,
                    "failed to persist embedding cache"
                );
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "embedding cache write task failed");
                false
            }
        }
    }

    /// Make the active index describe `corpus`.
    ///
    /// Keeps the in-memory index if it already matches; otherwise tries the
    /// cache file; otherwise embeds every review and persists the result. A
    /// cache file built from a different corpus, or one that cannot be
    /// decoded, is treated as a rebuild trigger.
    ///
    /// # Errors
    ///
    /// Returns an error only if the background cache-read task cannot run.
    /// Embedder failures skip the affected reviews, and a failed save is
    /// reported through [`BuildReport::persisted`]. A current index that never
    /// reached disk is written again on the next call.
    pub async fn ensure_built(
        &self,
        corpus: &AnnotatedCorpus,
    ) -> Result<BuildReport, SentimentError> {
        if let Some(active) = self.active() {
            if active.index.fingerprint() == corpus.fingerprint() {
                let mut persisted = active.persisted;
                if !persisted {
                    persisted = self.persist(&active.index).await;
                    if persisted {
                        tracing::info!(
                            path = %self.cache.path().display(),
                            "persisted embedding cache on retry"
                        );
                        self.publish(Arc::clone(&active.index), true);
                    }
                }
                let index = active.index;
                return Ok(BuildReport {
                    source: IndexSource::Current,
                    entries: index.len(),
                    skipped: corpus.len().saturating_sub(index.len()),
                    persisted,
                    fingerprint: index.fingerprint().to_string(),
                });
            }
        }

        let cache = self.cache.clone();
        let loaded = tokio::task::spawn_blocking(move || cache.load())
            .await
            .map_err(|e| SentimentError::Cache(format!("cache read task failed: {e}")))?;

        match loaded {
            Ok(Some(index)) if index.fingerprint() == corpus.fingerprint() => {
                tracing::info!(
                    path = %self.cache.path().display(),
                    entries = index.len(),
                    "loaded embeddings from cache"
                );
                let report = BuildReport {
                    source: IndexSource::Loaded,
                    entries: index.len(),
                    skipped: corpus.len().saturating_sub(index.len()),
                    persisted: true,
                    fingerprint: index.fingerprint().to_string(),
                };
                self.publish(Arc::new(index), true);
                return Ok(report);
            }
            Ok(Some(index)) => {
                tracing::warn!(
                    path = %self.cache.path().display(),
                    cached_fingerprint = index.fingerprint(),
                    corpus_fingerprint = corpus.fingerprint(),
                    cached_entries = index.len(),
                    corpus_size = corpus.len(),
                    "embedding cache was built from a different corpus; rebuilding"
                );
            }
            Ok(None) => {
                tracing::info!(
                    path = %self.cache.path().display(),
                    "no embedding cache found; building"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.cache.path().display(),
                    error = %e,
                    "embedding cache unreadable; rebuilding"
                );
            }
        }

        let (index, skipped) = self.build(corpus).await;
        let index = Arc::new(index);

        let persisted = self.persist(&index).await;

        tracing::info!(entries = index.len(), skipped, persisted, "embedding index built");
        let report = BuildReport {
            source: IndexSource::Built,
            entries: index.len(),
            skipped,
            persisted,
            fingerprint: index.fingerprint().to_string(),
        };
        self.publish(index, persisted);
        Ok(report)
    }

    async fn build(&self, corpus: &AnnotatedCorpus) -> (EmbeddingIndex, usize) {
        let total = corpus.len();
        let reviews: Vec<Review> = corpus
            .reviews()
            .iter()
            .map(|item| item.review.clone())
            .collect();

        // Each future owns its review so the build can run on a spawned task.
        let mut results = stream::iter(reviews)
            .map(|review| embed_review(Arc::clone(&self.embedder), review))
            .buffered(self.concurrency);

        let mut entries: Vec<EmbeddingEntry> = Vec::with_capacity(total);
        let mut processed = 0usize;
        while let Some(result) = results.next().await {
            processed += 1;
            if processed % PROGRESS_EVERY == 0 {
                tracing::info!(processed, total, "embedding reviews");
            }
            let Some(entry) = result else { continue };
            if let Some(first) = entries.first() {
                if first.vector.len() != entry.vector.len() {
                    tracing::warn!(
                        id = entry.record.id,
                        expected = first.vector.len(),
                        got = entry.vector.len(),
                        "embedding dimension mismatch; skipping review"
                    );
                    continue;
                }
            }
            entries.push(entry);
        }

        let skipped = total - entries.len();
        let index = EmbeddingIndex::new(corpus.fingerprint().to_string(), Utc::now(), entries);
        (index, skipped)
    }

    /// Rank cached reviews by similarity to `query`.
    ///
    /// Returns no results when no index is active or the query cannot be
    /// embedded; there is no similarity cut-off.
    pub async fn search(&self, query: &str, top_k: usize) -> SearchResults<ScoredReview> {
        let Some(index) = self.index().filter(|idx| !idx.is_empty()) else {
            return SearchResults::new(Vec::new());
        };

        match self.embedder.embed(query).await {
            Ok(vector) => SearchResults::new(rank(index.entries(), &vector, top_k)),
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed; returning no results");
                SearchResults::new(Vec::new())
            }
        }
    }
}

async fn embed_review(embedder: Arc<dyn Embedder>, review: Review) -> Option<EmbeddingEntry> {
    if review.text().trim().is_empty() {
        return None;
    }
    let embedded = embedder.embed(review.text()).await;
    match embedded {
        Ok(vector) => Some(EmbeddingEntry {
            record: review,
            vector,
        }),
        Err(e) => {
            tracing::warn!(id = review.id, error = %e, "embedding failed; skipping review");
            None
        }
    }
}
