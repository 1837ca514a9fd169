//! The review service: one owner for the corpus, the embedding index, and
//! the write operations that replace them.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::corpus::{AnnotatedCorpus, CorpusStore};
use crate::embeddings::embedder_from_config;
use crate::error::SentimentError;
use crate::pipeline::{next_load_target, AnnotationPipeline};
use crate::retrieval::{self, CorpusStatistics, ReviewPage, ReviewQuery, Trends};
use crate::scorer::scorer_for;
use crate::semantic::{BuildReport, ScoredReview, SemanticSearch};
use crate::source::CsvReviewSource;
use crate::types::{AnnotatedReview, SearchResults, SentimentConfig, SentimentScores};
use crate::vector_store::EmbeddingCache;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub loaded_count: usize,
    /// Generation of the published corpus, `None` before the first load.
    pub generation: Option<u64>,
    pub semantic_entries: usize,
    /// Whether the embedding index was built from the published corpus.
    pub semantic_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    pub loaded_count: usize,
    pub requested_count: usize,
    /// Source records read for this load.
    pub target: usize,
    pub duplicates_removed: usize,
    pub generation: u64,
}

/// Facade over the annotation pipeline, retrieval engine and semantic search.
///
/// Reads work on an `Arc` snapshot of the corpus and never wait for writers.
/// `reload` and `build_embeddings` hold the write gate for their whole
/// duration, so writes never interleave.
pub struct ReviewService {
    pipeline: AnnotationPipeline,
    store: CorpusStore,
    semantic: SemanticSearch,
    write_gate: Mutex<()>,
    reload_batch_size: usize,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        pipeline: AnnotationPipeline,
        semantic: SemanticSearch,
        reload_batch_size: usize,
    ) -> Self {
        Self {
            pipeline,
            store: CorpusStore::new(),
            semantic,
            write_gate: Mutex::new(()),
            reload_batch_size: reload_batch_size.max(1),
        }
    }

    /// Wire up the CSV source, configured scorer and embedder.
    ///
    /// Nothing is loaded yet; call [`ReviewService::reload`] to publish a corpus.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Embed`] or [`SentimentError::Http`] if the
    /// embedder cannot be constructed.
    pub fn from_config(config: &revdash_core::AppConfig) -> Result<Self, SentimentError> {
        let settings = SentimentConfig::from_app_config(config);
        let pipeline = AnnotationPipeline::new(
            Arc::new(CsvReviewSource::new(&settings.data_path)),
            scorer_for(settings.scorer),
            settings.scorer_concurrency,
        );
        let semantic = SemanticSearch::new(
            embedder_from_config(config)?,
            EmbeddingCache::new(&settings.embedding_cache_path),
            settings.embed_concurrency,
        );
        Ok(Self::new(pipeline, semantic, settings.reload_batch_size))
    }

    /// Configured default step for incremental reloads.
    #[must_use]
    pub fn reload_batch_size(&self) -> usize {
        self.reload_batch_size
    }

    /// The published corpus.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::NotLoaded`] before the first successful load.
    pub fn corpus(&self) -> Result<Arc<AnnotatedCorpus>, SentimentError> {
        self.store.snapshot().ok_or(SentimentError::NotLoaded)
    }

    #[must_use]
    pub fn health(&self) -> Health {
        let corpus = self.store.snapshot();
        let index = self.semantic.index();
        Health {
            status: "healthy",
            loaded_count: corpus.as_ref().map_or(0, |c| c.len()),
            generation: corpus.as_ref().map(|c| c.generation()),
            semantic_entries: index.as_ref().map_or(0, |i| i.len()),
            semantic_current: corpus
                .as_deref()
                .is_some_and(|c| self.semantic.is_current_for(c)),
        }
    }

    /// Score arbitrary text without touching the corpus.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::EmptyText`] for empty or whitespace-only text,
    /// or the scorer's own error.
    pub fn analyze_text(&self, text: &str) -> Result<SentimentScores, SentimentError> {
        if text.trim().is_empty() {
            return Err(SentimentError::EmptyText);
        }
        self.pipeline.scorer().score(text)
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::NotLoaded`] or
    /// [`SentimentError::InvalidParameter`] for a zero page or page size.
    pub fn list_reviews(&self, query: &ReviewQuery) -> Result<ReviewPage, SentimentError> {
        let corpus = self.corpus()?;
        retrieval::list_reviews(&corpus, query)
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::NotLoaded`] before the first load.
    pub fn statistics(&self) -> Result<CorpusStatistics, SentimentError> {
        let corpus = self.corpus()?;
        Ok(retrieval::statistics(&corpus))
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::NotLoaded`] before the first load.
    pub fn trends(&self) -> Result<Trends, SentimentError> {
        let corpus = self.corpus()?;
        Ok(retrieval::trends(&corpus))
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::NotLoaded`] or
    /// [`SentimentError::InvalidParameter`] for a blank query or zero `top_k`.
    pub fn keyword_search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<SearchResults<AnnotatedReview>, SentimentError> {
        let corpus = self.corpus()?;
        retrieval::keyword_search(&corpus, query, top_k)
    }

    /// Rebuild the corpus and publish it.
    ///
    /// With `batch_size`, grows the current load by one batch toward
    /// `requested_count`; without it, loads `requested_count` records. The
    /// whole corpus is re-read and re-annotated either way. On failure the
    /// previously published corpus stays active.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::InvalidParameter`] for a zero count or batch
    /// size, or the pipeline's load error.
    pub async fn reload(
        &self,
        requested_count: usize,
        batch_size: Option<usize>,
    ) -> Result<ReloadReport, SentimentError> {
        if requested_count == 0 {
            return Err(SentimentError::InvalidParameter(
                "requested_count must be at least 1".to_string(),
            ));
        }
        if batch_size == Some(0) {
            return Err(SentimentError::InvalidParameter(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let _guard = self.write_gate.lock().await;

        let current = self.store.snapshot().map_or(0, |c| c.source_records());
        let target = next_load_target(current, batch_size, requested_count);
        tracing::info!(current, target, requested_count, "reloading reviews");

        let corpus = match self.pipeline.load(target).await {
            Ok(corpus) => corpus,
            Err(e) => {
                tracing::error!(error = %e, target, "reload failed; keeping previous corpus");
                return Err(e);
            }
        };
        let published = self.store.publish(corpus);

        tracing::info!(
            loaded_count = published.len(),
            generation = published.generation(),
            "published corpus"
        );
        Ok(ReloadReport {
            loaded_count: published.len(),
            requested_count,
            target,
            duplicates_removed: published.duplicates_removed(),
            generation: published.generation(),
        })
    }

    /// Load the embedding index for the published corpus, building it if the
    /// cache is missing or describes a different corpus.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::NotLoaded`] before the first load.
    pub async fn build_embeddings(&self) -> Result<BuildReport, SentimentError> {
        let _guard = self.write_gate.lock().await;
        let corpus = self.corpus()?;
        self.semantic.ensure_built(&corpus).await
    }

    /// Rank embedded reviews by similarity to `query`.
    ///
    /// Yields no results when the index is not built or the query cannot be
    /// embedded.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::InvalidParameter`] for a blank query or zero
    /// `top_k`.
    pub async fn semantic_search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<SearchResults<ScoredReview>, SentimentError> {
        if query.trim().is_empty() {
            return Err(SentimentError::InvalidParameter(
                "query must not be empty".to_string(),
            ));
        }
        if top_k == 0 {
            return Err(SentimentError::InvalidParameter(
                "top_k must be at least 1".to_string(),
            ));
        }
        if let (Some(corpus), Some(index)) = (self.store.snapshot(), self.semantic.index()) {
            if index.fingerprint() != corpus.fingerprint() {
                tracing::warn!(
                    generation = corpus.generation(),
                    index_fingerprint = index.fingerprint(),
                    corpus_fingerprint = corpus.fingerprint(),
                    "semantic index describes an earlier corpus; rebuild embeddings to refresh it"
                );
            }
        }
        Ok(self.semantic.search(query, top_k).await)
    }
}
