//! Sentiment-annotated review corpus with retrieval and semantic search.
//!
//! Reads reviews from a CSV source, deduplicates them by comment text, scores
//! each with a deterministic sentiment engine and publishes the result as an
//! immutable snapshot. Retrieval (pages, statistics, monthly trends, keyword
//! search) runs against that snapshot. Semantic search embeds every review
//! once, caches the vectors on disk keyed by the corpus fingerprint, and ranks
//! by cosine similarity.

pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod pipeline;
pub mod retrieval;
pub mod scorer;
pub mod semantic;
pub mod service;
pub mod source;
pub mod types;
pub mod vector_store;

pub use corpus::{corpus_fingerprint, AnnotatedCorpus, CorpusStore};
pub use embeddings::{embedder_from_config, Embedder, NoopEmbedder, OpenAiEmbedder, TeiClient};
pub use error::{ErrorKind, SentimentError};
pub use pipeline::{next_load_target, parse_review_date, AnnotationPipeline};
pub use retrieval::{
    CorpusStatistics, MonthlyTrend, ReviewExcerpt, ReviewPage, ReviewQuery, Trends,
};
pub use scorer::{scorer_for, CompoundScorer, LexiconScorer, SentimentScorer, SentimentThresholds};
pub use semantic::{cosine_similarity, BuildReport, IndexSource, ScoredReview, SemanticSearch};
pub use service::{Health, ReloadReport, ReviewService};
pub use source::{preview_csv, write_csv_sample, CsvPreview, CsvReviewSource, MemorySource, ReviewSource};
pub use types::{
    AnnotatedReview, LabelCounts, RawReview, Review, SearchResults, SentimentConfig,
    SentimentLabel, SentimentScores,
};
pub use vector_store::{EmbeddingCache, EmbeddingEntry, EmbeddingIndex};
