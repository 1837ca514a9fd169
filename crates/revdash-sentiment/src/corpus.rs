//! The annotated corpus and the store that publishes it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sha2::{Digest, Sha256};

use crate::types::{AnnotatedReview, Review};

/// An immutable, fully annotated load of reviews in source order.
#[derive(Debug, Clone)]
pub struct AnnotatedCorpus {
    generation: u64,
    fingerprint: String,
    duplicates_removed: usize,
    reviews: Vec<AnnotatedReview>,
    index: HashMap<i64, usize>,
}

impl AnnotatedCorpus {
    /// Build a corpus from already-annotated reviews.
    ///
    /// The generation stays `0` until the corpus is published through a
    /// [`CorpusStore`].
    #[must_use]
    pub fn new(reviews: Vec<AnnotatedReview>, duplicates_removed: usize) -> Self {
        let mut index = HashMap::with_capacity(reviews.len());
        for (pos, item) in reviews.iter().enumerate() {
            index.entry(item.review.id).or_insert(pos);
        }
        let fingerprint = corpus_fingerprint(reviews.iter().map(|r| &r.review));
        Self {
            generation: 0,
            fingerprint,
            duplicates_removed,
            reviews,
            index,
        }
    }

    #[must_use]
    pub fn reviews(&self) -> &[AnnotatedReview] {
        &self.reviews
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Look up a review by its natural key.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&AnnotatedReview> {
        self.index.get(&id).map(|&pos| &self.reviews[pos])
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Content identity of this corpus; see [`corpus_fingerprint`].
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// How many source records were dropped as duplicate comments.
    #[must_use]
    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    /// Source records read to build this corpus, duplicates included.
    #[must_use]
    pub fn source_records(&self) -> usize {
        self.reviews.len() + self.duplicates_removed
    }
}

/// SHA-256 over the ordered `(id, comments)` pairs, hex-encoded.
///
/// Two corpora with the same fingerprint contain the same reviews in the
/// same order, which is what the embedding cache is positionally aligned to.
pub fn corpus_fingerprint<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> String {
    let mut hasher = Sha256::new();
    for review in reviews {
        hasher.update(review.id.to_be_bytes());
        match &review.comments {
            Some(text) => {
                hasher.update([1u8]);
                hasher.update((text.len() as u64).to_be_bytes());
                hasher.update(text.as_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Holds the current corpus snapshot and swaps it atomically on publish.
///
/// Readers clone the `Arc` and keep using their snapshot for as long as they
/// need it; a later publish never mutates a snapshot already handed out.
#[derive(Debug, Default)]
pub struct CorpusStore {
    current: RwLock<Option<Arc<AnnotatedCorpus>>>,
    generations: AtomicU64,
}

impl CorpusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published corpus, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<AnnotatedCorpus>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current corpus, assigning it the next generation number.
    pub fn publish(&self, mut corpus: AnnotatedCorpus) -> Arc<AnnotatedCorpus> {
        corpus.generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let corpus = Arc::new(corpus);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&corpus));
        corpus
    }

    /// Number of reviews in the current corpus, `0` when nothing is loaded.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.snapshot().map_or(0, |c| c.len())
    }
}
