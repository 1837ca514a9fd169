//! Annotation pipeline: raw reviews in, annotated corpus out.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::{self, StreamExt};

use crate::corpus::AnnotatedCorpus;
use crate::error::SentimentError;
use crate::scorer::SentimentScorer;
use crate::source::ReviewSource;
use crate::types::{AnnotatedReview, RawReview, Review, SentimentScores};

/// Progress is logged every this many annotated reviews.
const PROGRESS_EVERY: usize = 1000;

/// Loads reviews from a source and annotates each one with sentiment.
pub struct AnnotationPipeline {
    source: Arc<dyn ReviewSource>,
    scorer: Arc<dyn SentimentScorer>,
    concurrency: usize,
}

impl AnnotationPipeline {
    #[must_use]
    pub fn new(
        source: Arc<dyn ReviewSource>,
        scorer: Arc<dyn SentimentScorer>,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            scorer,
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub fn scorer(&self) -> &Arc<dyn SentimentScorer> {
        &self.scorer
    }

    /// Build a fresh corpus from the first `requested_count` source records.
    ///
    /// 1. Read up to `requested_count` raw records in source order.
    /// 2. Parse every date; one bad date fails the whole load.
    /// 3. Drop records whose comments repeat an earlier record's comments.
    /// 4. Score the survivors with bounded parallelism, keeping source order.
    ///
    /// A scorer failure on one record degrades that record to the engine's
    /// neutral scores instead of failing the load.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::InvalidDate`] for an unparseable date, or the
    /// source's error if reading fails.
    pub async fn load(&self, requested_count: usize) -> Result<AnnotatedCorpus, SentimentError> {
        let source = Arc::clone(&self.source);
        let raw = tokio::task::spawn_blocking(move || source.read(requested_count))
            .await
            .map_err(|e| SentimentError::Source(format!("source read task failed: {e}")))??;
        let read_count = raw.len();

        let reviews = parse_reviews(raw)?;
        let (reviews, duplicates_removed) = dedup_by_comments(reviews);
        if duplicates_removed > 0 {
            tracing::info!(
                duplicates_removed,
                remaining = reviews.len(),
                "removed reviews with duplicate comments"
            );
        }

        let annotated = self.annotate(reviews).await;
        tracing::info!(
            requested = requested_count,
            read = read_count,
            annotated = annotated.len(),
            scorer = self.scorer.name(),
            "sentiment annotation complete"
        );

        Ok(AnnotatedCorpus::new(annotated, duplicates_removed))
    }

    async fn annotate(&self, reviews: Vec<Review>) -> Vec<AnnotatedReview> {
        let total = reviews.len();
        let mut annotated = Vec::with_capacity(total);

        // `buffered` yields in input order regardless of completion order.
        let mut scored = stream::iter(reviews)
            .map(|review| {
                let scorer = Arc::clone(&self.scorer);
                async move {
                    let sentiment = score_review(scorer, &review).await;
                    AnnotatedReview { review, sentiment }
                }
            })
            .buffered(self.concurrency);

        while let Some(item) = scored.next().await {
            annotated.push(item);
            if annotated.len() % PROGRESS_EVERY == 0 {
                tracing::info!(processed = annotated.len(), total, "annotating reviews");
            }
        }

        annotated
    }
}

async fn score_review(scorer: Arc<dyn SentimentScorer>, review: &Review) -> SentimentScores {
    let text = review.text();
    if text.trim().is_empty() {
        return scorer.empty_scores();
    }

    let owned = text.to_string();
    let worker = Arc::clone(&scorer);
    match tokio::task::spawn_blocking(move || worker.score(&owned)).await {
        Ok(Ok(scores)) if scores.polarity.is_finite() && scores.subjectivity.is_finite() => scores,
        Ok(Ok(_)) => {
            tracing::warn!(id = review.id, "scorer returned non-finite scores; using neutral");
            scorer.empty_scores()
        }
        Ok(Err(e)) => {
            tracing::warn!(id = review.id, error = %e, "scorer failed; using neutral");
            scorer.empty_scores()
        }
        Err(e) => {
            tracing::warn!(id = review.id, error = %e, "scorer task panicked; using neutral");
            scorer.empty_scores()
        }
    }
}

/// Target size for a reload.
///
/// With a `batch_size`, grows the current load by one batch without passing
/// `requested_count`; without one, jumps straight to `requested_count`.
#[must_use]
pub fn next_load_target(current: usize, batch_size: Option<usize>, requested_count: usize) -> usize {
    match batch_size {
        Some(batch) => current.saturating_add(batch).min(requested_count),
        None => requested_count,
    }
}

/// Parse `YYYY-MM-DD`, or a timestamp whose date part is `YYYY-MM-DD`.
#[must_use]
pub fn parse_review_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_reviews(raw: Vec<RawReview>) -> Result<Vec<Review>, SentimentError> {
    raw.into_iter()
        .map(|r| {
            let date = parse_review_date(&r.date).ok_or_else(|| SentimentError::InvalidDate {
                id: r.id,
                value: r.date.clone(),
            })?;
            Ok(Review {
                id: r.id,
                listing_id: r.listing_id,
                date,
                reviewer_name: r.reviewer_name,
                comments: r.comments,
            })
        })
        .collect()
}

/// Keep the first review for each distinct comments value, in order.
///
/// Absent comments count as one value, so only the first comment-less review survives.
fn dedup_by_comments(mut reviews: Vec<Review>) -> (Vec<Review>, usize) {
    let before = reviews.len();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    reviews.retain(|review| seen.insert(review.comments.clone()));
    let removed = before - reviews.len();
    (reviews, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, date: &str, comments: Option<&str>) -> RawReview {
        RawReview {
            id,
            listing_id: 100,
            date: date.to_string(),
            reviewer_name: format!("guest{id}"),
            comments: comments.map(str::to_string),
        }
    }

    #[test]
    fn next_load_target_grows_by_one_batch() {
        assert_eq!(next_load_target(1000, Some(500), 3000), 1500);
        assert_eq!(next_load_target(2800, Some(500), 3000), 3000);
        assert_eq!(next_load_target(1000, None, 3000), 3000);
    }

    #[test]
    fn parse_review_date_accepts_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2015, 7, 19);
        assert_eq!(parse_review_date("2015-07-19"), expected);
        assert_eq!(parse_review_date(" 2015-07-19 "), expected);
        assert_eq!(parse_review_date("2015-07-19 08:30:00"), expected);
        assert_eq!(parse_review_date("2015-07-19T08:30:00"), expected);
        assert_eq!(parse_review_date("19/07/2015"), None);
        assert_eq!(parse_review_date(""), None);
    }

    #[test]
    fn parse_reviews_fails_fast_on_bad_date() {
        let result = parse_reviews(vec![
            raw(1, "2020-01-01", Some("ok")),
            raw(2, "not a date", Some("bad")),
        ]);
        assert!(
            matches!(result, Err(SentimentError::InvalidDate { id: 2, ref value }) if value == "not a date"),
            "got {result:?}"
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let reviews = parse_reviews(vec![
            raw(1, "2020-01-01", Some("same")),
            raw(2, "2020-01-02", Some("other")),
            raw(3, "2020-01-03", Some("same")),
            raw(4, "2020-01-04", None),
            raw(5, "2020-01-05", None),
        ])
        .unwrap();
        let (kept, removed) = dedup_by_comments(reviews);
        assert_eq!(removed, 2);
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 4]);
    }
}
