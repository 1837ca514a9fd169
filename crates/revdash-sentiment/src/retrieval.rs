//! Read-only views over an annotated corpus: pages, statistics, trends.
//!
//! Everything here takes `&AnnotatedCorpus` and never mutates it.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::corpus::AnnotatedCorpus;
use crate::error::SentimentError;
use crate::types::{AnnotatedReview, LabelCounts, SearchResults, SentimentLabel, SentimentScores};

/// Characters of `comments` kept in a [`ReviewExcerpt`].
pub const EXCERPT_CHARS: usize = 200;

/// Parameters for [`list_reviews`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQuery {
    pub page: usize,
    pub per_page: usize,
    /// Wire label; an unrecognised value means "no filter".
    pub sentiment: Option<String>,
    /// Case-insensitive substring matched against `comments`.
    pub search: Option<String>,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            sentiment: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<AnnotatedReview>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Filter, then paginate.
///
/// The text filter runs before the label filter. A page past the end is an
/// empty page, not an error.
///
/// # Errors
///
/// Returns [`SentimentError::InvalidParameter`] if `page` or `per_page` is 0.
pub fn list_reviews(
    corpus: &AnnotatedCorpus,
    query: &ReviewQuery,
) -> Result<ReviewPage, SentimentError> {
    if query.page == 0 {
        return Err(SentimentError::InvalidParameter(
            "page must be at least 1".to_string(),
        ));
    }
    if query.per_page == 0 {
        return Err(SentimentError::InvalidParameter(
            "per_page must be at least 1".to_string(),
        ));
    }

    let needle = query
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let label = query.sentiment.as_deref().and_then(SentimentLabel::parse);

    let filtered: Vec<&AnnotatedReview> = corpus
        .reviews()
        .iter()
        .filter(|item| needle.as_deref().is_none_or(|n| comments_contain(item, n)))
        .filter(|item| label.is_none_or(|l| item.sentiment.label == l))
        .collect();

    let total = filtered.len();
    let start = (query.page - 1).saturating_mul(query.per_page);
    let reviews = filtered
        .into_iter()
        .skip(start)
        .take(query.per_page)
        .cloned()
        .collect();

    Ok(ReviewPage {
        reviews,
        total,
        page: query.page,
        per_page: query.per_page,
        total_pages: total.div_ceil(query.per_page),
    })
}

/// `needle` must already be lowercase. Absent comments never match.
fn comments_contain(item: &AnnotatedReview, needle: &str) -> bool {
    item.review
        .comments
        .as_deref()
        .is_some_and(|c| c.to_lowercase().contains(needle))
}

/// Substring search over `comments`, returning the first `top_k` matches in
/// corpus order.
///
/// # Errors
///
/// Returns [`SentimentError::InvalidParameter`] for a blank query or a zero
/// `top_k`.
pub fn keyword_search(
    corpus: &AnnotatedCorpus,
    query: &str,
    top_k: usize,
) -> Result<SearchResults<AnnotatedReview>, SentimentError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SentimentError::InvalidParameter(
            "query must not be empty".to_string(),
        ));
    }
    if top_k == 0 {
        return Err(SentimentError::InvalidParameter(
            "top_k must be at least 1".to_string(),
        ));
    }

    let needle = query.to_lowercase();
    let items = corpus
        .reviews()
        .iter()
        .filter(|item| comments_contain(item, &needle))
        .take(top_k)
        .cloned()
        .collect();
    Ok(SearchResults::new(items))
}

/// A short view of one review, used for the statistics extremes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewExcerpt {
    pub id: i64,
    pub reviewer_name: String,
    pub date: NaiveDate,
    pub comments: String,
    pub polarity: f64,
    pub sentiment: SentimentLabel,
}

impl ReviewExcerpt {
    fn from_review(item: &AnnotatedReview) -> Self {
        Self {
            id: item.review.id,
            reviewer_name: item.review.reviewer_name.clone(),
            date: item.review.date,
            comments: excerpt(item.review.text(), EXCERPT_CHARS),
            polarity: item.sentiment.polarity,
            sentiment: item.sentiment.label,
        }
    }
}

/// First `max_chars` characters of `text`, with `...` appended only when
/// something was cut.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Aggregate sentiment over the whole corpus.
///
/// Means are `None` for an empty corpus; standard deviations (sample, n−1)
/// are `None` below two values. Engine-specific components appear only when
/// at least one review carries them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStatistics {
    pub total_reviews: usize,
    pub sentiment_distribution: LabelCounts,
    pub average_polarity: Option<f64>,
    pub average_subjectivity: Option<f64>,
    pub polarity_std: Option<f64>,
    pub subjectivity_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_compound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_positive_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_negative_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_neutral_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_share_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_share_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neutral_share_std: Option<f64>,
    pub most_positive_review: Option<ReviewExcerpt>,
    pub most_negative_review: Option<ReviewExcerpt>,
}

#[must_use]
pub fn statistics(corpus: &AnnotatedCorpus) -> CorpusStatistics {
    let reviews = corpus.reviews();

    let mut distribution = LabelCounts::default();
    let mut most_positive: Option<&AnnotatedReview> = None;
    let mut most_negative: Option<&AnnotatedReview> = None;
    for item in reviews {
        distribution.record(item.sentiment.label);
        // Strict comparisons keep the first record on ties.
        if most_positive.is_none_or(|best| item.sentiment.polarity > best.sentiment.polarity) {
            most_positive = Some(item);
        }
        if most_negative.is_none_or(|worst| item.sentiment.polarity < worst.sentiment.polarity) {
            most_negative = Some(item);
        }
    }

    let polarity: Vec<f64> = reviews.iter().map(|r| r.sentiment.polarity).collect();
    let subjectivity: Vec<f64> = reviews.iter().map(|r| r.sentiment.subjectivity).collect();
    let compound = component(reviews, |s| s.compound);
    let positive_share = component(reviews, |s| s.positive_share);
    let negative_share = component(reviews, |s| s.negative_share);
    let neutral_share = component(reviews, |s| s.neutral_share);

    CorpusStatistics {
        total_reviews: reviews.len(),
        sentiment_distribution: distribution,
        average_polarity: mean(&polarity),
        average_subjectivity: mean(&subjectivity),
        polarity_std: sample_std(&polarity),
        subjectivity_std: sample_std(&subjectivity),
        average_compound: mean(&compound),
        compound_std: sample_std(&compound),
        average_positive_share: mean(&positive_share),
        average_negative_share: mean(&negative_share),
        average_neutral_share: mean(&neutral_share),
        positive_share_std: sample_std(&positive_share),
        negative_share_std: sample_std(&negative_share),
        neutral_share_std: sample_std(&neutral_share),
        most_positive_review: most_positive.map(ReviewExcerpt::from_review),
        most_negative_review: most_negative.map(ReviewExcerpt::from_review),
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Values of an engine-specific component, from the reviews that carry it.
fn component(
    reviews: &[AnnotatedReview],
    field: impl Fn(&SentimentScores) -> Option<f64>,
) -> Vec<f64> {
    reviews.iter().filter_map(|r| field(&r.sentiment)).collect()
}

#[allow(clippy::cast_precision_loss)]
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Sentiment for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`.
    pub month: String,
    pub count: usize,
    pub mean_polarity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_compound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_positive_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_negative_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_neutral_share: Option<f64>,
    pub per_label_counts: LabelCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub monthly: Vec<MonthlyTrend>,
}

/// Running mean of a component that not every review carries.
#[derive(Default)]
struct PartialMean {
    sum: f64,
    count: usize,
}

impl PartialMean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Default)]
struct MonthAccumulator {
    count: usize,
    polarity_sum: f64,
    compound: PartialMean,
    positive_share: PartialMean,
    negative_share: PartialMean,
    neutral_share: PartialMean,
    labels: LabelCounts,
}

/// Group reviews by calendar month, ascending. Months with no reviews are
/// omitted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn trends(corpus: &AnnotatedCorpus) -> Trends {
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();
    for item in corpus.reviews() {
        let key = (item.review.date.year(), item.review.date.month());
        let acc = months.entry(key).or_default();
        acc.count += 1;
        acc.polarity_sum += item.sentiment.polarity;
        acc.compound.add(item.sentiment.compound);
        acc.positive_share.add(item.sentiment.positive_share);
        acc.negative_share.add(item.sentiment.negative_share);
        acc.neutral_share.add(item.sentiment.neutral_share);
        acc.labels.record(item.sentiment.label);
    }

    let monthly = months
        .into_iter()
        .map(|((year, month), acc)| MonthlyTrend {
            month: format!("{year:04}-{month:02}"),
            count: acc.count,
            mean_polarity: acc.polarity_sum / acc.count as f64,
            mean_compound: acc.compound.mean(),
            mean_positive_share: acc.positive_share.mean(),
            mean_negative_share: acc.negative_share.mean(),
            mean_neutral_share: acc.neutral_share.mean(),
            per_label_counts: acc.labels,
        })
        .collect();

    Trends { monthly }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Review, SentimentScores};

    fn item(id: i64, date: (i32, u32, u32), comments: Option<&str>, polarity: f64) -> AnnotatedReview {
        let label = if polarity > 0.1 {
            SentimentLabel::Positive
        } else if polarity < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        AnnotatedReview {
            review: Review {
                id,
                listing_id: 1,
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                reviewer_name: format!("guest{id}"),
                comments: comments.map(str::to_string),
            },
            sentiment: SentimentScores {
                polarity,
                subjectivity: 0.5,
                label,
                ..SentimentScores::neutral()
            },
        }
    }

    fn sample_corpus() -> AnnotatedCorpus {
        AnnotatedCorpus::new(
            vec![
                item(1, (2019, 3, 2), Some("Great location, very clean"), 0.8),
                item(2, (2019, 3, 20), Some("Dirty and NOISY room"), -0.9),
                item(3, (2019, 1, 5), Some("It was a flat."), 0.0),
                item(4, (2020, 2, 1), None, 0.0),
                item(5, (2019, 1, 9), Some("clean enough"), 0.3),
            ],
            0,
        )
    }

    fn query(page: usize, per_page: usize) -> ReviewQuery {
        ReviewQuery {
            page,
            per_page,
            ..ReviewQuery::default()
        }
    }

    #[test]
    fn list_reviews_paginates_with_clipped_last_page() {
        let corpus = sample_corpus();
        let page = list_reviews(&corpus, &query(2, 2)).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.reviews.iter().map(|r| r.review.id).collect::<Vec<_>>(), vec![3, 4]);

        let last = list_reviews(&corpus, &query(3, 2)).unwrap();
        assert_eq!(last.reviews.len(), 1);

        let beyond = list_reviews(&corpus, &query(9, 2)).unwrap();
        assert!(beyond.reviews.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[test]
    fn list_reviews_rejects_zero_page_or_size() {
        let corpus = sample_corpus();
        assert!(matches!(
            list_reviews(&corpus, &query(0, 10)),
            Err(SentimentError::InvalidParameter(_))
        ));
        assert!(matches!(
            list_reviews(&corpus, &query(1, 0)),
            Err(SentimentError::InvalidParameter(_))
        ));
    }

    #[test]
    fn search_is_case_insensitive_and_skips_missing_comments() {
        let corpus = sample_corpus();
        let page = list_reviews(
            &corpus,
            &ReviewQuery {
                search: Some("CLEAN".to_string()),
                ..ReviewQuery::default()
            },
        )
        .unwrap();
        assert_eq!(page.reviews.iter().map(|r| r.review.id).collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn search_then_label_filter_combine() {
        let corpus = sample_corpus();
        let page = list_reviews(
            &corpus,
            &ReviewQuery {
                search: Some("clean".to_string()),
                sentiment: Some("positive".to_string()),
                ..ReviewQuery::default()
            },
        )
        .unwrap();
        assert_eq!(page.total, 2);

        let negative = list_reviews(
            &corpus,
            &ReviewQuery {
                search: Some("clean".to_string()),
                sentiment: Some("negative".to_string()),
                ..ReviewQuery::default()
            },
        )
        .unwrap();
        assert_eq!(negative.total, 0);
        assert_eq!(negative.total_pages, 0);
    }

    #[test]
    fn unknown_sentiment_filter_is_ignored() {
        let corpus = sample_corpus();
        let page = list_reviews(
            &corpus,
            &ReviewQuery {
                sentiment: Some("ecstatic".to_string()),
                ..ReviewQuery::default()
            },
        )
        .unwrap();
        assert_eq!(page.total, 5);
    }

    #[test]
    fn statistics_for_three_review_scenario() {
        let corpus = AnnotatedCorpus::new(
            vec![
                item(1, (2020, 1, 1), Some("a"), 0.8),
                item(2, (2020, 1, 2), Some("b"), -0.9),
                item(3, (2020, 1, 3), Some("c"), 0.0),
            ],
            0,
        );
        let stats = statistics(&corpus);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.most_positive_review.as_ref().unwrap().polarity, 0.8);
        assert_eq!(stats.most_negative_review.as_ref().unwrap().polarity, -0.9);
        let avg = stats.average_polarity.unwrap();
        assert!((avg - (-0.1 / 3.0)).abs() < 1e-9, "avg = {avg}");
        assert_eq!(stats.sentiment_distribution.total(), 3);
        assert!(stats.average_compound.is_none());
    }

    #[test]
    fn statistics_ties_keep_first_occurrence() {
        let corpus = AnnotatedCorpus::new(
            vec![
                item(1, (2020, 1, 1), Some("first"), 0.5),
                item(2, (2020, 1, 2), Some("second"), 0.5),
            ],
            0,
        );
        let stats = statistics(&corpus);
        assert_eq!(stats.most_positive_review.unwrap().id, 1);
        assert_eq!(stats.most_negative_review.unwrap().id, 1);
    }

    #[test]
    fn statistics_std_is_not_computed_below_two_reviews() {
        let single = AnnotatedCorpus::new(vec![item(1, (2020, 1, 1), Some("x"), 0.4)], 0);
        let stats = statistics(&single);
        assert_eq!(stats.average_polarity, Some(0.4));
        assert!(stats.polarity_std.is_none());

        let empty = statistics(&AnnotatedCorpus::new(Vec::new(), 0));
        assert_eq!(empty.total_reviews, 0);
        assert!(empty.average_polarity.is_none());
        assert!(empty.most_positive_review.is_none());
    }

    #[test]
    fn statistics_std_uses_sample_denominator() {
        let corpus = AnnotatedCorpus::new(
            vec![
                item(1, (2020, 1, 1), Some("a"), 1.0),
                item(2, (2020, 1, 2), Some("b"), -1.0),
            ],
            0,
        );
        let std = statistics(&corpus).polarity_std.unwrap();
        assert!((std - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("short", 200), "short");
        let long = "é".repeat(250);
        let cut = excerpt(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt(&"a".repeat(200), 200), "a".repeat(200));
    }

    #[test]
    fn trends_group_by_month_ascending() {
        let monthly = trends(&sample_corpus()).monthly;
        let months: Vec<&str> = monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2019-01", "2019-03", "2020-02"]);

        let march = &monthly[1];
        assert_eq!(march.count, 2);
        assert!((march.mean_polarity - (-0.05)).abs() < 1e-9);
        assert_eq!(march.per_label_counts.positive, 1);
        assert_eq!(march.per_label_counts.negative, 1);
        assert!(march.mean_compound.is_none());
    }

    fn with_components(
        id: i64,
        date: (i32, u32, u32),
        compound: f64,
        shares: (f64, f64, f64),
    ) -> AnnotatedReview {
        let mut review = item(id, date, Some("scored"), compound);
        review.sentiment.compound = Some(compound);
        review.sentiment.positive_share = Some(shares.0);
        review.sentiment.negative_share = Some(shares.1);
        review.sentiment.neutral_share = Some(shares.2);
        review
    }

    #[test]
    fn engine_components_get_means_and_std() {
        let corpus = AnnotatedCorpus::new(
            vec![
                with_components(1, (2021, 5, 1), 0.6, (0.5, 0.0, 0.5)),
                with_components(2, (2021, 5, 9), -0.4, (0.1, 0.3, 0.6)),
                with_components(3, (2021, 6, 2), 0.0, (0.0, 0.0, 1.0)),
            ],
            0,
        );

        let stats = statistics(&corpus);
        assert!((stats.average_compound.unwrap() - (0.2 / 3.0)).abs() < 1e-9);
        assert!((stats.average_positive_share.unwrap() - 0.2).abs() < 1e-9);
        assert!((stats.average_neutral_share.unwrap() - 0.7).abs() < 1e-9);
        // positive shares 0.5, 0.1, 0.0 around a mean of 0.2
        let expected = ((0.09 + 0.01 + 0.04) / 2.0f64).sqrt();
        assert!((stats.positive_share_std.unwrap() - expected).abs() < 1e-9);
        assert!(stats.negative_share_std.is_some());
        assert!(stats.neutral_share_std.is_some());

        let monthly = trends(&corpus).monthly;
        let may = &monthly[0];
        assert_eq!(may.month, "2021-05");
        assert!((may.mean_compound.unwrap() - 0.1).abs() < 1e-9);
        assert!((may.mean_positive_share.unwrap() - 0.3).abs() < 1e-9);
        assert!((may.mean_negative_share.unwrap() - 0.15).abs() < 1e-9);
        assert!((may.mean_neutral_share.unwrap() - 0.55).abs() < 1e-9);
        assert_eq!(monthly[1].mean_neutral_share, Some(1.0));
    }

    #[test]
    fn components_are_omitted_for_polarity_engines() {
        let stats = statistics(&sample_corpus());
        assert!(stats.positive_share_std.is_none());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("neutral_share_std").is_none());

        let month = serde_json::to_value(&trends(&sample_corpus()).monthly[0]).unwrap();
        assert!(month.get("mean_positive_share").is_none());
    }

    #[test]
    fn keyword_search_returns_first_matches_in_order() {
        let corpus = sample_corpus();
        let hits = keyword_search(&corpus, "clean", 1).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].review.id, 1);

        assert!(matches!(
            keyword_search(&corpus, "  ", 5),
            Err(SentimentError::InvalidParameter(_))
        ));
        assert!(keyword_search(&corpus, "nowhere", 5).unwrap().items.is_empty());
    }
}
