use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A review exactly as read from the source, before date parsing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawReview {
    pub id: i64,
    pub listing_id: i64,
    pub date: String,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub comments: Option<String>,
}

/// A parsed review. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub listing_id: i64,
    pub date: NaiveDate,
    pub reviewer_name: String,
    /// Review body. `None` when the source had no text for this row.
    pub comments: Option<String>,
}

impl Review {
    /// The review body, or `""` when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.comments.as_deref().unwrap_or("")
    }
}

/// Sentiment class derived from polarity (or compound) against a threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Parse a wire label. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == value)
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores attached to one piece of text by a sentiment engine.
///
/// The share fields and `compound` are only populated by engines that
/// produce them; shares sum to 1 within rounding tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    /// Valence in `[-1.0, 1.0]`.
    pub polarity: f64,
    /// Opinion vs. fact in `[0.0, 1.0]`.
    pub subjectivity: f64,
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_share: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_share: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral_share: Option<f64>,
}

impl SentimentScores {
    /// Scores for text with no usable content.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            polarity: 0.0,
            subjectivity: 0.0,
            label: SentimentLabel::Neutral,
            compound: None,
            positive_share: None,
            negative_share: None,
            neutral_share: None,
        }
    }
}

/// A review with its sentiment computed once at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedReview {
    #[serde(flatten)]
    pub review: Review,
    #[serde(flatten)]
    pub sentiment: SentimentScores,
}

/// Number of reviews per sentiment label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl LabelCounts {
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Ranked or filtered hits plus their count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> SearchResults<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Settings for the annotation pipeline and the semantic engine.
#[derive(Debug, Clone)]
pub struct SentimentConfig {
    pub data_path: PathBuf,
    pub scorer: revdash_core::ScorerEngine,
    pub scorer_concurrency: usize,
    pub reload_batch_size: usize,
    pub embed_concurrency: usize,
    pub embedding_cache_path: PathBuf,
}

impl SentimentConfig {
    #[must_use]
    pub fn from_app_config(config: &revdash_core::AppConfig) -> Self {
        Self {
            data_path: config.data_path.clone(),
            scorer: config.scorer,
            scorer_concurrency: config.scorer_concurrency.max(1),
            reload_batch_size: config.reload_batch_size.max(1),
            embed_concurrency: config.embed_concurrency.max(1),
            embedding_cache_path: config.embedding_cache_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parse_accepts_only_wire_values() {
        assert_eq!(
            SentimentLabel::parse("positive"),
            Some(SentimentLabel::Positive)
        );
        assert_eq!(
            SentimentLabel::parse("negative"),
            Some(SentimentLabel::Negative)
        );
        assert_eq!(SentimentLabel::parse("neutral"), Some(SentimentLabel::Neutral));
        assert_eq!(SentimentLabel::parse("Positive"), None);
        assert_eq!(SentimentLabel::parse("mixed"), None);
    }

    #[test]
    fn annotated_review_serializes_flat_with_sentiment_key() {
        let item = AnnotatedReview {
            review: Review {
                id: 1,
                listing_id: 42,
                date: NaiveDate::from_ymd_opt(2019, 5, 3).unwrap(),
                reviewer_name: "Ana".to_string(),
                comments: Some("Lovely stay".to_string()),
            },
            sentiment: SentimentScores {
                polarity: 0.5,
                subjectivity: 0.6,
                label: SentimentLabel::Positive,
                ..SentimentScores::neutral()
            },
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["id"], 1);
        assert_eq!(json["date"], "2019-05-03");
        assert_eq!(json["sentiment"], "positive");
        assert!(json.get("compound").is_none());
    }

    #[test]
    fn label_counts_total_matches_records() {
        let mut counts = LabelCounts::default();
        counts.record(SentimentLabel::Positive);
        counts.record(SentimentLabel::Positive);
        counts.record(SentimentLabel::Negative);
        assert_eq!(counts.positive, 2);
        assert_eq!(counts.negative, 1);
        assert_eq!(counts.total(), 3);
    }
}
