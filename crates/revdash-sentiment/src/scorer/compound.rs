//! Compound-valence engine with positive/negative/neutral share breakdown.

use super::{round3, tokenize, SentimentScorer, SentimentThresholds};
use crate::error::SentimentError;
use crate::types::SentimentScores;

/// Lexicon polarity is scaled onto a `[-4, 4]` valence range.
const VALENCE_SCALE: f64 = 4.0;

/// Negated valence is flipped and dampened.
const NEGATION_FACTOR: f64 = -0.74;

/// Normalization constant for `compound = s / sqrt(s² + alpha)`.
const ALPHA: f64 = 15.0;

/// Scores text by summing word valences and normalizing into `[-1, 1]`.
///
/// `polarity` equals `compound`; subjectivity is estimated as the share of
/// non-neutral weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundScorer;

impl SentimentScorer for CompoundScorer {
    fn name(&self) -> &'static str {
        "compound"
    }

    fn thresholds(&self) -> SentimentThresholds {
        SentimentThresholds::COMPOUND
    }

    fn score(&self, text: &str) -> Result<SentimentScores, SentimentError> {
        let tokens = tokenize(text);
        if tokens.hits.is_empty() {
            return Ok(self.empty_scores());
        }

        let mut sum = 0.0;
        let mut pos_sum = 0.0;
        let mut neg_sum = 0.0;
        for hit in &tokens.hits {
            let mut valence = hit.polarity * VALENCE_SCALE * hit.intensity;
            if hit.negated {
                valence *= NEGATION_FACTOR;
            }
            sum += valence;
            if valence > 0.0 {
                pos_sum += valence;
            } else {
                neg_sum += valence.abs();
            }
        }

        let compound = round3((sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0));

        #[allow(clippy::cast_precision_loss)]
        let neutral_weight = tokens.misses as f64;
        let total = pos_sum + neg_sum + neutral_weight;
        let (positive_share, negative_share, neutral_share) = if total > 0.0 {
            (pos_sum / total, neg_sum / total, neutral_weight / total)
        } else {
            (0.0, 0.0, 1.0)
        };

        Ok(SentimentScores {
            polarity: compound,
            subjectivity: round3(1.0 - neutral_share),
            label: self.thresholds().classify(compound),
            compound: Some(compound),
            positive_share: Some(round3(positive_share)),
            negative_share: Some(round3(negative_share)),
            neutral_share: Some(round3(neutral_share)),
        })
    }

    fn empty_scores(&self) -> SentimentScores {
        SentimentScores {
            compound: Some(0.0),
            positive_share: Some(0.0),
            negative_share: Some(0.0),
            neutral_share: Some(1.0),
            ..SentimentScores::neutral()
        }
    }
}
