//! Averaged-polarity lexicon engine.

use super::{round3, tokenize, SentimentScorer, SentimentThresholds};
use crate::error::SentimentError;
use crate::types::SentimentScores;

/// Negated words keep half their weight with the sign flipped.
const NEGATION_FACTOR: f64 = -0.5;

/// Scores text as the mean polarity and mean subjectivity of its lexicon words.
///
/// Returns `polarity = 0, subjectivity = 0` for empty or unknown text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn thresholds(&self) -> SentimentThresholds {
        SentimentThresholds::POLARITY
    }

    fn score(&self, text: &str) -> Result<SentimentScores, SentimentError> {
        let tokens = tokenize(text);
        if tokens.hits.is_empty() {
            return Ok(self.empty_scores());
        }

        #[allow(clippy::cast_precision_loss)]
        let n = tokens.hits.len() as f64;
        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        for hit in &tokens.hits {
            let mut polarity = (hit.polarity * hit.intensity).clamp(-1.0, 1.0);
            if hit.negated {
                polarity *= NEGATION_FACTOR;
            }
            polarity_sum += polarity;
            subjectivity_sum += (hit.subjectivity * hit.intensity).min(1.0);
        }

        let polarity = round3((polarity_sum / n).clamp(-1.0, 1.0));
        let subjectivity = round3((subjectivity_sum / n).clamp(0.0, 1.0));

        Ok(SentimentScores {
            polarity,
            subjectivity,
            label: self.thresholds().classify(polarity),
            ..SentimentScores::neutral()
        })
    }
}
