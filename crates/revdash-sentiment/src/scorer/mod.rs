//! Sentiment engines that annotate review text.

mod compound;
mod lexicon;

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::SentimentError;
use crate::types::{SentimentLabel, SentimentScores};

pub use compound::CompoundScorer;
pub use lexicon::LexiconScorer;

/// Label cut-offs for a sentiment engine.
///
/// A value strictly above `upper` is positive, strictly below `lower` is
/// negative, anything in between (inclusive) is neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentThresholds {
    pub lower: f64,
    pub upper: f64,
}

impl SentimentThresholds {
    /// Cut-offs used by the averaged-polarity lexicon engine.
    pub const POLARITY: Self = Self {
        lower: -0.1,
        upper: 0.1,
    };

    /// Cut-offs used by the compound-valence engine.
    pub const COMPOUND: Self = Self {
        lower: -0.05,
        upper: 0.05,
    };

    #[must_use]
    pub fn classify(self, value: f64) -> SentimentLabel {
        if value > self.upper {
            SentimentLabel::Positive
        } else if value < self.lower {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// A deterministic text → sentiment function.
///
/// Implementations must be pure: the same text always yields the same scores.
pub trait SentimentScorer: Send + Sync {
    /// Short engine identifier used in logs.
    fn name(&self) -> &'static str;

    fn thresholds(&self) -> SentimentThresholds;

    /// Score one piece of text.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Scorer`] if the engine cannot score the text.
    fn score(&self, text: &str) -> Result<SentimentScores, SentimentError>;

    /// Scores assigned to text with no usable content.
    fn empty_scores(&self) -> SentimentScores {
        SentimentScores::neutral()
    }
}

/// Build the engine selected in configuration.
#[must_use]
pub fn scorer_for(engine: revdash_core::ScorerEngine) -> Arc<dyn SentimentScorer> {
    match engine {
        revdash_core::ScorerEngine::Lexicon => Arc::new(LexiconScorer),
        revdash_core::ScorerEngine::Compound => Arc::new(CompoundScorer),
    }
}

/// Review-domain word weights shared by both engines.
///
/// Each entry is `(word, polarity, subjectivity)`. Polarity is in
/// `[-1.0, 1.0]`, subjectivity in `[0.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f64, f64)] = &[
    // Positive
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("beautiful", 0.85, 1.0),
    ("best", 1.0, 0.3),
    ("charming", 0.5, 0.6),
    ("clean", 0.367, 0.692),
    ("comfortable", 0.4, 0.7),
    ("comfy", 0.4, 0.7),
    ("convenient", 0.4, 0.6),
    ("cozy", 0.5, 0.7),
    ("delightful", 0.7, 0.8),
    ("easy", 0.433, 0.833),
    ("enjoyed", 0.5, 0.6),
    ("excellent", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("friendly", 0.375, 0.5),
    ("gorgeous", 0.7, 0.8),
    ("great", 0.8, 0.75),
    ("good", 0.7, 0.6),
    ("happy", 0.8, 1.0),
    ("helpful", 0.5, 0.6),
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("lovely", 0.5, 0.75),
    ("nice", 0.6, 1.0),
    ("perfect", 1.0, 1.0),
    ("pleasant", 0.733, 0.967),
    ("quiet", 0.1, 0.3),
    ("recommend", 0.4, 0.5),
    ("recommended", 0.4, 0.5),
    ("responsive", 0.4, 0.5),
    ("safe", 0.5, 0.5),
    ("spacious", 0.4, 0.5),
    ("spotless", 0.8, 0.8),
    ("welcoming", 0.6, 0.7),
    ("wonderful", 1.0, 1.0),
    // Negative
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.667),
    ("broken", -0.4, 0.5),
    ("cold", -0.6, 1.0),
    ("cramped", -0.5, 0.6),
    ("dirty", -0.6, 0.8),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("disgusting", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("loud", -0.3, 0.5),
    ("mess", -0.5, 0.6),
    ("messy", -0.5, 0.6),
    ("noisy", -0.5, 0.6),
    ("poor", -0.4, 0.6),
    ("problem", -0.4, 0.5),
    ("rude", -0.6, 0.8),
    ("smelly", -0.6, 0.8),
    ("terrible", -1.0, 1.0),
    ("uncomfortable", -0.5, 0.7),
    ("unfortunately", -0.5, 1.0),
    ("unsafe", -0.6, 0.7),
    ("worst", -1.0, 1.0),
];

/// Words that invert the sentiment word following them.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "nothing", "none", "neither", "nor", "without", "hardly", "barely",
];

/// Modifiers that scale the sentiment word following them.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("super", 1.3),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("quite", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.5),
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]+(?:'[a-z]+)?").expect("valid word regex"));

/// A lexicon hit after negation and intensity have been applied.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WordHit {
    pub polarity: f64,
    pub subjectivity: f64,
    pub negated: bool,
    pub intensity: f64,
}

/// Tokenized text: the lexicon hits plus the number of tokens that missed.
#[derive(Debug, Default)]
pub(crate) struct Tokens {
    pub hits: Vec<WordHit>,
    pub misses: usize,
}

/// Lowercase `text`, split it into words, and resolve lexicon entries.
pub(crate) fn tokenize(text: &str) -> Tokens {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();

    let mut tokens = Tokens::default();
    for (i, word) in words.iter().enumerate() {
        let Some(&(_, polarity, subjectivity)) = LEXICON.iter().find(|(w, _, _)| w == word) else {
            tokens.misses += 1;
            continue;
        };

        let mut intensity = 1.0;
        let mut negated = false;
        if let Some(prev) = i.checked_sub(1).map(|j| words[j]) {
            if let Some(&(_, scale)) = INTENSIFIERS.iter().find(|(w, _)| *w == prev) {
                intensity = scale;
                negated = i.checked_sub(2).is_some_and(|j| is_negator(words[j]));
            } else {
                negated = is_negator(prev);
            }
        }

        tokens.hits.push(WordHit {
            polarity,
            subjectivity,
            negated,
            intensity,
        });
    }
    tokens
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word) || word.ends_with("n't")
}

/// Round to three decimals.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
