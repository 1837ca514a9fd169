use chrono::NaiveDate;
use proptest::prelude::*;
use revdash_sentiment::retrieval::{list_reviews, ReviewQuery};
use revdash_sentiment::{
    cosine_similarity, AnnotatedCorpus, AnnotatedReview, Review, SentimentLabel, SentimentScores,
    SentimentThresholds,
};

fn corpus_from(labels: &[u8]) -> AnnotatedCorpus {
    let reviews = labels
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let label = SentimentLabel::ALL[usize::from(*l % 3)];
            AnnotatedReview {
                review: Review {
                    id: i64::try_from(i).unwrap(),
                    listing_id: 1,
                    date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    reviewer_name: String::new(),
                    comments: Some(format!("review {i}")),
                },
                sentiment: SentimentScores {
                    label,
                    ..SentimentScores::neutral()
                },
            }
        })
        .collect();
    AnnotatedCorpus::new(reviews, 0)
}

proptest! {
    #[test]
    fn page_length_matches_formula(
        labels in prop::collection::vec(any::<u8>(), 0..120),
        page in 1usize..20,
        per_page in 1usize..30,
    ) {
        let corpus = corpus_from(&labels);
        let result = list_reviews(&corpus, &ReviewQuery { page, per_page, ..ReviewQuery::default() }).unwrap();

        let total = labels.len();
        let expected = per_page.min(total.saturating_sub((page - 1) * per_page));
        prop_assert_eq!(result.total, total);
        prop_assert_eq!(result.reviews.len(), expected);
        prop_assert_eq!(result.total_pages, total.div_ceil(per_page));
    }

    #[test]
    fn label_filter_is_idempotent(
        labels in prop::collection::vec(any::<u8>(), 0..80),
        which in 0usize..3,
    ) {
        let label = SentimentLabel::ALL[which];
        let corpus = corpus_from(&labels);
        let query = ReviewQuery {
            per_page: 1000,
            sentiment: Some(label.as_str().to_string()),
            ..ReviewQuery::default()
        };

        let once = list_reviews(&corpus, &query).unwrap();
        let refiltered = AnnotatedCorpus::new(once.reviews.clone(), 0);
        let twice = list_reviews(&refiltered, &query).unwrap();

        prop_assert_eq!(&once.reviews, &twice.reviews);
        prop_assert!(once.reviews.iter().all(|r| r.sentiment.label == label));
    }

    #[test]
    fn labels_never_decrease_as_score_rises(a in -1.0f64..1.0, b in -1.0f64..1.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        for thresholds in [SentimentThresholds::COMPOUND, SentimentThresholds::POLARITY] {
            prop_assert!(rank(thresholds.classify(low)) <= rank(thresholds.classify(high)));
        }
    }

    #[test]
    fn self_similarity_is_one(v in prop::collection::vec(-100.0f32..100.0, 1..64)) {
        prop_assume!(v.iter().any(|x| x.abs() > 1e-3));
        let sim = cosine_similarity(&v, &v);
        prop_assert!((sim - 1.0).abs() < 1e-9, "sim = {}", sim);
    }
}

fn rank(label: SentimentLabel) -> u8 {
    match label {
        SentimentLabel::Negative => 0,
        SentimentLabel::Neutral => 1,
        SentimentLabel::Positive => 2,
    }
}

#[test]
fn threshold_boundaries_are_neutral() {
    let compound = SentimentThresholds::COMPOUND;
    assert_eq!(compound.classify(0.05), SentimentLabel::Neutral);
    assert_eq!(compound.classify(-0.05), SentimentLabel::Neutral);
    assert_eq!(compound.classify(0.051), SentimentLabel::Positive);
    assert_eq!(compound.classify(-0.051), SentimentLabel::Negative);
    assert_eq!(compound.classify(1.0), SentimentLabel::Positive);
    assert_eq!(compound.classify(-1.0), SentimentLabel::Negative);

    let polarity = SentimentThresholds::POLARITY;
    assert_eq!(polarity.classify(0.1), SentimentLabel::Neutral);
    assert_eq!(polarity.classify(0.06), SentimentLabel::Neutral);
    assert_eq!(polarity.classify(-0.1), SentimentLabel::Neutral);
    assert_eq!(polarity.classify(0.101), SentimentLabel::Positive);
    assert_eq!(polarity.classify(-0.101), SentimentLabel::Negative);
}

#[test]
fn compound_threshold_examples() {
    let t = SentimentThresholds::COMPOUND;
    assert_eq!(t.classify(0.06), SentimentLabel::Positive);
    assert_eq!(t.classify(0.0), SentimentLabel::Neutral);
    assert_eq!(t.classify(-0.10), SentimentLabel::Negative);
}
