use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["revdash-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(cli.count.is_none());
}

#[test]
fn parses_stats_with_global_count() {
    let cli = Cli::try_parse_from(["revdash-cli", "stats", "--count", "2500"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Stats)));
    assert_eq!(cli.count, Some(2500));
}

#[test]
fn parses_analyze_text() {
    let cli = Cli::try_parse_from(["revdash-cli", "analyze", "lovely quiet flat"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze { ref text }) if text == "lovely quiet flat"
    ));
}

#[test]
fn search_defaults_to_keyword_mode() {
    let cli =
        Cli::try_parse_from(["revdash-cli", "search", "noise"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Search {
            top_k: 10,
            semantic: false,
            ..
        })
    ));
}

#[test]
fn parses_semantic_search_with_top_k() {
    let cli = Cli::try_parse_from([
        "revdash-cli",
        "search",
        "close to the beach",
        "--top-k",
        "3",
        "--semantic",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Search {
            top_k: 3,
            semantic: true,
            ..
        })
    ));
}

#[test]
fn parses_build_embeddings() {
    let cli = Cli::try_parse_from(["revdash-cli", "build-embeddings"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::BuildEmbeddings)));
}

#[test]
fn sample_defaults_to_3000_rows() {
    let cli = Cli::try_parse_from([
        "revdash-cli",
        "sample",
        "--input",
        "reviews.csv",
        "--output",
        "reviews_sample.csv",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sample { rows: 3000, .. })
    ));
}

#[test]
fn sample_requires_input_and_output() {
    assert!(Cli::try_parse_from(["revdash-cli", "sample", "--input", "a.csv"]).is_err());
}

#[test]
fn inspect_accepts_row_count() {
    let cli = Cli::try_parse_from(["revdash-cli", "inspect", "--input", "x.csv", "--rows", "2"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Inspect { rows: 2, .. })));
}

#[test]
fn sample_and_inspect_round_trip_through_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("reviews.csv");
    let output = dir.path().join("sample.csv");
    std::fs::write(
        &input,
        "id,listing_id,date,reviewer_name,comments\n\
         1,5,2020-01-01,Ana,Great\n\
         2,5,2020-01-02,Ben,\"Nice,\nbright\"\n\
         3,5,2020-01-03,Cy,Fine\n",
    )
    .expect("write input");

    dataset::run_sample(&input, &output, 2).expect("sample");
    let preview = revdash_sentiment::preview_csv(&output, 10).expect("preview");
    assert_eq!(preview.rows.len(), 2);
    assert_eq!(preview.rows[1][4], "Nice,\nbright");

    dataset::run_inspect(&output, 1).expect("inspect");
}
