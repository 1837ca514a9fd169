//! Command handlers that load the review corpus and query it.

use revdash_sentiment::{retrieval::excerpt, ReviewService};

/// Comment characters shown per search hit.
const PREVIEW_CHARS: usize = 80;

async fn load(service: &ReviewService, count: usize) -> anyhow::Result<()> {
    let report = service.reload(count, None).await?;
    tracing::info!(
        loaded_count = report.loaded_count,
        duplicates_removed = report.duplicates_removed,
        "reviews loaded"
    );
    Ok(())
}

fn one_line(text: &str) -> String {
    excerpt(text, PREVIEW_CHARS).replace(['\n', '\r'], " ")
}

/// # Errors
///
/// Returns an error if the corpus cannot be loaded.
pub(crate) async fn run_stats(service: &ReviewService, count: usize) -> anyhow::Result<()> {
    load(service, count).await?;
    let stats = service.statistics()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the corpus cannot be loaded.
pub(crate) async fn run_trends(service: &ReviewService, count: usize) -> anyhow::Result<()> {
    load(service, count).await?;
    let trends = service.trends()?;
    println!("{}", serde_json::to_string_pretty(&trends)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if `text` is blank.
pub(crate) fn run_analyze(service: &ReviewService, text: &str) -> anyhow::Result<()> {
    let scores = service.analyze_text(text)?;
    println!("{}", serde_json::to_string_pretty(&scores)?);
    Ok(())
}

/// Keyword or semantic search over the loaded corpus.
///
/// Semantic search loads the embedding cache first, building it if it is
/// missing or stale.
///
/// # Errors
///
/// Returns an error if the corpus cannot be loaded or the query is invalid.
pub(crate) async fn run_search(
    service: &ReviewService,
    count: usize,
    query: &str,
    top_k: usize,
    semantic: bool,
) -> anyhow::Result<()> {
    load(service, count).await?;

    if semantic {
        service.build_embeddings().await?;
        let results = service.semantic_search(query, top_k).await?;
        if results.items.is_empty() {
            println!("no semantic matches for '{query}'");
            return Ok(());
        }
        println!("{:<8}{:<12}{:<12}COMMENTS", "SCORE", "ID", "DATE");
        for hit in &results.items {
            println!(
                "{:<8.3}{:<12}{:<12}{}",
                hit.similarity_score,
                hit.record.id,
                hit.record.date,
                one_line(hit.record.text())
            );
        }
    } else {
        let results = service.keyword_search(query, top_k)?;
        if results.items.is_empty() {
            println!("no reviews mention '{query}'");
            return Ok(());
        }
        println!("{:<10}{:<12}{:<12}COMMENTS", "SENTIMENT", "ID", "DATE");
        for item in &results.items {
            println!(
                "{:<10}{:<12}{:<12}{}",
                item.sentiment.label.as_str(),
                item.review.id,
                item.review.date,
                one_line(item.review.text())
            );
        }
    }

    Ok(())
}

/// # Errors
///
/// Returns an error if the corpus cannot be loaded.
pub(crate) async fn run_build_embeddings(
    service: &ReviewService,
    count: usize,
) -> anyhow::Result<()> {
    load(service, count).await?;
    let report = service.build_embeddings().await?;
    println!(
        "embedding index {:?}: {} entries, {} skipped, persisted: {}",
        report.source, report.entries, report.skipped, report.persisted
    );
    Ok(())
}
