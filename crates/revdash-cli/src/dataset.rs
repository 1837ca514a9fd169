//! CSV dataset helpers: cut a sample file, peek at the columns.

use std::path::Path;

use anyhow::Context;

/// # Errors
///
/// Returns an error if `input` cannot be read or `output` cannot be written.
pub(crate) fn run_sample(input: &Path, output: &Path, rows: usize) -> anyhow::Result<()> {
    let written = revdash_sentiment::write_csv_sample(input, output, rows)
        .with_context(|| format!("sampling {}", input.display()))?;
    println!(
        "wrote {written} reviews from {} to {}",
        input.display(),
        output.display()
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if `input` cannot be read as CSV.
pub(crate) fn run_inspect(input: &Path, rows: usize) -> anyhow::Result<()> {
    let preview = revdash_sentiment::preview_csv(input, rows)
        .with_context(|| format!("reading {}", input.display()))?;

    println!("columns: {}", preview.headers.join(", "));
    for (i, row) in preview.rows.iter().enumerate() {
        println!("--- row {} ---", i + 1);
        for (name, value) in preview.headers.iter().zip(row) {
            println!("{name:<15}{}", value.replace('\n', " "));
        }
    }
    Ok(())
}
