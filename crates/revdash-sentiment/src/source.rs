//! Raw review sources.

use std::path::{Path, PathBuf};

use crate::error::SentimentError;
use crate::types::RawReview;

/// Produces raw review records in a stable source order.
pub trait ReviewSource: Send + Sync {
    /// Read up to `limit` records from the start of the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened or a record is malformed.
    fn read(&self, limit: usize) -> Result<Vec<RawReview>, SentimentError>;
}

/// Reads reviews from a CSV file with an `id,listing_id,date,reviewer_name,comments` header.
#[derive(Debug, Clone)]
pub struct CsvReviewSource {
    path: PathBuf,
}

impl CsvReviewSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReviewSource for CsvReviewSource {
    fn read(&self, limit: usize) -> Result<Vec<RawReview>, SentimentError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::with_capacity(limit.min(16_384));
        for row in reader.deserialize::<RawReview>().take(limit) {
            records.push(row?);
        }
        tracing::debug!(
            path = %self.path.display(),
            count = records.len(),
            "read raw reviews"
        );
        Ok(records)
    }
}

/// An in-memory source, mostly useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<RawReview>,
}

impl MemorySource {
    #[must_use]
    pub fn new(records: Vec<RawReview>) -> Self {
        Self { records }
    }
}

impl ReviewSource for MemorySource {
    fn read(&self, limit: usize) -> Result<Vec<RawReview>, SentimentError> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

/// Column names and the first rows of a CSV file, as strings.
#[derive(Debug, Clone)]
pub struct CsvPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the header and up to `rows` records of a CSV file without interpreting them.
///
/// # Errors
///
/// Returns [`SentimentError::Csv`] if the file cannot be read or parsed.
pub fn preview_csv(path: &Path, rows: usize) -> Result<CsvPreview, SentimentError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut out = Vec::new();
    for record in reader.records().take(rows) {
        out.push(record?.iter().map(str::to_string).collect());
    }
    Ok(CsvPreview { headers, rows: out })
}

/// Copy the header and the first `rows` records of `input` into `output`.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns [`SentimentError::Csv`] on read or write failure.
pub fn write_csv_sample(input: &Path, output: &Path, rows: usize) -> Result<usize, SentimentError> {
    let mut reader = csv::Reader::from_path(input)?;
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(reader.headers()?)?;

    let mut written = 0;
    for record in reader.records().take(rows) {
        writer.write_record(&record?)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CSV: &str = "id,listing_id,date,reviewer_name,comments\n\
        1,10,2019-01-05,Ana,\"Great place, very clean\"\n\
        2,10,2019-02-11,Ben,\n\
        3,11,2019-02-20,Cleo,\"Line one\nline two\"\n";

    fn write_csv(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("reviews.csv");
        let mut file = std::fs::File::create(&path).expect("create csv");
        file.write_all(CSV.as_bytes()).expect("write csv");
        path
    }

    #[test]
    fn csv_source_reads_quoted_and_empty_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = CsvReviewSource::new(write_csv(&dir));
        let records = source.read(10).expect("read");

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].comments.as_deref(),
            Some("Great place, very clean")
        );
        assert_eq!(records[1].comments, None);
        assert_eq!(records[2].comments.as_deref(), Some("Line one\nline two"));
    }

    #[test]
    fn csv_source_respects_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = CsvReviewSource::new(write_csv(&dir));
        let records = source.read(2).expect("read");
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn csv_source_missing_file_is_an_error() {
        let source = CsvReviewSource::new("/nonexistent/reviews.csv");
        assert!(matches!(source.read(1), Err(SentimentError::Csv(_))));
    }

    #[test]
    fn sample_copies_header_and_first_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_csv(&dir);
        let output = dir.path().join("sample.csv");

        let written = write_csv_sample(&input, &output, 2).expect("sample");
        assert_eq!(written, 2);

        let preview = preview_csv(&output, 10).expect("preview");
        assert_eq!(
            preview.headers,
            vec!["id", "listing_id", "date", "reviewer_name", "comments"]
        );
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1][3], "Ben");
    }
}
