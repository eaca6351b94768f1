//! Dataset loading with a bounded row count.
//!
//! A [`DatasetSource`] yields at most `row_cap` data rows of a CSV table as
//! a Polars `DataFrame`. The payload is read through a buffered reader and
//! only the header plus the first `row_cap` records are kept in memory, so a
//! huge remote file costs no more than its prefix.
//!
//! # Example
//!
//! ```rust,ignore
//! use automl_processing::loader::{DatasetSource, HttpSource};
//!
//! let source = HttpSource::new("https://example.com/data.csv");
//! let df = source.load(7_500)?;
//! ```

use crate::error::{ProcessingError, Result};
use polars::io::csv::read::NullValues;
use polars::prelude::*;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::PathBuf;
use tracing::debug;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for dataset downloads in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 20;

/// Read buffer size used while streaming the payload.
const CHUNK_SIZE: usize = 8192;

/// Field values treated as missing, matching common spreadsheet exports.
pub const NULL_MARKERS: [&str; 11] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A",
];

/// Something that can produce a bounded dataset.
pub trait DatasetSource: Send + Sync {
    /// Human-readable description used in logs.
    fn describe(&self) -> String;

    /// Load at most `row_cap` data rows.
    fn load(&self, row_cap: usize) -> Result<DataFrame>;
}

/// Dataset fetched over HTTP(S).
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout_secs: u64,
}

#[cfg(feature = "remote")]
impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "remote")]
impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn load(&self, row_cap: usize) -> Result<DataFrame> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| ProcessingError::Download(e.to_string()))?;

        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| ProcessingError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::Download(format!(
                "{} responded with HTTP {}",
                self.url, status
            )));
        }

        // A body that breaks off mid-stream is a transport failure, not bad CSV
        read_capped_csv(response, row_cap).map_err(|e| match e {
            ProcessingError::Io(io) => ProcessingError::Download(io.to_string()),
            other => other,
        })
    }
}

/// Dataset read from a local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self, row_cap: usize) -> Result<DataFrame> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            ProcessingError::Download(format!("{}: {}", self.path.display(), e))
        })?;
        read_capped_csv(file, row_cap)
    }
}

/// Dataset held in memory, mostly useful for tests and embedding callers.
#[derive(Debug, Clone)]
pub struct BytesSource {
    label: String,
    bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }
}

impl DatasetSource for BytesSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load(&self, row_cap: usize) -> Result<DataFrame> {
        read_capped_csv(self.bytes.as_slice(), row_cap)
    }
}

/// Read a header plus at most `row_cap` CSV records from `reader`.
///
/// Record boundaries are tracked with quote parity, so a newline inside a
/// quoted field does not end a record. Blank lines between records are
/// skipped.
pub fn read_capped_csv<R: Read>(reader: R, row_cap: usize) -> Result<DataFrame> {
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, reader);
    let mut buffer: Vec<u8> = Vec::new();
    let mut line: Vec<u8> = Vec::new();
    let mut records = 0usize;
    let mut in_quotes = false;

    while records <= row_cap {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        let at_record_start = !in_quotes;
        if at_record_start && line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }

        let quotes = line.iter().filter(|&&b| b == b'"').count();
        if quotes % 2 == 1 {
            in_quotes = !in_quotes;
        }

        buffer.extend_from_slice(&line);
        if !in_quotes {
            records += 1;
        }
    }

    if buffer.is_empty() {
        return Err(ProcessingError::Parse("dataset is empty".to_string()));
    }

    debug!(
        bytes = buffer.len(),
        records = records.saturating_sub(1),
        "Buffered capped CSV prefix"
    );

    parse_csv_bytes(buffer, row_cap)
}

/// Parse an in-memory CSV payload with a header row.
pub fn parse_csv_bytes(bytes: Vec<u8>, row_cap: usize) -> Result<DataFrame> {
    let null_values = NullValues::AllColumns(
        NULL_MARKERS
            .iter()
            .map(|marker| PlSmallStr::from(*marker))
            .collect(),
    );

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_n_rows(Some(row_cap))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(null_values)),
        )
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| ProcessingError::Parse(e.to_string()))?;

    if df.width() < 2 {
        return Err(ProcessingError::Parse(format!(
            "expected at least two columns (features and a target), found {}",
            df.width()
        )));
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "a,b,label\n1,x,yes\n2,y,no\n3,z,yes\n4,w,no\n";

    #[test]
    fn test_read_capped_csv_reads_everything_under_cap() {
        let df = read_capped_csv(SAMPLE.as_bytes(), 100).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_read_capped_csv_stops_at_cap() {
        let df = read_capped_csv(SAMPLE.as_bytes(), 2).unwrap();
        assert_eq!(df.height(), 2);
        let a = df.column("a").unwrap().as_materialized_series().clone();
        assert_eq!(a.get(1).unwrap().try_extract::<i64>().unwrap(), 2);
    }

    #[test]
    fn test_quoted_newline_does_not_count_as_record() {
        let csv = "note,label\n\"line one\nline two\",yes\nplain,no\nthird,yes\n";
        let df = read_capped_csv(csv.as_bytes(), 2).unwrap();
        assert_eq!(df.height(), 2);
        let note = df.column("note").unwrap().as_materialized_series().clone();
        assert!(note.get(0).unwrap().to_string().contains("line two"));
    }

    #[test]
    fn test_null_markers_become_missing() {
        let csv = "age,label\n10,a\nNA,b\n,a\nNaN,b\n30,a\n";
        let df = read_capped_csv(csv.as_bytes(), 100).unwrap();
        let age = df.column("age").unwrap();
        assert_eq!(age.null_count(), 3);
        assert!(crate::utils::is_numeric_dtype(age.dtype()));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let csv = "a,label\n1,x\n\n2,y\n\n";
        let df = read_capped_csv(csv.as_bytes(), 100).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_empty_payload_is_parse_error() {
        let err = read_capped_csv("".as_bytes(), 10).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_single_column_is_parse_error() {
        let err = read_capped_csv("only\n1\n2\n".as_bytes(), 10).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_missing_file_is_download_error() {
        let source = FileSource::new("/definitely/not/here.csv");
        let err = source.load(10).unwrap_err();
        assert!(err.is_download());
    }

    #[test]
    fn test_bytes_source() {
        let source = BytesSource::new("inline", SAMPLE);
        assert_eq!(source.describe(), "inline");
        assert_eq!(source.load(3).unwrap().height(), 3);
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_unreachable_url_is_download_error() {
        let source = HttpSource::new("http://127.0.0.1:9/data.csv").with_timeout_secs(2);
        let err = source.load(10).unwrap_err();
        assert!(err.is_download(), "unexpected error: {err}");
    }
}
