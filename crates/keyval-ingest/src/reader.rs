//! Streaming reader for tab-separated submission files.
//!
//! Rows are pulled one at a time into a reused record buffer, so memory use
//! does not grow with file size. Files ending in `.gz` are decompressed on
//! the fly.
//!
//! # Usage
//!
//! ```ignore
//! use keyval_ingest::{ReaderOptions, TsvReader};
//!
//! let mut reader = TsvReader::open(&path, ReaderOptions::default())?;
//! while let Some(row) = reader.next_row()? {
//!     println!("{}: {} fields", row.line_number, row.record.len());
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use flate2::read::MultiGzDecoder;

use crate::error::{IngestError, Result};

/// Buffer size used for the underlying file reader.
const READ_BUFFER_BYTES: usize = 256 * 1024;

/// Options for reading delimited rows.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Field delimiter. Defaults to tab.
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
        }
    }
}

impl ReaderOptions {
    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// A borrowed data row.
#[derive(Debug)]
pub struct Row<'a> {
    /// Physical line number; the header is line 1.
    pub line_number: u64,
    pub record: &'a StringRecord,
}

impl Row<'_> {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.record.get(index)
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }
}

/// Streaming TSV reader with a header row.
pub struct TsvReader {
    path: PathBuf,
    reader: csv::Reader<Box<dyn Read + Send>>,
    header: Vec<String>,
    record: StringRecord,
    rows_read: u64,
}

impl TsvReader {
    /// Open a file and read its header row.
    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| IngestError::FileOpen {
            path: path.clone(),
            source: e,
        })?;
        let buffered = BufReader::with_capacity(READ_BUFFER_BYTES, file);
        let gzip = is_gzip_path(&path);
        let source: Box<dyn Read + Send> = if gzip {
            Box::new(MultiGzDecoder::new(buffered))
        } else {
            Box::new(buffered)
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(source);

        let header = match reader.headers() {
            Ok(headers) => headers.iter().map(str::to_string).collect::<Vec<_>>(),
            Err(err) => return Err(classify(&path, err, 1)),
        };
        if header.is_empty() || header.iter().all(String::is_empty) {
            return Err(IngestError::MissingHeader { path });
        }

        tracing::debug!(path = %path.display(), gzip, columns = header.len(), "opened data file");
        Ok(Self {
            path,
            reader,
            header,
            record: StringRecord::new(),
            rows_read: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of data rows returned so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Advance to the next data row.
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>> {
        // Line of the previous record plus one is the best guess when the
        // reader fails before it can report a position.
        let fallback_line = self.rows_read + 2;
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.rows_read += 1;
                let line_number = self
                    .record
                    .position()
                    .map_or(fallback_line, csv::Position::line);
                Ok(Some(Row {
                    line_number,
                    record: &self.record,
                }))
            }
            Ok(false) => Ok(None),
            Err(err) => Err(classify(&self.path, err, fallback_line)),
        }
    }
}

fn classify(path: &Path, err: csv::Error, fallback_line: u64) -> IngestError {
    match err.kind() {
        csv::ErrorKind::Utf8 { pos, .. } => IngestError::InvalidUtf8 {
            path: path.to_path_buf(),
            line: pos.as_ref().map_or(fallback_line, csv::Position::line),
        },
        _ => IngestError::Read {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

/// True for `*.gz` file names.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
