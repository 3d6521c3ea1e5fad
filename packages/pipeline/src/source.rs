//! Nanopub file sources.
//!
//! [`read_nanopubs`] opens a `.jsonl` (one document per line) or `.json`
//! (array of documents) file and yields nanopub documents lazily. The
//! sequence is finite and restartable by reopening the file. Lines or array
//! entries without a top-level `"nanopub"` key are skipped with a log line,
//! matching how upstream nanopub archives mix in other record types.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use belgraph::nanopub::NanopubDoc;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Errors from a nanopub source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not open nanopub file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized nanopub file format {0:?}; expected .json or .jsonl")]
    UnknownFormat(String),

    #[error("malformed document at {location}: {message}")]
    Malformed { location: String, message: String },
}

/// Open a nanopub file and return a lazy document iterator.
pub fn read_nanopubs(path: impl AsRef<Path>) -> Result<NanopubReader, SourceError> {
    let path = path.as_ref();
    let name = path.to_string_lossy().to_string();

    // `.jsonl` wins over `.json` so `x.jsonl` is not misread as JSON.
    if name.ends_with(".jsonl") {
        let file = File::open(path)?;
        Ok(NanopubReader {
            inner: ReaderKind::JsonLines {
                lines: BufReader::new(file).lines(),
                line_no: 0,
                name,
            },
        })
    } else if name.ends_with(".json") {
        let file = File::open(path)?;
        let documents: Vec<Value> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SourceError::Malformed {
                location: name.clone(),
                message: e.to_string(),
            })?;
        Ok(NanopubReader {
            inner: ReaderKind::Array {
                documents: documents.into_iter(),
                index: 0,
                name,
            },
        })
    } else {
        Err(SourceError::UnknownFormat(name))
    }
}

/// Lazy iterator over the nanopub documents of one file.
pub struct NanopubReader {
    inner: ReaderKind,
}

enum ReaderKind {
    JsonLines {
        lines: Lines<BufReader<File>>,
        line_no: usize,
        name: String,
    },
    Array {
        documents: std::vec::IntoIter<Value>,
        index: usize,
        name: String,
    },
}

/// Decode one raw value: skip non-nanopub records, surface malformed ones.
fn decode(value: Value, location: String) -> Option<Result<NanopubDoc, SourceError>> {
    if value.get("nanopub").is_none() {
        warn!("skipping non-nanopub record at {location}");
        return None;
    }
    Some(
        serde_json::from_value(value).map_err(|e| SourceError::Malformed {
            location,
            message: e.to_string(),
        }),
    )
}

impl Iterator for NanopubReader {
    type Item = Result<NanopubDoc, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.inner {
                ReaderKind::JsonLines { lines, line_no, name } => {
                    let line = match lines.next()? {
                        Ok(line) => line,
                        Err(e) => return Some(Err(SourceError::Io(e))),
                    };
                    *line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let location = format!("{name}:{line_no}");
                    let value: Value = match serde_json::from_str(&line) {
                        Ok(value) => value,
                        Err(e) => {
                            return Some(Err(SourceError::Malformed {
                                location,
                                message: e.to_string(),
                            }))
                        }
                    };
                    match decode(value, location) {
                        Some(result) => return Some(result),
                        None => continue,
                    }
                }
                ReaderKind::Array {
                    documents,
                    index,
                    name,
                } => {
                    let value = documents.next()?;
                    *index += 1;
                    let location = format!("{name}[{}]", *index - 1);
                    match decode(value, location) {
                        Some(result) => return Some(result),
                        None => continue,
                    }
                }
            }
        }
    }
}

// --- tests -------------------------------------------------------------------
