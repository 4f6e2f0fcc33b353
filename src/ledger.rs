//! Append-only ledgers backing idempotent runs.
//!
//! Two ledgers exist: the processed ledger (one message id per line) that
//! makes reruns no-ops, and the error ledger (CSV rows of id and reason)
//! that records every isolated failure. Both are append-only, create their
//! parent directories on first write, and read back an empty sequence when
//! the file does not yet exist.
//!
//! Each append opens the file, writes one record, flushes, and releases it.
//! The extractor is single-threaded and the sole writer, so no locking is
//! needed. Any I/O failure here is [`Error::Ledger`], which is fatal to the
//! run.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The processed-message ledger: one id per line.
///
/// The file is append-only; [`load`](Self::load) returns set semantics so an
/// accidental duplicate append deduplicates on read.
#[derive(Debug, Clone)]
pub struct ProcessedLedger {
    path: PathBuf,
}

impl ProcessedLedger {
    /// Creates a ledger handle for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one message id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ledger`] if the write fails.
    pub fn append(&self, message_id: &str) -> Result<()> {
        append_line(&self.path, message_id)
    }

    /// Loads all recorded ids as a set. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ledger`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<HashSet<String>> {
        let lines = read_lines(&self.path)?;
        debug!(path = %self.path.display(), count = lines.len(), "Loaded processed ledger");
        Ok(lines.into_iter().collect())
    }
}

/// One error-ledger row: the affected message and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// The affected message id (or a placeholder when no id applies).
    pub message_id: String,
    /// Human-readable failure reason.
    pub reason: String,
}

impl ErrorRecord {
    /// Creates a record from a message id and reason.
    pub fn new(message_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            reason: reason.into(),
        }
    }
}

/// The error ledger: append-only CSV rows of `(message id, reason)`.
#[derive(Debug, Clone)]
pub struct ErrorLedger {
    path: PathBuf,
}

impl ErrorLedger {
    /// Creates a ledger handle for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one error row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ledger`] if the write fails.
    pub fn append(&self, record: &ErrorRecord) -> Result<()> {
        let row = format!(
            "{},{}",
            csv_escape(&record.message_id),
            csv_escape(&record.reason)
        );
        append_line(&self.path, &row)
    }

    /// Reads all recorded rows in file order. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ledger`] if the file exists but cannot be read.
    pub fn read_all(&self) -> Result<Vec<ErrorRecord>> {
        let lines = read_lines(&self.path)?;
        Ok(lines.iter().map(|line| parse_row(line)).collect())
    }
}

/// Appends one line to `path`, creating parent directories as needed.
/// Open, write, flush, release per call.
fn append_line(path: &Path, line: &str) -> Result<()> {
    let ledger_err = |source| Error::Ledger {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ledger_err)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(ledger_err)?;

    writeln!(file, "{line}").map_err(ledger_err)?;
    file.flush().map_err(ledger_err)
}

/// Reads all lines from `path`; a missing file yields an empty vector.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|source| Error::Ledger {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content.lines().map(str::to_string).collect())
}

/// Escapes a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Parses one CSV row back into an [`ErrorRecord`].
///
/// Understands the quoting produced by [`csv_escape`].
fn parse_row(line: &str) -> ErrorRecord {
    let (id, rest) = split_field(line);
    let (reason, _) = split_field(rest);
    ErrorRecord {
        message_id: id,
        reason,
    }
}

/// Splits off the first CSV field, returning it unescaped plus the remainder.
fn split_field(input: &str) -> (String, &str) {
    if let Some(rest) = input.strip_prefix('"') {
        // Quoted field: scan for the closing quote, honoring "" escapes
        let mut value = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '"' {
                match chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((j, ',')) => return (value, &rest[j + 1..]),
                    _ => return (value, &rest[i + 1..]),
                }
            } else {
                value.push(c);
            }
        }
        (value, "")
    } else {
        match input.split_once(',') {
            Some((field, rest)) => (field.to_string(), rest),
            None => (input.to_string(), ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_processed_ledger_roundtrip() {
        let dir = tempdir().unwrap();
        let ledger = ProcessedLedger::new(dir.path().join("processed.txt"));

        ledger.append("msgA").unwrap();
        ledger.append("msgB").unwrap();

        let set = ledger.load().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("msgA"));
        assert!(set.contains("msgB"));
    }

    #[test]
    fn test_missing_ledger_reads_empty() {
        let dir = tempdir().unwrap();
        let ledger = ProcessedLedger::new(dir.path().join("nope.txt"));
        assert!(ledger.load().unwrap().is_empty());

        let errors = ErrorLedger::new(dir.path().join("nope.csv"));
        assert!(errors.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_appends_deduplicate_on_load() {
        let dir = tempdir().unwrap();
        let ledger = ProcessedLedger::new(dir.path().join("processed.txt"));

        ledger.append("msgA").unwrap();
        ledger.append("msgA").unwrap();

        assert_eq!(ledger.load().unwrap().len(), 1);
    }

    #[test]
    fn test_append_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("processed.txt");
        let ledger = ProcessedLedger::new(&nested);

        ledger.append("msgA").unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_error_ledger_roundtrip() {
        let dir = tempdir().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("errors.csv"));

        ledger
            .append(&ErrorRecord::new("msgB", "Module Ref No not found for subject: hello"))
            .unwrap();

        let rows = ledger.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message_id, "msgB");
        assert_eq!(rows[0].reason, "Module Ref No not found for subject: hello");
    }

    #[test]
    fn test_error_ledger_quotes_commas_and_quotes() {
        let dir = tempdir().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("errors.csv"));

        let record = ErrorRecord::new("msgC", "subject with, comma and \"quotes\"");
        ledger.append(&record).unwrap();

        let rows = ledger.read_all().unwrap();
        assert_eq!(rows[0], record);
    }

    #[test]
    fn test_error_ledger_preserves_file_order() {
        let dir = tempdir().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("errors.csv"));

        ledger.append(&ErrorRecord::new("1", "first")).unwrap();
        ledger.append(&ErrorRecord::new("2", "second")).unwrap();

        let rows = ledger.read_all().unwrap();
        assert_eq!(rows[0].message_id, "1");
        assert_eq!(rows[1].message_id, "2");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_ledger_write_failure_is_ledger_error() {
        let dir = tempdir().unwrap();
        // A directory at the ledger path makes the open fail
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();

        let err = ProcessedLedger::new(&path).append("msgA").unwrap_err();
        assert!(err.is_fatal());
    }
}
