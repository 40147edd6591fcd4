//! Error types for filmloglib.
//!
//! Parsing is non-recoverable: the first structural or referential problem
//! aborts the whole parse. Every error carries the 1-based source line it
//! originated on so the log file can be fixed by hand.

use std::fmt;

use thiserror::Error;

use crate::id::Id;

/// A parse error tied to a source line.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct Error {
    /// 1-based line number in the input.
    pub line: u32,
    /// What went wrong.
    pub kind: ErrorKind,
}

/// The failure cause, without line information.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Identifier is not exactly three bytes
    #[error("invalid id '{0}'")]
    MalformedId(String),

    /// Same kind + id declared twice
    #[error("duplicate {0} id {1}")]
    DuplicateId(RecordKind, Id),

    /// Reference to an id that was never declared
    #[error("no {0} with id {1}")]
    UnknownReference(RecordKind, Id),

    /// Date field is not `YYYY-MM-DD`
    #[error("invalid date '{0}'")]
    MalformedDate(String),

    /// ISO line is not a positive value or low-high range
    #[error("invalid ISO range '{0}'")]
    MalformedIso(String),

    /// Roll count or scan page is not a valid integer
    #[error("invalid number '{0}'")]
    MalformedNumber(String),

    /// Non-zero scan page used by an earlier entry
    #[error("duplicate scan page {0}")]
    DuplicateScanPage(u32),

    /// Entry line has fewer than three tokens
    #[error("entry needs a date, a stock id and a camera id")]
    TruncatedEntry,

    /// Entry names a real lab but no lab-in date
    #[error("entry with a lab id must carry a lab-in date")]
    MissingLabInDate,

    /// Declaration line is not `<keyword> <id>`
    #[error("invalid line: '{0}'")]
    MalformedLine(String),

    /// First token is neither a date nor a known keyword
    #[error("unknown keyword '{0}'")]
    UnknownKeyword(String),

    /// Underlying read failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ErrorKind {
    /// Attach a source line number.
    pub fn at(self, line: u32) -> Error {
        Error { line, kind: self }
    }
}

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Company,
    Stock,
    Camera,
    Lab,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Company => "company",
            RecordKind::Stock => "stock",
            RecordKind::Camera => "camera",
            RecordKind::Lab => "lab",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_line() {
        let err = ErrorKind::MalformedId("ab".to_string()).at(7);
        assert_eq!(err.to_string(), "line 7: invalid id 'ab'");
    }

    #[test]
    fn test_duplicate_display() {
        let id = Id::new("kdk").unwrap();
        let err = ErrorKind::DuplicateId(RecordKind::Stock, id).at(12);
        assert_eq!(err.to_string(), "line 12: duplicate stock id [kdk]");
    }
}
