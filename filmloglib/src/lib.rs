//! Core library for filmlog, a plain-text film roll logging tool.
//!
//! The log file is a terse hand-edited format: declaration blocks for
//! companies, film stocks, cameras and labs, followed by one entry line per
//! roll tracking its lifecycle (loaded, at the lab, developed, scanned).
//! This crate parses that format into a cross-referenced [`Database`] and
//! renders it as aligned plain-text tables, markdown, HTML or tag lines.
//!
//! The main entry points are:
//! - [`parse`] / [`parse_str`]: build a [`Database`] from a log
//! - [`report::render_log`], [`report::render_stock`],
//!   [`report::render_tags`]: the report views
//! - [`table::Table`]: the generic column layout engine underneath
//!
//! Entries have no identifier in the file; display short-IDs are derived
//! per rendering pass from a SHA-512 fingerprint of the entry's stable
//! fields, so codes survive edits elsewhere in the file.

pub mod db;
pub mod error;
pub mod id;
pub mod parse;
pub mod report;
pub mod table;

pub use db::{Camera, Company, Database, Entry, Iso, Lab, Stock};
pub use error::{Error, ErrorKind, RecordKind};
pub use id::Id;
pub use parse::{parse, parse_str};
pub use report::Config;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
