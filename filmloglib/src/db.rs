//! The in-memory film roll dataset.
//!
//! A [`Database`] owns every company, stock, camera and lab (keyed by
//! [`Id`]) plus the ordered list of [`Entry`] records. It is built once by
//! [`crate::parse::parse`] and read-only afterwards; entries reference their
//! stock/camera/lab by identifier, resolved through the catalog maps at read
//! time.
//!
//! Display short-IDs are not stored. They are derived per rendering pass
//! from a SHA-512 fingerprint of (load date, camera id, stock id) plus a
//! disambiguation counter, truncated to a fixed five-character prefix. The
//! same entry therefore gets the same code on every pass over the same
//! dataset.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha512};

use crate::id::Id;

/// Date format used throughout the log file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the derived display short-ID prefix.
pub const SHORT_ID_LEN: usize = 5;

/// A film manufacturer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Company {
    pub id: Id,
    pub name: String,
}

impl Company {
    /// Name without the id tag, for embedding in other records' output.
    pub fn short(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// An ISO sensitivity range; `low == high` means a single value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Iso {
    pub low: u32,
    pub high: u32,
}

impl fmt::Display for Iso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// A film stock.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stock {
    pub id: Id,
    /// Owning company, by catalog reference.
    pub company: Id,
    pub name: String,
    pub iso: Iso,
    /// Total rolls ever bought of this stock.
    pub rolls: u32,
}

/// A camera body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Camera {
    pub id: Id,
    pub brand: String,
    pub model: String,
}

impl Camera {
    /// `Brand Model` without the id tag.
    pub fn short(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.brand, self.model)
    }
}

/// A development lab.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Lab {
    pub id: Id,
    pub name: String,
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.is_none() {
            write!(f, "[N/A]")
        } else {
            write!(f, "{} {}", self.id, self.name)
        }
    }
}

/// One film roll's lifecycle record.
///
/// Entries are append-only and kept in source order; that order is the
/// fallback event order when dates tie, and it drives loaded-camera
/// detection.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub load_date: NaiveDate,
    pub stock: Id,
    pub camera: Id,
    /// [`Id::NONE`] when the roll has not been handed to a lab.
    #[serde(skip_serializing_if = "Id::is_none")]
    pub lab: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_in: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_out: Option<NaiveDate>,
    /// Scan page number; 0 means unset. Non-zero values are unique across
    /// the dataset.
    pub scan: u32,
    /// 1-based source line of the entry declaration, for diagnostics.
    pub line: u32,
    /// Free-text note from the line following the entry, if any.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl Entry {
    /// Deterministic fingerprint for short-ID derivation.
    ///
    /// Hashes the load date, camera id and stock id; the disambiguation
    /// `index` is mixed in only when non-zero, so index 0 reproduces the
    /// undisambiguated code. Same inputs always yield the same hex digest,
    /// across runs and process restarts.
    pub fn fingerprint(&self, index: u32) -> String {
        let mut h = Sha512::new();
        h.update(format!("{}\n", self.load_date.format(DATE_FORMAT)));
        h.update(format!("{}\n", self.camera));
        h.update(format!("{}\n", self.stock));
        if index != 0 {
            h.update(format!("{}\n", index));
        }
        h.finalize().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// The aggregate dataset: catalogs plus the ordered entry list.
///
/// Maps are ordered by identifier so iteration and JSON output are
/// deterministic.
#[derive(Debug, Default, Serialize)]
pub struct Database {
    pub companies: BTreeMap<Id, Company>,
    pub stocks: BTreeMap<Id, Stock>,
    pub cameras: BTreeMap<Id, Camera>,
    pub labs: BTreeMap<Id, Lab>,
    pub entries: Vec<Entry>,
}

impl Database {
    /// The stock an entry references. The parser guarantees the reference
    /// resolves, so a missing id is a programming error.
    pub fn stock_of(&self, e: &Entry) -> &Stock {
        &self.stocks[&e.stock]
    }

    /// The camera an entry references.
    pub fn camera_of(&self, e: &Entry) -> &Camera {
        &self.cameras[&e.camera]
    }

    /// The lab an entry references, or `None` for the no-lab sentinel.
    pub fn lab_of(&self, e: &Entry) -> Option<&Lab> {
        if e.lab.is_none() {
            None
        } else {
            Some(&self.labs[&e.lab])
        }
    }

    /// The company owning an entry's stock.
    pub fn company_of(&self, e: &Entry) -> &Company {
        &self.companies[&self.stock_of(e).company]
    }

    /// For each camera, the index of its most recent entry that has no lab
    /// assigned. That entry is the roll currently loaded in the camera.
    ///
    /// Always computed over the full, unfiltered entry order, even when a
    /// report filters to a single short-ID.
    fn loaded(&self) -> HashMap<Id, usize> {
        let mut loaded = HashMap::new();
        for (i, e) in self.entries.iter().enumerate() {
            if e.lab.is_none() {
                loaded.insert(e.camera, i);
            }
        }
        loaded
    }

    /// Visit entries in source order, assigning each its per-pass unique
    /// display short-ID and loaded-camera flag.
    ///
    /// The short-ID is the first [`SHORT_ID_LEN`] hex characters of the
    /// entry fingerprint; on collision with an already emitted code the
    /// disambiguation counter is bumped until the code is free. Pass-scoped
    /// state only, so repeated passes over the same dataset agree.
    ///
    /// When `id_filter` is set, only the matching entry is passed to `f`
    /// (IDs are still derived for every entry so filtering does not shift
    /// collision resolution).
    pub fn each_row<F>(&self, id_filter: Option<&str>, mut f: F)
    where
        F: FnMut(&Entry, &str, bool),
    {
        let loaded = self.loaded();
        let mut emitted = HashSet::new();

        for (i, e) in self.entries.iter().enumerate() {
            let mut index = 0u32;
            let id = loop {
                let mut id = e.fingerprint(index);
                id.truncate(SHORT_ID_LEN);
                if !emitted.contains(&id) {
                    break id;
                }
                index += 1;
            };
            emitted.insert(id.clone());

            if let Some(filter) = id_filter {
                if id != filter {
                    continue;
                }
            }

            f(e, &id, loaded.get(&e.camera) == Some(&i));
        }
    }
}
