//! Three-byte record identifiers.
//!
//! Every company, film stock, camera and lab in the log is named by an
//! [`Id`]: exactly three raw bytes, compared byte-wise. The all-zero value
//! is reserved as the "no lab assigned" sentinel.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::ErrorKind;

/// A fixed-size three-byte identifier.
///
/// Typically ASCII (`kdk`, `f5p`) but any three bytes are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; 3]);

impl Id {
    /// The reserved all-zero identifier, used as the "no lab" sentinel.
    pub const NONE: Id = Id([0; 3]);

    /// Build an identifier from a string of exactly three bytes.
    pub fn new(s: &str) -> Result<Self, ErrorKind> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(ErrorKind::MalformedId(s.to_string()));
        }
        let mut id = [0u8; 3];
        id.copy_from_slice(bytes);
        Ok(Id(id))
    }

    /// Whether this is the reserved "no lab" sentinel.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// The raw identifier bytes.
    pub fn bytes(&self) -> &[u8; 3] {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_exact_length() {
        assert!(Id::new("kdk").is_ok());
        assert!(Id::new("").is_err());
        assert!(Id::new("ab").is_err());
        assert!(Id::new("abcd").is_err());
    }

    #[test]
    fn test_id_length_is_bytes_not_chars() {
        // Multi-byte UTF-8: three chars but more than three bytes
        assert!(Id::new("äbc").is_err());
    }

    #[test]
    fn test_id_equality() {
        assert_eq!(Id::new("abc").unwrap(), Id::new("abc").unwrap());
        assert_ne!(Id::new("abc").unwrap(), Id::new("abd").unwrap());
    }

    #[test]
    fn test_id_none_sentinel() {
        assert!(Id::NONE.is_none());
        assert!(!Id::new("abc").unwrap().is_none());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(Id::new("f5p").unwrap().to_string(), "[f5p]");
    }
}
