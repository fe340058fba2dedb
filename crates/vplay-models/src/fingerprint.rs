//! Cache fingerprints for source files.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::SourceFile;

/// Identity key for a source file, used for cache lookups.
///
/// Derived from name, size and last-modified time; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a source file.
    ///
    /// Pure and deterministic: two files agree on their fingerprint exactly
    /// when they agree on name, byte size and modification time.
    pub fn of(file: &SourceFile) -> Self {
        Self(format!(
            "{}:{}:{}",
            file.name,
            file.size_bytes(),
            file.modified.timestamp_millis()
        ))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
