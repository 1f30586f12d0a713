use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chain::L1_EXPLORER_URL;

/// L2 transaction hash as shown by the explorer. Treated as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(String);

impl TransactionHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionHash {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TransactionHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link to the L1 page that finalizes the batch a transaction was included in.
/// Many transactions share the same reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootReference(String);

impl RootReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL of the root-anchor page. Relative links are taken to point at the L1
    /// explorer.
    pub fn resolve(&self) -> Result<Url, url::ParseError> {
        Url::parse(L1_EXPLORER_URL)?.join(&self.0)
    }
}

impl From<&str> for RootReference {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RootReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RootReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch.
pub type UnixMillis = i64;

/// Slot of a [`LatencyRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatencyField {
    /// Time the transaction appeared on L2.
    Start,
    /// Time its batch was finalized on L1.
    RootEnd,
}

impl LatencyField {
    /// Order in which the fields are persisted.
    pub const ALL: [LatencyField; 2] = [LatencyField::Start, LatencyField::RootEnd];
}

impl fmt::Display for LatencyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatencyField::Start => f.write_str("start"),
            LatencyField::RootEnd => f.write_str("root_end"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyRecord {
    pub start: Option<UnixMillis>,
    pub root_end: Option<UnixMillis>,
}

impl LatencyRecord {
    pub fn new(start: UnixMillis, root_end: UnixMillis) -> Self {
        Self {
            start: Some(start),
            root_end: Some(root_end),
        }
    }

    pub fn get(&self, field: LatencyField) -> Option<UnixMillis> {
        match field {
            LatencyField::Start => self.start,
            LatencyField::RootEnd => self.root_end,
        }
    }

    pub fn set(&mut self, field: LatencyField, value: UnixMillis) {
        match field {
            LatencyField::Start => self.start = Some(value),
            LatencyField::RootEnd => self.root_end = Some(value),
        }
    }

    /// Finality latency, available once both slots are filled.
    pub fn latency_ms(&self) -> Option<i64> {
        Some(self.root_end? - self.start?)
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.root_end.is_some()
    }
}
