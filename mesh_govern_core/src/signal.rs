use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed operational signal.
///
/// Signals are produced externally and are immutable once classified; the
/// category of a record is a pure function of `id` and `commentary`
/// substring matching, never of `extra`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: String,
    pub domain: String,
    /// Epoch milliseconds at which the signal was observed.
    pub timestamp: u64,
    /// Free-form operator or machine commentary attached to the signal.
    #[serde(default)]
    pub commentary: Vec<String>,
    /// Unknown extra fields, carried through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SignalRecord {
    pub fn new(id: impl Into<String>, domain: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            timestamp,
            commentary: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Append a commentary line.
    pub fn with_commentary(mut self, line: impl Into<String>) -> Self {
        self.commentary.push(line.into());
        self
    }

    /// True when `keyword` occurs in the id or in any commentary line.
    pub fn mentions(&self, keyword: &str) -> bool {
        self.id.contains(keyword) || self.commentary.iter().any(|c| c.contains(keyword))
    }
}

/// One row of the cross-domain agreement check: which signal a domain
/// reported in the window under inspection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainLog {
    pub domain: String,
    pub signal: String,
}

impl DomainLog {
    pub fn new(domain: impl Into<String>, signal: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            signal: signal.into(),
        }
    }
}
