use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cfg::GovernCfg;
use crate::signal::SignalRecord;

/// Semantic bucket for a raw signal entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Drift,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Drift => "drift",
            Category::Other => "other",
        }
    }
}

/// Bucket raw entries by category, preserving input order within each bucket.
///
/// Pure and total: anything that is not drift lands in `Other`, and empty
/// input yields an empty map (no empty buckets are created).
pub fn classify_anomalies<S: AsRef<str>>(raw: &[S]) -> BTreeMap<Category, Vec<String>> {
    classify_anomalies_cfg(raw, &GovernCfg::default())
}

pub fn classify_anomalies_cfg<S: AsRef<str>>(
    raw: &[S],
    cfg: &GovernCfg,
) -> BTreeMap<Category, Vec<String>> {
    let mut buckets: BTreeMap<Category, Vec<String>> = BTreeMap::new();
    for entry in raw {
        let entry = entry.as_ref();
        let category = if entry.contains(cfg.drift_marker.as_str()) {
            Category::Drift
        } else {
            Category::Other
        };
        buckets.entry(category).or_default().push(entry.to_string());
    }
    buckets
}

/// Category of a typed record, derived from its id and commentary only.
pub fn categorize_record(record: &SignalRecord, cfg: &GovernCfg) -> Category {
    if record.mentions(&cfg.drift_marker) {
        Category::Drift
    } else {
        Category::Other
    }
}
