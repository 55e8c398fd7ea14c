use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cfg::GovernCfg;
use crate::error::GovernError;
use crate::signal::SignalRecord;

/// Named recoverable states.
///
/// Last writer wins; no versioning or history is kept, and entries never
/// expire. Long-running callers bound growth externally. This is plain
/// owned data: callers that share a registry across threads put it behind
/// their own lock (the supervisor crate shards it behind mutexes).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RollbackRegistry {
    entries: HashMap<String, Value>,
}

impl RollbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the snapshot for `id`. Returns true when an
    /// existing snapshot was replaced (and thereby discarded).
    pub fn register_state(&mut self, id: impl Into<String>, state: Value) -> bool {
        self.entries.insert(id.into(), state).is_some()
    }

    /// Retrieve the last snapshot registered for `id`.
    ///
    /// Applying the snapshot back to the live system is an external
    /// collaborator's job; this contract ends at retrieval.
    pub fn rollback(&self, id: &str) -> Result<Value, GovernError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| GovernError::SnapshotNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Value> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

/// Outcome of one drift remediation attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub id: String,
    /// Retrieved snapshot, or `None` when nothing was ever registered for
    /// the id. A miss is recoverable; the sweep continues.
    pub snapshot: Option<Value>,
}

/// Scan signals and retrieve a recovery snapshot for every drift-tagged one.
pub fn remediate_drift(
    registry: &RollbackRegistry,
    signals: &[SignalRecord],
    cfg: &GovernCfg,
) -> Vec<RemediationOutcome> {
    remediate_drift_with(signals, cfg, |id| registry.rollback(id))
}

/// Remediation sweep against a caller-provided snapshot lookup, for owners
/// that keep registry state behind their own locking (the supervisor).
pub fn remediate_drift_with<F>(
    signals: &[SignalRecord],
    cfg: &GovernCfg,
    mut lookup: F,
) -> Vec<RemediationOutcome>
where
    F: FnMut(&str) -> Result<Value, GovernError>,
{
    let mut out = Vec::new();
    for record in signals {
        if !record.mentions(&cfg.drift_marker) {
            continue;
        }
        let snapshot = match lookup(&record.id) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("drift remediation: no recoverable state for `{}`", record.id);
                None
            }
        };
        out.push(RemediationOutcome {
            id: record.id.clone(),
            snapshot,
        });
    }
    out
}
