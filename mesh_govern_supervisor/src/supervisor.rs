//! Sharded governance supervisor.
//!
//! This is the outside-world facing orchestration layer around
//! `mesh_govern_core`:
//! - owns the rollback registry, sharded by snapshot id
//! - groups incoming signals by domain
//! - applies optional per-domain `GovernCfg` overrides
//! - runs the core pipeline and returns a per-batch governance report
//!
//! No IO. No async. Concurrency is achieved by sharding registry state by
//! snapshot id; one shard mutex is held at a time.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mesh_govern_core::{
    check_domain_consensus, classify_anomalies_cfg, convene_tribunal, predict_outcome,
    prioritize_signals_cfg, reallocate_quota, remediate_drift_with, Category, DomainLog,
    GovernCfg, GovernError, OverrideContext, OverridePrognosis, RemediationOutcome,
    RollbackRegistry, SignalRecord, TribunalRuling,
};

use crate::adapter::{build_signal_batch, Adjudicator, SignalBuilder, TelemetryEvent};

/// Per-domain output of one ingest pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainAction {
    pub domain: String,
    /// The domain's signals, most severe first.
    pub prioritized: Vec<String>,
    /// Category buckets, input order preserved within each bucket.
    pub categories: BTreeMap<Category, Vec<String>>,
    /// Majority verdict over the domain's signals.
    pub ruling: TribunalRuling,
    /// Advisory prediction for the top-priority signal.
    pub prognosis: OverridePrognosis,
    /// One outcome per drift-tagged signal; snapshot application is the
    /// caller's job.
    pub remediations: Vec<RemediationOutcome>,
}

/// Output of one ingest pass over a telemetry batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceReport {
    /// True iff every record in the batch reported the same signal.
    pub consensus: bool,
    /// Per-domain actions, sorted by domain.
    pub actions: Vec<DomainAction>,
}

/// Snapshot of registry state for storage-agnostic persistence.
///
/// This is intentionally pure data: callers decide how/where to store it.
/// Deterministic ordering: entries are sorted by id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub entries: Vec<(String, Value)>,
}

/// Simple observability counters returned by restore/import operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreStats {
    /// Number of entries applied from the snapshot/iterator.
    pub applied: usize,
    /// Number of existing entries that were overwritten.
    pub overwritten: usize,
}

/// Deterministic FNV-1a hash (stable across runs).
fn fnv1a_u64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

fn shard_index(id: &str, shard_count: usize) -> usize {
    if shard_count <= 1 {
        return 0;
    }
    (fnv1a_u64(id) as usize) % shard_count
}

/// A sharded governance supervisor.
///
/// - `shards == 1` is the default and behaves like a single-threaded
///   registry.
/// - Increasing `shards` reduces contention when callers share the
///   supervisor across threads (wrap it in an `Arc` externally; this crate
///   does not spawn threads). Writes to the same snapshot id serialize on
///   one shard mutex, so concurrent `register_state` calls cannot lose
///   updates.
#[derive(Debug)]
pub struct GovernSupervisor {
    cfg: GovernCfg,
    /// Optional per-domain cfg overrides.
    cfg_overrides: HashMap<String, GovernCfg>,
    shards: usize,
    registry_shards: Vec<Mutex<RollbackRegistry>>,
}

impl GovernSupervisor {
    /// Create a supervisor with `shards` registry shards. `shards=1` is the
    /// default.
    pub fn new(shards: usize, cfg: GovernCfg) -> Self {
        let shards = shards.max(1);
        let mut registry_shards = Vec::with_capacity(shards);
        for _ in 0..shards {
            registry_shards.push(Mutex::new(RollbackRegistry::new()));
        }

        Self {
            cfg,
            cfg_overrides: HashMap::new(),
            shards,
            registry_shards,
        }
    }

    /// Override cfg for a specific domain.
    pub fn set_cfg_override(&mut self, domain: impl Into<String>, cfg: GovernCfg) {
        self.cfg_overrides.insert(domain.into(), cfg);
    }

    /// Remove cfg override for a specific domain.
    pub fn clear_cfg_override(&mut self, domain: &str) {
        self.cfg_overrides.remove(domain);
    }

    fn cfg_for(&self, domain: &str) -> &GovernCfg {
        self.cfg_overrides.get(domain).unwrap_or(&self.cfg)
    }

    fn shard_for(&self, id: &str) -> std::sync::MutexGuard<'_, RollbackRegistry> {
        let idx = shard_index(id, self.shards);
        self.registry_shards[idx]
            .lock()
            .expect("governance registry shard mutex poisoned")
    }

    /// Store or overwrite the recoverable state for `id`. Returns true when
    /// an existing snapshot was replaced.
    pub fn register_state(&self, id: &str, state: Value) -> bool {
        let overwrote = self.shard_for(id).register_state(id, state);
        if overwrote {
            log::debug!("registry: overwrote recoverable state for `{}`", id);
        }
        overwrote
    }

    /// Retrieve the last recoverable state registered for `id`.
    pub fn rollback(&self, id: &str) -> Result<Value, GovernError> {
        self.shard_for(id).rollback(id)
    }

    /// Drop a single recoverable state (useful for ops / debugging).
    pub fn clear_state(&self, id: &str) {
        self.shard_for(id).remove(id);
    }

    /// Export all registry entries as a plain snapshot.
    ///
    /// No IO, no policy: callers decide how/where to persist this.
    /// Deterministic ordering: entries are returned sorted by id.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot_filtered(|_, _| true)
    }

    /// Export a snapshot filtered by a caller-provided predicate, so a
    /// persistence layer can keep only the entries it still cares about.
    ///
    /// Deterministic ordering: entries are returned sorted by id.
    pub fn snapshot_filtered<F>(&self, mut predicate: F) -> RegistrySnapshot
    where
        F: FnMut(&str, &Value) -> bool,
    {
        let mut out: Vec<(String, Value)> = Vec::new();

        // Lock shards in a stable order.
        for shard in &self.registry_shards {
            let guard = shard
                .lock()
                .expect("governance registry shard mutex poisoned");
            for (id, state) in guard.iter() {
                if predicate(id.as_str(), state) {
                    out.push((id.clone(), state.clone()));
                }
            }
        }

        out.sort_by(|a, b| a.0.cmp(&b.0));
        RegistrySnapshot { entries: out }
    }

    /// Restore registry state from a previously exported snapshot,
    /// overwriting any state currently held by the supervisor.
    pub fn restore(&self, snap: RegistrySnapshot) -> RestoreStats {
        for shard in &self.registry_shards {
            shard
                .lock()
                .expect("governance registry shard mutex poisoned")
                .clear();
        }
        self.import_entries(snap.entries)
    }

    /// Restore by merging a snapshot into the current state.
    ///
    /// Unlike `restore()`, this does **not** clear existing state first.
    /// Snapshot entries overwrite existing entries with the same id. Useful
    /// for best-effort recovery that keeps progress accumulated in-memory
    /// since the last successful save.
    pub fn restore_merge(&self, snap: RegistrySnapshot) -> RestoreStats {
        self.import_entries(snap.entries)
    }

    fn import_entries<I>(&self, iter: I) -> RestoreStats
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut stats = RestoreStats::default();
        for (id, state) in iter {
            if self.shard_for(&id).register_state(id.as_str(), state) {
                stats.overwritten += 1;
            }
            stats.applied += 1;
        }
        stats
    }

    /// Proportionally rebalance the shared quota from usage telemetry.
    /// Stateless passthrough to the core engine, logged for audit trails.
    pub fn reallocate(
        &self,
        usage: &BTreeMap<String, u64>,
        total_quota: u64,
    ) -> BTreeMap<String, u64> {
        let adjusted = reallocate_quota(usage, total_quota);
        log::debug!(
            "quota rebalanced across {} domains (cap {})",
            adjusted.len(),
            total_quota
        );
        adjusted
    }

    /// Ingest a batch of outside-world events and return the governance
    /// report: consensus over the whole batch, then per-domain triage,
    /// verdict, prognosis, and drift remediation.
    ///
    /// Deterministic for a given input ordering + shard count. An empty
    /// batch (after the builder drops malformed events) is an error: there
    /// is nothing to govern.
    pub fn ingest<B, A>(
        &self,
        builder: &B,
        adjudicator: &A,
        events: &[TelemetryEvent<'_>],
    ) -> Result<GovernanceReport, GovernError>
    where
        B: SignalBuilder,
        A: Adjudicator,
    {
        // 1) Build typed records.
        let records = build_signal_batch(builder, events);
        if records.is_empty() {
            return Err(GovernError::EmptyLogWindow);
        }
        log::debug!("governance ingest: {} records", records.len());

        // 2) Cross-domain agreement over the whole batch.
        let logs: Vec<DomainLog> = records
            .iter()
            .map(|r| DomainLog::new(r.domain.clone(), r.id.clone()))
            .collect();
        let consensus = check_domain_consensus(&logs)?;

        // 3) Group by domain; BTreeMap gives sorted, deterministic output.
        let mut by_domain: BTreeMap<String, Vec<SignalRecord>> = BTreeMap::new();
        for record in records {
            by_domain.entry(record.domain.clone()).or_default().push(record);
        }

        // 4) Per-domain triage, verdict, and remediation.
        let mut actions: Vec<DomainAction> = Vec::with_capacity(by_domain.len());
        for (domain, group) in by_domain {
            let cfg = self.cfg_for(&domain);

            let ids: Vec<String> = group.iter().map(|r| r.id.clone()).collect();
            let categories = classify_anomalies_cfg(&ids, cfg);
            let prioritized = prioritize_signals_cfg(&ids, cfg);

            let ruling = convene_tribunal(&ids, |s| adjudicator.adjudicate(s))?;

            let context = OverrideContext::new(domain.clone());
            let prognosis = match prioritized.first() {
                Some(top) => predict_outcome(top, &context),
                None => OverridePrognosis::Unknown,
            };

            // Drift signals trigger snapshot retrieval against the sharded
            // registry; actual state restoration stays with the caller.
            let remediations =
                remediate_drift_with(&group, cfg, |id| self.rollback(id));

            actions.push(DomainAction {
                domain,
                prioritized,
                categories,
                ruling,
                prognosis,
                remediations,
            });
        }

        Ok(GovernanceReport { consensus, actions })
    }
}
