//! Domain adapter layer: convert outside-world telemetry into
//! `mesh_govern_core::SignalRecord`s.
//!
//! This module is intentionally small and policy-light:
//! - No IO
//! - No async
//! - No domain-specific rules
//!
//! Products provide a `SignalBuilder` (or use the provided
//! `BasicSignalBuilder`) to map raw `TelemetryEvent`s into signal records,
//! and an `Adjudicator` to cast tribunal votes.

use std::borrow::Cow;

use mesh_govern_core::SignalRecord;

/// A raw event from the outside world (audit sinks, probes, dashboards).
///
/// The supervisor does not interpret these fields; it delegates to a
/// `SignalBuilder`.
#[derive(Clone, Debug)]
pub struct TelemetryEvent<'a> {
    /// The independently operated partition that emitted the event.
    pub domain: Cow<'a, str>,
    /// Short textual event identifier ("config-drift-eu", "quota-breach").
    pub signal: Cow<'a, str>,
    /// Epoch milliseconds.
    pub timestamp: u64,
    /// Optional commentary lines (logs, operator notes).
    pub commentary: Vec<Cow<'a, str>>,
}

impl<'a> TelemetryEvent<'a> {
    pub fn new(
        domain: impl Into<Cow<'a, str>>,
        signal: impl Into<Cow<'a, str>>,
        timestamp: u64,
    ) -> Self {
        Self {
            domain: domain.into(),
            signal: signal.into(),
            timestamp,
            commentary: Vec::new(),
        }
    }

    /// Attach a commentary line.
    pub fn with_commentary(mut self, line: impl Into<Cow<'a, str>>) -> Self {
        self.commentary.push(line.into());
        self
    }
}

/// Trait: map a `TelemetryEvent` into zero or more signal records.
///
/// Most domains will emit exactly one record per event; a builder may drop
/// malformed events entirely rather than propagate a failure.
pub trait SignalBuilder {
    fn build(&self, ev: &TelemetryEvent<'_>) -> Vec<SignalRecord>;
}

/// Basic builder: trims whitespace, drops events with an empty signal id,
/// and bounds commentary length.
#[derive(Clone, Debug)]
pub struct BasicSignalBuilder {
    /// Maximum commentary lines carried per record; excess is truncated.
    pub max_commentary: usize,
}

impl Default for BasicSignalBuilder {
    fn default() -> Self {
        Self { max_commentary: 32 }
    }
}

impl SignalBuilder for BasicSignalBuilder {
    fn build(&self, ev: &TelemetryEvent<'_>) -> Vec<SignalRecord> {
        let id = ev.signal.trim();
        let domain = ev.domain.trim();
        if id.is_empty() || domain.is_empty() {
            return Vec::new();
        }

        let mut record = SignalRecord::new(id, domain, ev.timestamp);
        for line in ev.commentary.iter().take(self.max_commentary) {
            let line = line.trim();
            if !line.is_empty() {
                record.commentary.push(line.to_string());
            }
        }
        vec![record]
    }
}

/// Trait: cast one verdict for one signal. The tribunal tallies these.
pub trait Adjudicator {
    fn adjudicate(&self, signal: &str) -> String;
}

/// Any plain verdict function is an adjudicator.
impl<F> Adjudicator for F
where
    F: Fn(&str) -> String,
{
    fn adjudicate(&self, signal: &str) -> String {
        self(signal)
    }
}

/// Helper: build records for a batch of events.
///
/// This is intentionally dumb; grouping and locking are handled by the
/// supervisor.
pub fn build_signal_batch<B: SignalBuilder>(
    builder: &B,
    events: &[TelemetryEvent<'_>],
) -> Vec<SignalRecord> {
    let mut out = Vec::new();
    for ev in events {
        out.extend(builder.build(ev));
    }
    out
}
