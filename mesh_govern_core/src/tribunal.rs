use serde::{Deserialize, Serialize};

use crate::error::GovernError;

/// Vote counts per verdict label, kept in first-seen label order.
///
/// The order is load-bearing: it is the tribunal's tie-break. An
/// insertion-ordered vector (not a hash map) makes the policy explicit and
/// reproducible across runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerdictTally {
    counts: Vec<(String, u32)>,
}

impl VerdictTally {
    pub fn record(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    pub fn counts(&self) -> &[(String, u32)] {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    /// Winning label under first-seen-label-wins tie-breaking, or `None`
    /// for an empty tally. The strict `>` keeps the earliest label in front
    /// when counts are equal.
    pub fn ruling(&self) -> Option<TribunalRuling> {
        let mut best: Option<&str> = None;
        let mut votes = 0u32;
        for (label, n) in &self.counts {
            if *n > votes {
                best = Some(label.as_str());
                votes = *n;
            }
        }
        let verdict = best?;
        let tied = self
            .counts
            .iter()
            .any(|(l, n)| *n == votes && l != verdict);
        Some(TribunalRuling {
            verdict: verdict.to_string(),
            votes,
            total: self.total(),
            tied,
        })
    }
}

/// Majority outcome of a convened tribunal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribunalRuling {
    pub verdict: String,
    pub votes: u32,
    pub total: u32,
    /// Another label reached the same count; the first-seen label kept the
    /// win. Downstream consumers should treat tied verdicts with reduced
    /// confidence.
    pub tied: bool,
}

/// Apply `verdict_fn` to every signal, tally the votes, and return the
/// majority verdict.
///
/// An empty docket is an error: there is no verdict to return.
pub fn convene_tribunal<S, F>(signals: &[S], verdict_fn: F) -> Result<TribunalRuling, GovernError>
where
    S: AsRef<str>,
    F: Fn(&str) -> String,
{
    if signals.is_empty() {
        return Err(GovernError::EmptyTribunal);
    }

    let mut tally = VerdictTally::default();
    for signal in signals {
        tally.record(&verdict_fn(signal.as_ref()));
    }

    let ruling = match tally.ruling() {
        Some(r) => r,
        None => return Err(GovernError::EmptyTribunal),
    };
    if ruling.tied {
        log::warn!(
            "tribunal tie: `{}` kept the win at {} of {} votes",
            ruling.verdict,
            ruling.votes,
            ruling.total
        );
    }
    Ok(ruling)
}
