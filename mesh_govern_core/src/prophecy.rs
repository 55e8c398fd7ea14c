use serde::{Deserialize, Serialize};

/// Advisory prediction of the likely override remediation outcome.
/// Consumed by dashboards; never authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverridePrognosis {
    RestoreSovereignty,
    TriggerReallocation,
    Unknown,
}

impl OverridePrognosis {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverridePrognosis::RestoreSovereignty => "restore sovereignty",
            OverridePrognosis::TriggerReallocation => "trigger reallocation",
            OverridePrognosis::Unknown => "unknown",
        }
    }
}

/// Context a prediction is made in.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OverrideContext {
    pub domain: String,
}

impl OverrideContext {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

/// Fully enumerated decision table. Unmatched pairs fall through to
/// `Unknown` rather than failing; no side effects.
pub fn predict_outcome(signal: &str, context: &OverrideContext) -> OverridePrognosis {
    match (context.domain.as_str(), signal) {
        ("auth", "override") => OverridePrognosis::RestoreSovereignty,
        ("quota", "escalation") => OverridePrognosis::TriggerReallocation,
        _ => OverridePrognosis::Unknown,
    }
}
