/// Severity keywords in descending priority order. Rank is the index of the
/// first keyword (in this order) that occurs in a signal; signals matching
/// none sort after all of these.
pub const DEFAULT_SEVERITY_KEYWORDS: [&str; 5] =
    ["failure", "drift", "invalid", "quota", "escalation"];

/// Substring that tags a signal as drift.
pub const DEFAULT_DRIFT_MARKER: &str = "drift";

#[derive(Clone, Debug)]
pub struct GovernCfg {
    pub severity_keywords: Vec<String>,
    pub drift_marker: String,
}

impl Default for GovernCfg {
    fn default() -> Self {
        Self {
            severity_keywords: DEFAULT_SEVERITY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            drift_marker: DEFAULT_DRIFT_MARKER.to_string(),
        }
    }
}
