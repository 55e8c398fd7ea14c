use crate::cfg::GovernCfg;

/// Rank of a signal under `cfg.severity_keywords`: the index of the first
/// keyword (in table order) that is a substring of the signal, or the table
/// length when none match. Lower rank means higher severity.
///
/// Table order wins, not byte position: a signal containing both "quota"
/// and "failure" ranks as "failure" even when "quota" occurs first in the
/// string.
pub fn severity_rank(signal: &str, cfg: &GovernCfg) -> usize {
    cfg.severity_keywords
        .iter()
        .position(|k| signal.contains(k.as_str()))
        .unwrap_or(cfg.severity_keywords.len())
}

/// Order signals most severe first.
///
/// The sort is stable: signals of equal rank keep their relative input
/// order, and unranked signals all sort after ranked ones in input order.
pub fn prioritize_signals<S: AsRef<str>>(signals: &[S]) -> Vec<String> {
    prioritize_signals_cfg(signals, &GovernCfg::default())
}

pub fn prioritize_signals_cfg<S: AsRef<str>>(signals: &[S], cfg: &GovernCfg) -> Vec<String> {
    let mut out: Vec<String> = signals.iter().map(|s| s.as_ref().to_string()).collect();
    out.sort_by_key(|s| severity_rank(s, cfg));
    out
}
