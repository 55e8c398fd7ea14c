use std::collections::BTreeMap;

/// Proportionally redistribute `total_quota` across domains by usage share.
///
/// `scale = total_quota / max(total_used, 1)`; each domain gets
/// `floor(usage * scale)`. The unit divisor guards division by zero when
/// all usage is zero, at the cost of degenerate (all-zero) scaling in that
/// case. Independent per-domain flooring means the outputs can undershoot
/// `total_quota` by up to `domains - 1` units; no remainder-distribution
/// pass is applied. Domains absent from `usage` are absent from the output.
pub fn reallocate_quota(usage: &BTreeMap<String, u64>, total_quota: u64) -> BTreeMap<String, u64> {
    let total_used: u64 = usage.values().sum();
    let scale = total_quota as f64 / total_used.max(1) as f64;
    log::debug!(
        "quota reallocation: total_used={} total_quota={} scale={}",
        total_used,
        total_quota,
        scale
    );

    let mut adjusted = BTreeMap::new();
    for (domain, used) in usage {
        adjusted.insert(domain.clone(), (*used as f64 * scale).floor() as u64);
    }
    adjusted
}
