use std::collections::HashSet;

use crate::error::GovernError;
use crate::signal::DomainLog;

/// True iff every log entry in the window reports the same signal.
///
/// An empty window is an error rather than vacuous agreement: an outage
/// that produces zero logs must not read as full consensus.
pub fn check_domain_consensus(logs: &[DomainLog]) -> Result<bool, GovernError> {
    if logs.is_empty() {
        return Err(GovernError::EmptyLogWindow);
    }
    let distinct: HashSet<&str> = logs.iter().map(|l| l.signal.as_str()).collect();
    Ok(distinct.len() == 1)
}
