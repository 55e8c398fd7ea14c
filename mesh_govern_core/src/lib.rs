pub mod classify;
pub mod priority;

pub mod tribunal;
pub mod consensus;
pub mod rollback;
pub mod quota;
pub mod prophecy;
pub mod cfg;
pub mod signal;
pub mod error;

pub use classify::{Category, classify_anomalies, classify_anomalies_cfg, categorize_record};
pub use priority::{severity_rank, prioritize_signals, prioritize_signals_cfg};

pub use tribunal::{VerdictTally, TribunalRuling, convene_tribunal};
pub use consensus::check_domain_consensus;
pub use rollback::{RollbackRegistry, RemediationOutcome, remediate_drift, remediate_drift_with};
pub use quota::reallocate_quota;
pub use prophecy::{OverrideContext, OverridePrognosis, predict_outcome};
pub use cfg::GovernCfg;
pub use signal::{SignalRecord, DomainLog};
pub use error::GovernError;
