//! mesh_govern_supervisor
//!
//! Outside-world facing orchestration layer for `mesh_govern_core`.
//!
//! Responsibilities:
//! - own the rollback registry, sharded by snapshot id (deterministic)
//! - convert raw telemetry events into `SignalRecord`s via adapters
//! - run the governance pipeline: classify, prioritize, convene the
//!   tribunal, check cross-domain consensus, remediate drift
//! - export/restore registry snapshots, storage-agnostic
//!
//! Non-goals:
//! - no IO
//! - no async
//! - no policy logic (lives in core)

pub mod adapter;
pub mod supervisor;

pub use adapter::{
    TelemetryEvent,
    SignalBuilder,
    BasicSignalBuilder,
    Adjudicator,
    build_signal_batch,
};

pub use supervisor::{
    GovernSupervisor,
    DomainAction,
    GovernanceReport,
    RegistrySnapshot,
    RestoreStats,
};
