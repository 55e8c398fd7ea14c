use thiserror::Error;

/// Recoverable governance faults. The calling governance loop decides the
/// fallback; none of these should take down the host process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GovernError {
    /// A tribunal needs at least one signal to produce a verdict.
    #[error("tribunal convened with no signals")]
    EmptyTribunal,

    /// Zero log entries cannot attest agreement or disagreement.
    #[error("consensus check over an empty log window")]
    EmptyLogWindow,

    /// Rollback lookup for an id that was never registered.
    #[error("no recoverable state registered for `{id}`")]
    SnapshotNotFound { id: String },
}
