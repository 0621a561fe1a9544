use rotaplan_core::CoreError;
use rotaplan_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("mutation not found: {0}")]
    MutationNotFound(String),

    #[error("mutation {mutation} is {status}, expected {expected}")]
    InvalidMutationStatus {
        mutation: String,
        status: &'static str,
        expected: &'static str,
    },

    #[error("mutation {0} was approved concurrently")]
    ApprovalConflict(String),

    #[error("mutation {0} has violations and cannot be approved")]
    HasViolations(String),

    #[error("snapshot missing for state hash {0}")]
    SnapshotMissing(String),

    #[error("alternative not found: {0}")]
    AlternativeNotFound(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("{0} requires a pro subscription")]
    TierRequired(&'static str),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}
