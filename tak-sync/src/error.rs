//! Error types for reconciliation and the sync loop

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Patch received before any snapshot")]
    NoBaseDocument,

    #[error("Malformed payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("Payload is neither a snapshot nor a patch batch")]
    UnexpectedPayload,

    #[error("Patch could not be applied: {0}")]
    Patch(#[from] json_patch::PatchError),

    #[error("Patched document is not a game state: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Why the driver dropped its connection.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Transport closed")]
    Closed,

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
