//! Patch reconciliation.
//!
//! The held document is never patched in place: operations run against a copy
//! and the copy only replaces the previous document once every operation
//! succeeded and the result still decodes as a game state.

use json_patch::Patch;
use serde_json::Value;
use tak::GameStateDocument;

use crate::error::ReconcileError;

/// One inbound update.
#[derive(Debug, Clone)]
pub enum Delta {
    /// Full document, replaces whatever is held.
    Snapshot(Value),
    /// RFC 6902 operations against the held document.
    Patch(Patch),
    /// Whole-document replace followed by further operations.
    SnapshotThenPatch(Value, Patch),
}

impl Delta {
    /// Decode a transport payload. Objects are snapshots, arrays are patch
    /// batches. A batch that opens by replacing the root (`""`) is a snapshot,
    /// which is how the broadcast server starts every stream.
    pub fn from_payload(payload: &str) -> Result<Self, ReconcileError> {
        let value: Value = serde_json::from_str(payload).map_err(ReconcileError::Payload)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ReconcileError> {
        match value {
            Value::Object(_) => Ok(Self::Snapshot(value)),
            Value::Array(mut ops) => {
                let root = ops.first().and_then(root_replacement).cloned();
                match root {
                    Some(snapshot) => {
                        ops.remove(0);
                        let rest = if ops.is_empty() {
                            Patch(Vec::new())
                        } else {
                            serde_json::from_value(Value::Array(ops))
                                .map_err(ReconcileError::Payload)?
                        };
                        Ok(Self::SnapshotThenPatch(snapshot, rest))
                    }
                    None => {
                        let patch =
                            serde_json::from_value(Value::Array(ops)).map_err(ReconcileError::Payload)?;
                        Ok(Self::Patch(patch))
                    }
                }
            }
            _ => Err(ReconcileError::UnexpectedPayload),
        }
    }
}

/// The value of an `add`/`replace` operation targeting the whole document.
fn root_replacement(op: &Value) -> Option<&Value> {
    let kind = op.get("op")?.as_str()?;
    let path = op.get("path")?.as_str()?;
    if path.is_empty() && matches!(kind, "add" | "replace") {
        op.get("value")
    } else {
        None
    }
}

/// A reconciled document: the raw JSON used as the base for the next patch and
/// its typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldDocument {
    raw: Value,
    document: GameStateDocument,
}

impl HeldDocument {
    pub fn from_value(raw: Value) -> Result<Self, ReconcileError> {
        let document = serde_json::from_value(raw.clone()).map_err(ReconcileError::Decode)?;
        Ok(Self { raw, document })
    }

    pub fn document(&self) -> &GameStateDocument {
        &self.document
    }
}

/// Apply `delta` to `previous`, producing the next document.
///
/// Fails without side effects: on error the caller still holds `previous`
/// untouched and decides what to discard.
pub fn reconcile(
    previous: Option<&HeldDocument>,
    delta: &Delta,
) -> Result<HeldDocument, ReconcileError> {
    match delta {
        Delta::Snapshot(snapshot) => HeldDocument::from_value(snapshot.clone()),
        Delta::SnapshotThenPatch(snapshot, patch) => apply(snapshot.clone(), patch),
        Delta::Patch(patch) => {
            let base = previous.ok_or(ReconcileError::NoBaseDocument)?;
            if patch.0.is_empty() {
                return Ok(base.clone());
            }
            apply(base.raw.clone(), patch)
        }
    }
}

fn apply(mut raw: Value, patch: &Patch) -> Result<HeldDocument, ReconcileError> {
    json_patch::patch(&mut raw, &patch.0)?;
    HeldDocument::from_value(raw)
}
