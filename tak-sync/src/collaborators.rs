//! Interfaces to everything outside the sync core.

use std::collections::BTreeMap;

use futures::stream::BoxStream;
use serde_json::Value;

use crate::commands::{ChartCommand, StatusNotice, TransportEvent, ViewerCommand};

/// Source of ordered game-state updates.
///
/// Each call to `connect` starts a fresh connection. The returned stream
/// yields `Opened` once connected, then messages in arrival order, and ends
/// with `Error` or `Closed`. Dropping the stream closes the connection.
pub trait Transport: Send {
    fn connect(&mut self) -> BoxStream<'static, TransportEvent>;
}

/// The embedded game viewer.
pub trait ViewerWidget: Send {
    fn send(&mut self, command: ViewerCommand);
}

/// The evaluation chart.
pub trait ChartSink: Send {
    fn apply(&mut self, command: ChartCommand);
}

/// Connection indicator and player panels.
pub trait StatusSink: Send {
    fn notify(&mut self, notice: StatusNotice);
}

/// Key/value store for UI preferences.
pub trait PreferenceStore: Send {
    fn load(&self) -> BTreeMap<String, Value>;

    fn set(&mut self, key: &str, value: &Value) -> std::io::Result<()>;
}

/// All collaborators the runner drives.
pub struct Collaborators {
    pub viewer: Box<dyn ViewerWidget>,
    pub chart: Box<dyn ChartSink>,
    pub status: Box<dyn StatusSink>,
    pub preferences: Box<dyn PreferenceStore>,
}
