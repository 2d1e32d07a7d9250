//! Inputs and outputs of the sync driver.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tak::{AnnotationRecord, ChartSeries, PlayerPanel};

/// Events reported by a transport connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    /// One payload: a full snapshot or a patch batch, as JSON text.
    Message(String),
    /// Terminal for the connection that produced it.
    Error(String),
    Closed,
}

/// Commands understood by the viewer widget. Serialized the way the widget
/// expects them: `{"action": "SET_CURRENT_PTN", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewerCommand {
    SetCurrentPtn(String),
    AppendPly(String),
    SetAnalysis(AnnotationRecord),
    /// Notes keyed by absolute ply index.
    AddNotes(BTreeMap<usize, Vec<String>>),
    SetName(String),
    GoToPly(GoToPly),
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoToPly {
    #[serde(rename = "plyID")]
    pub ply_id: usize,
    pub is_done: bool,
}

/// The viewer's cursor, as last reported by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerSyncState {
    #[serde(alias = "plyID")]
    pub board_ply: Option<usize>,
    pub is_at_end_of_main_branch: bool,
}

impl Default for ViewerSyncState {
    fn default() -> Self {
        Self {
            board_ply: None,
            is_at_end_of_main_branch: true,
        }
    }
}

/// Messages posted by the viewer widget.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Cursor report. The first one also signals that the viewer loaded.
    GameState(ViewerSyncState),
    First,
    Prev,
    Next,
    Last,
    /// UI settings changed in the viewer.
    SetUi(BTreeMap<String, Value>),
    Unknown(String),
}

impl ViewerEvent {
    /// Decode a viewer message of the form `{"action": ..., "value": ...}`.
    /// Returns `None` when the message has no action at all.
    pub fn from_message(message: &Value) -> Option<Self> {
        let action = message.get("action")?.as_str()?;
        let value = message.get("value").cloned().unwrap_or(Value::Null);

        let event = match action {
            "GAME_STATE" => Self::GameState(serde_json::from_value(value).unwrap_or_default()),
            "FIRST" => Self::First,
            "PREV" => Self::Prev,
            "NEXT" => Self::Next,
            "LAST" => Self::Last,
            "SET_UI" => match value {
                Value::Object(settings) => Self::SetUi(settings.into_iter().collect()),
                _ => Self::SetUi(BTreeMap::new()),
            },
            other => Self::Unknown(other.to_string()),
        };
        Some(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartCommand {
    Series(ChartSeries),
    /// Vertical cursor at the given ply, or none.
    Cursor(Option<usize>),
}

/// Notices for the status UI.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusNotice {
    Connecting,
    Connected,
    ConnectionLost(String),
    Panels(Box<[PlayerPanel; 2]>),
}

/// Everything the driver asks its environment to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a new transport connection.
    Connect,
    /// Drop the current transport connection.
    Disconnect,
    ScheduleReconnect(Duration),
    Viewer(ViewerCommand),
    Chart(ChartCommand),
    Status(StatusNotice),
    Persist { key: String, value: Value },
}
