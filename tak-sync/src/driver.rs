//! The sync driver state machine.
//!
//! `SyncDriver` is sans-IO: it consumes transport events, viewer events and
//! retry deadlines and answers with the [`Command`]s to execute. It owns the
//! current document and the change classifier; nothing else can mutate them.
//!
//! Connection states cycle `Disconnected -> Connecting -> Streaming` and fall
//! back to `Disconnected` on any transport or reconciliation failure, after
//! which a reconnect is scheduled with a fixed delay.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tak::{
    for_display, format_note, player_panels, ptn, ChartSeries, GameStateDocument, Player,
    PlayerPanel,
};

use crate::classify::{ChangeClassifier, ChangeKind};
use crate::commands::{
    ChartCommand, Command, GoToPly, StatusNotice, TransportEvent, ViewerCommand, ViewerEvent,
    ViewerSyncState,
};
use crate::error::SyncError;
use crate::reconcile::{reconcile, Delta, HeldDocument};

/// Default reconnect delay.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Viewer settings persisted when they change.
pub const DEFAULT_TRACKED_PREFERENCES: &[&str] =
    &["axisLabels", "showEval", "showPTN", "showRoads", "showText", "themeID"];

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed delay between a failure and the next connection attempt.
    pub retry_delay: Duration,
    /// Only start connecting once the viewer reported its first cursor.
    pub wait_for_viewer: bool,
    pub tracked_preferences: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            wait_for_viewer: true,
            tracked_preferences: DEFAULT_TRACKED_PREFERENCES
                .iter()
                .map(|key| key.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Streaming,
}

/// All state of the sync loop.
#[derive(Debug)]
pub struct SyncDriver {
    config: SyncConfig,
    connection: ConnectionState,
    /// Set once the first connection attempt was made.
    started: bool,
    document: Option<HeldDocument>,
    classifier: ChangeClassifier,
    /// PTN as the viewer currently has it.
    ptn: String,
    viewer: ViewerSyncState,
    viewer_ready: bool,
    /// Jump the viewer to the newest ply whenever moves arrive.
    follow_live: bool,
    panels: Option<[PlayerPanel; 2]>,
    preferences: BTreeMap<String, Value>,
}

impl SyncDriver {
    pub fn new(config: SyncConfig, preferences: BTreeMap<String, Value>) -> Self {
        Self {
            config,
            connection: ConnectionState::Disconnected,
            started: false,
            document: None,
            classifier: ChangeClassifier::new(),
            ptn: String::new(),
            viewer: ViewerSyncState::default(),
            viewer_ready: false,
            follow_live: true,
            panels: None,
            preferences,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn document(&self) -> Option<&GameStateDocument> {
        self.document.as_ref().map(HeldDocument::document)
    }

    pub fn ptn(&self) -> &str {
        &self.ptn
    }

    pub fn viewer(&self) -> &ViewerSyncState {
        &self.viewer
    }

    pub fn is_following_live(&self) -> bool {
        self.follow_live
    }

    pub fn preferences(&self) -> &BTreeMap<String, Value> {
        &self.preferences
    }

    /// Initial commands. Connects right away unless waiting for the viewer.
    pub fn start(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if !self.config.wait_for_viewer {
            self.begin_connect(&mut out);
        }
        out
    }

    /// The scheduled reconnect delay passed.
    pub fn on_retry_elapsed(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.connection == ConnectionState::Disconnected {
            self.begin_connect(&mut out);
        }
        out
    }

    pub fn on_transport(&mut self, event: TransportEvent) -> Vec<Command> {
        let mut out = Vec::new();
        match event {
            TransportEvent::Opened => {
                if self.connection == ConnectionState::Connecting {
                    tracing::info!("Connected, waiting for first snapshot");
                    self.connection = ConnectionState::Streaming;
                    self.document = None;
                    self.classifier.reset();
                    out.push(Command::Status(StatusNotice::Connected));
                } else {
                    tracing::debug!(state = ?self.connection, "Ignoring stale open event");
                }
            }
            TransportEvent::Message(payload) => {
                if self.connection == ConnectionState::Streaming {
                    self.handle_payload(&payload, &mut out);
                } else {
                    tracing::debug!(state = ?self.connection, "Ignoring message outside of stream");
                }
            }
            TransportEvent::Error(reason) => {
                self.fail_if_connected(SyncError::Transport(reason), &mut out)
            }
            TransportEvent::Closed => self.fail_if_connected(SyncError::Closed, &mut out),
        }
        out
    }

    pub fn on_viewer(&mut self, event: ViewerEvent) -> Vec<Command> {
        let mut out = Vec::new();
        match event {
            ViewerEvent::GameState(state) => self.handle_viewer_state(state, &mut out),
            other if !self.viewer_ready => {
                tracing::debug!(event = ?other, "Viewer not loaded yet, ignoring");
            }
            ViewerEvent::First | ViewerEvent::Prev | ViewerEvent::Next => {
                self.follow_live = false;
            }
            ViewerEvent::Last => {
                self.follow_live = true;
            }
            ViewerEvent::SetUi(settings) => self.handle_settings(settings, &mut out),
            ViewerEvent::Unknown(action) => {
                tracing::debug!(%action, "Unhandled viewer action");
            }
        }
        out
    }

    fn begin_connect(&mut self, out: &mut Vec<Command>) {
        tracing::info!("Connecting");
        self.started = true;
        self.connection = ConnectionState::Connecting;
        out.push(Command::Status(StatusNotice::Connecting));
        out.push(Command::Connect);
    }

    fn fail_if_connected(&mut self, err: SyncError, out: &mut Vec<Command>) {
        if self.connection == ConnectionState::Disconnected {
            tracing::debug!(error = %err, "Ignoring failure while disconnected");
            return;
        }
        self.fail(err, out);
    }

    /// Drop the document and the connection, schedule a reconnect.
    fn fail(&mut self, err: SyncError, out: &mut Vec<Command>) {
        tracing::warn!(
            error = %err,
            retry_ms = self.config.retry_delay.as_millis() as u64,
            "Connection lost"
        );
        self.connection = ConnectionState::Disconnected;
        self.document = None;
        self.classifier.reset();
        out.push(Command::Disconnect);
        out.push(Command::Status(StatusNotice::ConnectionLost(err.to_string())));
        out.push(Command::ScheduleReconnect(self.config.retry_delay));
    }

    fn handle_payload(&mut self, payload: &str, out: &mut Vec<Command>) {
        let next = Delta::from_payload(payload)
            .and_then(|delta| reconcile(self.document.as_ref(), &delta));
        let held = match next {
            Ok(held) => held,
            Err(err) => return self.fail(err.into(), out),
        };

        let kind = self.classifier.classify(held.document());
        tracing::debug!(
            ?kind,
            round = held.document().round_number,
            moves = held.document().moves.len(),
            "Reconciled update"
        );
        self.emit_changes(kind, held.document(), out);
        self.document = Some(held);
    }

    fn emit_changes(&mut self, kind: ChangeKind, doc: &GameStateDocument, out: &mut Vec<Command>) {
        match kind {
            ChangeKind::NewGame => {
                tracing::info!(
                    round = doc.round_number,
                    white = %doc.white_player,
                    black = %doc.black_player,
                    "New game"
                );
                self.sync_full(doc, false, out);
            }
            ChangeKind::NewMoves(count) => self.sync_new_moves(doc, count, out),
            ChangeKind::NewAnalysisOnly => self.push_analysis(doc, out),
            ChangeKind::NoOp => {}
        }
        self.push_panels(doc, out);
    }

    /// Send the whole game. The PTN itself is skipped when the viewer already
    /// shows the same one, unless `force` is set; notes and the chart are
    /// always refreshed since analysis may have been attached meanwhile.
    fn sync_full(&mut self, doc: &GameStateDocument, force: bool, out: &mut Vec<Command>) {
        let ptn = ptn::render(doc);
        if ptn == self.ptn && !force {
            self.push_notes(doc, 0, out);
            out.push(Command::Chart(ChartCommand::Series(ChartSeries::from_document(doc))));
            self.push_analysis(doc, out);
            return;
        }
        self.ptn = ptn.clone();

        self.viewer_command(ViewerCommand::SetCurrentPtn(ptn), out);
        self.viewer_command(ViewerCommand::SetName(game_name(doc)), out);
        self.push_notes(doc, 0, out);

        if self.follow_live {
            self.viewer_command(ViewerCommand::Last, out);
        } else if let Some(ply) = self.viewer.board_ply.filter(|ply| *ply <= doc.ply_count()) {
            // a new PTN resets the viewer cursor, put it back where the user was
            self.viewer_command(
                ViewerCommand::GoToPly(GoToPly {
                    ply_id: ply,
                    is_done: false,
                }),
                out,
            );
        }

        out.push(Command::Chart(ChartCommand::Series(ChartSeries::from_document(doc))));
        self.push_analysis(doc, out);
    }

    fn sync_new_moves(&mut self, doc: &GameStateDocument, count: usize, out: &mut Vec<Command>) {
        let first = doc.moves.len() - count;
        for ply in &doc.moves[first..] {
            ptn::append_ply(&mut self.ptn, &ply.mv);
            self.viewer_command(ViewerCommand::AppendPly(ply.mv.clone()), out);
        }

        self.push_notes(doc, first, out);
        if self.follow_live {
            self.viewer_command(ViewerCommand::Last, out);
        }

        out.push(Command::Chart(ChartCommand::Series(ChartSeries::from_document(doc))));
        self.push_analysis(doc, out);
    }

    fn push_notes(&self, doc: &GameStateDocument, first: usize, out: &mut Vec<Command>) {
        let notes = notes_for(doc, first);
        if !notes.is_empty() {
            self.viewer_command(ViewerCommand::AddNotes(notes), out);
        }
    }

    /// Live analysis, only while the viewer sits on the newest ply.
    fn push_analysis(&mut self, doc: &GameStateDocument, out: &mut Vec<Command>) {
        if !self.viewer.is_at_end_of_main_branch {
            return;
        }
        if let Some(info) = &doc.current_move_uci_info {
            let record = for_display(info, doc.side_to_move());
            self.viewer_command(ViewerCommand::SetAnalysis(record), out);
        }
    }

    fn push_panels(&mut self, doc: &GameStateDocument, out: &mut Vec<Command>) {
        let panels = player_panels(doc);
        if self.panels.as_ref() != Some(&panels) {
            out.push(Command::Status(StatusNotice::Panels(Box::new(panels.clone()))));
            self.panels = Some(panels);
        }
    }

    /// Viewer commands are dropped until the viewer loaded; it gets a full
    /// resync at that point.
    fn viewer_command(&self, command: ViewerCommand, out: &mut Vec<Command>) {
        if self.viewer_ready {
            out.push(Command::Viewer(command));
        }
    }

    fn handle_viewer_state(&mut self, state: ViewerSyncState, out: &mut Vec<Command>) {
        let previous = std::mem::replace(&mut self.viewer, state);

        if !self.viewer_ready {
            tracing::info!("Viewer loaded");
            self.viewer_ready = true;
            if let Some(held) = self.document.take() {
                self.sync_full(held.document(), true, out);
                self.document = Some(held);
            }
            out.push(Command::Chart(ChartCommand::Cursor(state.board_ply)));
            if !self.started {
                self.begin_connect(out);
            }
            return;
        }

        if state.is_at_end_of_main_branch && !previous.is_at_end_of_main_branch {
            if let Some(held) = self.document.take() {
                self.push_analysis(held.document(), out);
                self.document = Some(held);
            }
        }
        if state.board_ply != previous.board_ply {
            out.push(Command::Chart(ChartCommand::Cursor(state.board_ply)));
        }
    }

    fn handle_settings(&mut self, settings: BTreeMap<String, Value>, out: &mut Vec<Command>) {
        for (key, value) in settings {
            if !self.config.tracked_preferences.contains(&key) {
                continue;
            }
            if self.preferences.get(&key) == Some(&value) {
                continue;
            }
            tracing::debug!(%key, %value, "Preference changed");
            self.preferences.insert(key.clone(), value.clone());
            out.push(Command::Persist { key, value });
        }
    }
}

/// Notes for every annotated ply from `moves[first]` on, keyed by absolute
/// ply index and written from the mover's side.
fn notes_for(doc: &GameStateDocument, first: usize) -> BTreeMap<usize, Vec<String>> {
    doc.moves
        .iter()
        .enumerate()
        .skip(first)
        .filter_map(|(index, ply)| {
            let info = ply.uci_info.as_ref()?;
            let ply_index = doc.ply_index(index);
            Some((ply_index, vec![format_note(info, Player::for_ply(ply_index))]))
        })
        .collect()
}

fn game_name(doc: &GameStateDocument) -> String {
    format!(
        "{} vs {} - round {}",
        ptn::strip_player_name(&doc.white_player),
        ptn::strip_player_name(&doc.black_player),
        doc.round_number
    )
}
