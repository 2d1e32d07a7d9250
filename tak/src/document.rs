//! Game-state document as published by the broadcast server.
//!
//! A document is an immutable snapshot: every update produces a new value and
//! the previous one is dropped. Field names follow the server's camelCase JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::Player;

/// Complete, immutable snapshot of the broadcast game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDocument {
    pub round_number: u64,
    pub opening_tps: String,
    pub white_player: String,
    pub black_player: String,
    pub half_komi: i32,
    pub size: u8,
    /// Moves played before live tracking began. Fixed for the whole round.
    #[serde(default)]
    pub opening_moves: Vec<String>,
    /// Committed plies, append-only within a round.
    pub moves: Vec<MovePly>,
    /// Look-ahead analysis for the position after the last committed ply.
    #[serde(default, deserialize_with = "lenient")]
    pub current_move_uci_info: Option<AnalysisInfo>,
    #[serde(default)]
    pub white_time_left: Option<ClockTime>,
    #[serde(default)]
    pub black_time_left: Option<ClockTime>,
}

/// A single committed ply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePly {
    #[serde(rename = "move")]
    pub mv: String,
    /// Analysis that was current when this ply was committed.
    #[serde(default, deserialize_with = "lenient")]
    pub uci_info: Option<AnalysisInfo>,
}

/// Raw engine analysis for one node.
///
/// Every field is optional. Scores are from the perspective of the side to
/// move at that node.
///
/// Decoding never fails on a bad field: `null` or a value of the wrong type
/// reads as absent, and a `pv` that is not a list of strings reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisInfo {
    #[serde(deserialize_with = "lenient")]
    pub cp_score: Option<f64>,
    /// `[win, draw, loss]` in permille.
    #[serde(deserialize_with = "lenient")]
    pub wdl: Option<[f64; 3]>,
    #[serde(deserialize_with = "lenient_count")]
    pub depth: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub seldepth: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub nodes: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub nps: Option<f64>,
    /// Elapsed search time in milliseconds.
    #[serde(deserialize_with = "lenient_count")]
    pub time: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub hashfull: Option<u32>,
    /// Principal variation as move strings.
    #[serde(deserialize_with = "lenient_list")]
    pub pv: Vec<String>,
}

/// Any value that does not decode as `T` becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Counters sent as floats are truncated; negative or oversized values are
/// dropped.
fn lenient_count<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value.as_u64() {
        Some(n) => Some(n),
        None => value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64),
    };
    Ok(count.and_then(|n| T::try_from(n).ok()))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, Vec<String>>(deserializer)?.unwrap_or_default())
}

/// Remaining clock time, serialized the way `std::time::Duration` is by serde.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    pub secs: u64,
    #[serde(default)]
    pub nanos: u32,
}

impl ClockTime {
    /// `m:ss`
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.secs / 60, self.secs % 60)
    }
}

impl GameStateDocument {
    /// Number of plies on the board, opening moves included.
    pub fn ply_count(&self) -> usize {
        self.opening_moves.len() + self.moves.len()
    }

    /// Player to move in the current position.
    pub fn side_to_move(&self) -> Player {
        Player::for_ply(self.ply_count())
    }

    /// Iterate over the notation of every ply, opening moves first.
    pub fn all_moves(&self) -> impl Iterator<Item = &str> {
        self.opening_moves
            .iter()
            .map(String::as_str)
            .chain(self.moves.iter().map(|ply| ply.mv.as_str()))
    }

    /// Analysis attached to the most recently committed ply.
    pub fn last_committed_info(&self) -> Option<&AnalysisInfo> {
        self.moves.last().and_then(|ply| ply.uci_info.as_ref())
    }

    /// Absolute ply index (opening moves included) of `moves[index]`.
    pub fn ply_index(&self, index: usize) -> usize {
        self.opening_moves.len() + index
    }

    pub fn time_left(&self, player: Player) -> Option<ClockTime> {
        match player {
            Player::One => self.white_time_left,
            Player::Two => self.black_time_left,
        }
    }

    pub fn player_name(&self, player: Player) -> &str {
        match player {
            Player::One => &self.white_player,
            Player::Two => &self.black_player,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn document(round: u64, moves: &[&str]) -> GameStateDocument {
        GameStateDocument {
            round_number: round,
            opening_tps: "x6/x6/x6/x6/x6/x6 1 1".to_string(),
            white_player: "engines/tiltak".to_string(),
            black_player: "topaz".to_string(),
            half_komi: 4,
            size: 6,
            opening_moves: vec![],
            moves: moves
                .iter()
                .map(|mv| MovePly {
                    mv: mv.to_string(),
                    uci_info: None,
                })
                .collect(),
            current_move_uci_info: None,
            white_time_left: None,
            black_time_left: None,
        }
    }
}
