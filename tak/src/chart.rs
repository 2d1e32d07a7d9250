//! Evaluation chart series.
//!
//! One dataset per player. Each committed ply contributes a point to the
//! dataset of the player who made it; opening moves have no score.

use serde::Serialize;

use crate::analysis::evaluate_for;
use crate::document::GameStateDocument;
use crate::types::Player;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub ply: usize,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// X-axis labels, one per ply: `(ply + 1) / 2`.
    pub labels: Vec<f64>,
    pub white: Vec<ChartPoint>,
    pub black: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn from_document(doc: &GameStateDocument) -> Self {
        let opening = doc.opening_moves.len();
        let mut series = Self::default();

        for ply in 0..doc.ply_count() {
            let player = Player::for_ply(ply);
            let score = ply
                .checked_sub(opening)
                .and_then(|index| doc.moves[index].uci_info.as_ref())
                .map(|info| evaluate_for(info, player));

            series.labels.push((ply as f64 + 1.0) / 2.0);
            let point = ChartPoint { ply, score };
            match player {
                Player::One => series.white.push(point),
                Player::Two => series.black.push(point),
            }
        }

        series
    }

    pub fn dataset(&self, player: Player) -> &[ChartPoint] {
        match player {
            Player::One => &self.white,
            Player::Two => &self.black,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
