//! Classification of document transitions.

use tak::{AnalysisInfo, GameStateDocument};

/// What changed between two consecutive documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// No previous document, a different round, or fewer moves than before.
    NewGame,
    /// This many plies were committed since the last update.
    NewMoves(usize),
    /// Only the look-ahead analysis changed.
    NewAnalysisOnly,
    NoOp,
}

/// Remembers what the last classified document looked like.
///
/// A fresh or reset classifier has observed nothing, so the next document is
/// always a [`ChangeKind::NewGame`].
#[derive(Debug, Clone, Default)]
pub struct ChangeClassifier {
    round: Option<u64>,
    observed_moves: usize,
    observed_analysis: Option<AnalysisInfo>,
}

impl ChangeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A classifier that has already observed `doc`.
    pub fn observing(doc: &GameStateDocument) -> Self {
        Self {
            round: Some(doc.round_number),
            observed_moves: doc.moves.len(),
            observed_analysis: doc.current_move_uci_info.clone(),
        }
    }

    /// Classify `current` against what was observed last, then observe it.
    ///
    /// First match wins: a round reset beats a move-count change, and new
    /// moves are reported even when the analysis changed in the same update.
    pub fn classify(&mut self, current: &GameStateDocument) -> ChangeKind {
        let moves = current.moves.len();
        let kind = match self.round {
            Some(round) if round == current.round_number && moves >= self.observed_moves => {
                if moves > self.observed_moves {
                    ChangeKind::NewMoves(moves - self.observed_moves)
                } else if current.current_move_uci_info != self.observed_analysis {
                    ChangeKind::NewAnalysisOnly
                } else {
                    ChangeKind::NoOp
                }
            }
            _ => ChangeKind::NewGame,
        };

        *self = Self::observing(current);
        kind
    }

    /// Forget everything, e.g. after the document was discarded.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn observed_moves(&self) -> usize {
        self.observed_moves
    }
}

/// Stateless classification of `previous -> current`.
pub fn classify(previous: Option<&GameStateDocument>, current: &GameStateDocument) -> ChangeKind {
    previous
        .map(ChangeClassifier::observing)
        .unwrap_or_default()
        .classify(current)
}
