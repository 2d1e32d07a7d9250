//! Per-player status panels shown next to the viewer.

use crate::analysis::{effective_nps, evaluate_for, format_nps};
use crate::document::{AnalysisInfo, GameStateDocument};
use crate::ptn::strip_player_name;
use crate::types::Player;

/// What the status UI shows for one player.
///
/// The side to move shows the live look-ahead analysis; the other player
/// shows the analysis that was current when they committed their last ply.
/// Evaluations are player 1 relative in both panels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPanel {
    pub player: Player,
    pub name: String,
    pub to_move: bool,
    pub evaluation: Option<f64>,
    pub pv: String,
    pub nps: Option<String>,
    pub clock: Option<String>,
}

impl PlayerPanel {
    pub fn for_player(doc: &GameStateDocument, player: Player) -> Self {
        let to_move = doc.side_to_move() == player;
        let info: Option<&AnalysisInfo> = if to_move {
            doc.current_move_uci_info.as_ref()
        } else {
            doc.last_committed_info()
        };

        Self {
            player,
            name: strip_player_name(doc.player_name(player)).to_string(),
            to_move,
            evaluation: info.map(|info| evaluate_for(info, player)),
            pv: info.map(|info| info.pv.join(" ")).unwrap_or_default(),
            nps: info.map(|info| format_nps(effective_nps(info))),
            clock: doc.time_left(player).map(|t| t.display()),
        }
    }
}

/// Both panels, player 1 first.
pub fn player_panels(doc: &GameStateDocument) -> [PlayerPanel; 2] {
    [
        PlayerPanel::for_player(doc, Player::One),
        PlayerPanel::for_player(doc, Player::Two),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::document;
    use crate::document::ClockTime;

    #[test]
    fn test_panels_after_player_one_moved() {
        let mut doc = document(1, &["a1", "f6", "c3"]);
        doc.moves[2].uci_info = Some(AnalysisInfo {
            cp_score: Some(40.0),
            pv: vec!["c3".to_string(), "d4".to_string()],
            nps: Some(250_000.0),
            ..Default::default()
        });
        doc.current_move_uci_info = Some(AnalysisInfo {
            cp_score: Some(35.0),
            pv: vec!["d4".to_string()],
            ..Default::default()
        });
        doc.white_time_left = Some(ClockTime { secs: 600, nanos: 0 });

        let [white, black] = player_panels(&doc);

        assert!(!white.to_move);
        assert_eq!(white.name, "tiltak");
        assert_eq!(white.evaluation, Some(40.0));
        assert_eq!(white.pv, "c3 d4");
        assert_eq!(white.nps.as_deref(), Some("250 knps"));
        assert_eq!(white.clock.as_deref(), Some("10:00"));

        assert!(black.to_move);
        assert_eq!(black.evaluation, Some(-35.0));
        assert_eq!(black.pv, "d4");
        assert_eq!(black.clock, None);
    }

    #[test]
    fn test_panels_without_analysis() {
        let doc = document(1, &[]);
        let [white, black] = player_panels(&doc);
        assert!(white.to_move);
        assert_eq!(white.evaluation, None);
        assert_eq!(white.pv, "");
        assert_eq!(black.nps, None);
    }
}
