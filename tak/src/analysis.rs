//! Engine analysis formatting shared by the viewer, chart and status panels.
//!
//! Raw scores are side-to-move relative. Everything produced here for display
//! is player 1 relative: positive means player 1 is better.

use serde::Serialize;

use crate::document::AnalysisInfo;
use crate::types::Player;

/// Viewer-ready analysis record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub evaluation: f64,
    pub depth: Option<u32>,
    pub hashfull: Option<u32>,
    pub nodes: u64,
    pub nps: f64,
    pub pv: Vec<String>,
    pub seldepth: Option<u32>,
    pub time: u64,
}

/// Side-to-move relative evaluation.
///
/// With a WDL triple the result is a win-probability style score in
/// `[-100, 100]` and must not be normalized again. Otherwise it is the raw
/// centipawn score, or 0 when the engine reported none.
pub fn evaluate(info: &AnalysisInfo) -> f64 {
    match info.wdl {
        Some([win, draw, _loss]) => win / 5.0 + draw / 10.0 - 100.0,
        None => info.cp_score.unwrap_or(0.0),
    }
}

/// Evaluation of a node where `to_move` is the side to move, seen from
/// player 1.
pub fn evaluate_for(info: &AnalysisInfo, to_move: Player) -> f64 {
    match to_move {
        Player::One => evaluate(info),
        Player::Two => -evaluate(info),
    }
}

/// Nodes per second. Uses the reported `nps` when present, otherwise
/// approximates it as `nodes * 1000 / (time + 1)`; the `+ 1` keeps a zero
/// search time from dividing by zero, so the derived value is not exact.
pub fn effective_nps(info: &AnalysisInfo) -> f64 {
    match info.nps {
        Some(nps) => nps,
        None => {
            let nodes = info.nodes.unwrap_or(0) as f64;
            let time = info.time.unwrap_or(0) as f64;
            nodes * 1000.0 / (time + 1.0)
        }
    }
}

/// Package analysis for the viewer, negating the score for player 2.
pub fn for_display(info: &AnalysisInfo, perspective: Player) -> AnnotationRecord {
    AnnotationRecord {
        evaluation: evaluate_for(info, perspective),
        depth: info.depth,
        hashfull: info.hashfull,
        nodes: info.nodes.unwrap_or(0),
        nps: effective_nps(info),
        pv: info.pv.clone(),
        seldepth: info.seldepth,
        time: info.time.unwrap_or(0),
    }
}

/// One-line note such as `+1.5/12 15234 nodes 340ms`.
pub fn format_note(info: &AnalysisInfo, turn: Player) -> String {
    let mut eval = (evaluate_for(info, turn) * 10.0).round() / 10.0;
    if eval == 0.0 {
        // drop the sign of negative zero
        eval = 0.0;
    }

    let mut note = format!("{:+.1}", eval);
    if let Some(depth) = info.depth {
        note.push_str(&format!("/{}", depth));
    }
    note.push_str(&format!(
        " {} nodes {}ms",
        info.nodes.unwrap_or(0),
        info.time.unwrap_or(0)
    ));
    note
}

/// `"1234 knps"` above 100k, `"99999 nps"` otherwise.
pub fn format_nps(nps: f64) -> String {
    if nps > 100_000.0 {
        format!("{} knps", (nps / 1000.0).floor())
    } else {
        format!("{} nps", nps.floor())
    }
}
