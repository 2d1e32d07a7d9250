//! Tak broadcast domain types: the game-state document, PTN rendering and
//! engine analysis formatting.

pub mod analysis;
pub mod chart;
pub mod document;
pub mod panel;
pub mod ptn;
pub mod types;

pub use analysis::{
    effective_nps, evaluate, evaluate_for, for_display, format_note, format_nps, AnnotationRecord,
};
pub use chart::{ChartPoint, ChartSeries};
pub use document::{AnalysisInfo, ClockTime, GameStateDocument, MovePly};
pub use panel::{player_panels, PlayerPanel};
pub use types::Player;
