//! Console stand-ins for the viewer widget, the chart and the status UI.

use std::path::PathBuf;

use tak::{ptn, Player};
use tak_sync::{ChartCommand, ChartSink, StatusNotice, StatusSink, ViewerCommand, ViewerWidget};

/// Mirrors the viewer's PTN and prints what a viewer would show.
/// The PTN is rewritten to `ptn_out` after every change.
pub struct ConsoleViewer {
    ptn: String,
    ptn_out: Option<PathBuf>,
}

impl ConsoleViewer {
    pub fn new(ptn_out: Option<PathBuf>) -> Self {
        Self {
            ptn: String::new(),
            ptn_out,
        }
    }

    #[cfg(test)]
    fn ptn(&self) -> &str {
        &self.ptn
    }

    fn write_ptn(&self) {
        let Some(path) = &self.ptn_out else {
            return;
        };
        if let Err(e) = std::fs::write(path, &self.ptn) {
            tracing::warn!("Failed to write PTN to {:?}: {}", path, e);
        }
    }
}

impl ViewerWidget for ConsoleViewer {
    fn send(&mut self, command: ViewerCommand) {
        match serde_json::to_string(&command) {
            Ok(json) => tracing::trace!(%json, "Viewer command"),
            Err(e) => tracing::warn!("Unserializable viewer command: {}", e),
        }

        match command {
            ViewerCommand::SetCurrentPtn(ptn) => {
                self.ptn = ptn;
                self.write_ptn();
            }
            ViewerCommand::AppendPly(mv) => {
                ptn::append_ply(&mut self.ptn, &mv);
                self.write_ptn();
                println!("  {mv}");
            }
            ViewerCommand::SetName(name) => println!("== {name} =="),
            ViewerCommand::SetAnalysis(record) => {
                println!(
                    "  eval {}  depth {}  {}",
                    format_eval(record.evaluation),
                    record.depth.map_or_else(|| "-".to_string(), |d| d.to_string()),
                    record.pv.join(" ")
                );
            }
            ViewerCommand::AddNotes(notes) => {
                for (ply, lines) in notes {
                    tracing::debug!(ply, notes = ?lines, "Notes");
                }
            }
            ViewerCommand::GoToPly(target) => tracing::debug!(ply = target.ply_id, "Go to ply"),
            ViewerCommand::Last => {}
        }
    }
}

/// Evaluations arrive already scaled for display, centipawns or a WDL score.
fn format_eval(eval: f64) -> String {
    format!("{:+.1}", eval)
}

/// Logs chart updates.
#[derive(Default)]
pub struct ConsoleChart;

impl ChartSink for ConsoleChart {
    fn apply(&mut self, command: ChartCommand) {
        match command {
            ChartCommand::Series(series) => {
                let latest = [Player::One, Player::Two]
                    .into_iter()
                    .filter_map(|player| series.dataset(player).last())
                    .max_by_key(|point| point.ply)
                    .and_then(|point| point.score);
                tracing::debug!(points = series.len(), ?latest, "Chart updated");
            }
            ChartCommand::Cursor(ply) => tracing::debug!(?ply, "Chart cursor"),
        }
    }
}

/// Prints connection changes and the two player panels.
#[derive(Default)]
pub struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn notify(&mut self, notice: StatusNotice) {
        match notice {
            StatusNotice::Connecting => println!("Connecting..."),
            StatusNotice::Connected => println!("Connected"),
            StatusNotice::ConnectionLost(reason) => println!("Connection lost: {reason}"),
            StatusNotice::Panels(panels) => {
                for panel in panels.iter() {
                    println!(
                        "{} {:<24} {:>6} {:>10} {:>6}  {}",
                        if panel.to_move { ">" } else { " " },
                        panel.name,
                        panel
                            .evaluation
                            .map_or_else(String::new, format_eval),
                        panel.nps.as_deref().unwrap_or(""),
                        panel.clock.as_deref().unwrap_or(""),
                        panel.pv
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tak::AnalysisInfo;

    #[test]
    fn test_viewer_tracks_ptn_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.ptn");
        let mut viewer = ConsoleViewer::new(Some(path.clone()));

        viewer.send(ViewerCommand::SetCurrentPtn("[Size \"6\"]\n".to_string()));
        viewer.send(ViewerCommand::AppendPly("a1".to_string()));
        viewer.send(ViewerCommand::AppendPly("f6".to_string()));

        assert_eq!(viewer.ptn(), "[Size \"6\"]\na1 f6");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[Size \"6\"]\na1 f6");
    }

    #[test]
    fn test_viewer_without_output_file() {
        let mut viewer = ConsoleViewer::new(None);
        viewer.send(ViewerCommand::SetCurrentPtn("[Size \"5\"]\nc3".to_string()));
        viewer.send(ViewerCommand::SetName("Tiltak vs Topaz - round 1".to_string()));
        assert_eq!(viewer.ptn(), "[Size \"5\"]\nc3");
    }

    #[test]
    fn test_wdl_evaluation_printed_unscaled() {
        let info = AnalysisInfo {
            wdl: Some([700.0, 200.0, 100.0]),
            ..Default::default()
        };
        let record = tak::for_display(&info, Player::One);
        assert_eq!(format_eval(record.evaluation), "+60.0");

        let record = tak::for_display(&info, Player::Two);
        assert_eq!(format_eval(record.evaluation), "-60.0");
    }

    #[test]
    fn test_centipawn_evaluation_printed_unscaled() {
        let info = AnalysisInfo {
            cp_score: Some(35.0),
            ..Default::default()
        };
        assert_eq!(format_eval(tak::evaluate(&info)), "+35.0");
    }
}
