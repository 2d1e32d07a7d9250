//! PTN (Portable Tak Notation) rendering.

use crate::document::GameStateDocument;

/// Value of the `Site` header tag.
pub const SITE: &str = "Racetrack";

/// Render the full PTN for a document: header tags, then one line with every
/// move, opening moves first.
pub fn render(doc: &GameStateDocument) -> String {
    let headers = [
        ("TPS", doc.opening_tps.clone()),
        ("Player1", strip_player_name(&doc.white_player).to_string()),
        ("Player2", strip_player_name(&doc.black_player).to_string()),
        ("Size", doc.size.to_string()),
        ("Site", SITE.to_string()),
        ("Round", doc.round_number.to_string()),
        ("Komi", format_komi(doc.half_komi)),
    ];

    let mut ptn = headers
        .iter()
        .map(|(key, value)| format!("[{} \"{}\"]", key, value))
        .collect::<Vec<_>>()
        .join("\n");
    ptn.push('\n');
    ptn.push_str(&doc.all_moves().collect::<Vec<_>>().join(" "));
    ptn
}

/// Append a single ply to PTN produced by [`render`].
pub fn append_ply(ptn: &mut String, mv: &str) {
    if !ptn.is_empty() && !ptn.ends_with('\n') {
        ptn.push(' ');
    }
    ptn.push_str(mv);
}

/// Strip a path-like prefix: everything up to and including the last `/` or `\`.
pub fn strip_player_name(name: &str) -> &str {
    match name.rfind(|c: char| c == '/' || c == '\\') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Komi from half-komi units: `4` -> `2`, `5` -> `2.5`.
pub fn format_komi(half_komi: i32) -> String {
    format!("{}", f64::from(half_komi) / 2.0)
}
