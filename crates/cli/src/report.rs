//! Human-readable and JSON renderings of a run's history.

use engine::History;

/// One numbered line per history entry:
/// `1) LaunchedUpdate: update of 'C' launched`.
pub fn render_text(history: &History) -> String {
    history
        .records()
        .enumerate()
        .map(|(i, record)| format!("\t{}) {}: {}\n", i + 1, record.name(), record))
        .collect()
}

pub fn render_json(history: &History) -> serde_json::Result<String> {
    serde_json::to_string_pretty(history)
}
