//! Unified diff rendering for dry runs.

use similar::{Algorithm, TextDiff};

/// Unified diff between the contents read for `file_name` and the patched
/// contents. Empty when nothing changed.
///
/// Patience keeps method and block boundaries intact in the hunks.
pub fn unified_diff(file_name: &str, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Patience)
        .diff_lines(old, new);

    diff.unified_diff()
        .context_radius(2)
        .header(&format!("a/{file_name}"), &format!("b/{file_name}"))
        .to_string()
}
