//! Text rendering for the two analytics views

use super::usage_tracker::SessionAnalytics;
use super::windows::{totals, WindowStats};
use crate::features::lifecycle::ModuleWindow;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Label shown next to an exported file link
pub fn friendly_export_label(file_name: &str) -> &'static str {
    if file_name.ends_with("-prompts.json") {
        "Your prompts"
    } else if file_name.ends_with("-answers.md") {
        "Answers received"
    } else if file_name.ends_with(".json") {
        "Memory collected"
    } else {
        "Exported file"
    }
}

/// `show analytics`: persisted counters plus this session's module windows
///
/// `sizes` maps artifact names to their stored size in bytes; files missing
/// from the map are listed without a size.
pub fn format_usage(
    analytics: &SessionAnalytics,
    sizes: &HashMap<String, usize>,
    base_url: &str,
    windows: &[ModuleWindow],
) -> String {
    let mut out = format!(
        "📊 Analytics for this session:\n- User prompts: {}\n- Bot answers: {}\n- Export counts:\n",
        analytics.prompts, analytics.answers
    );

    if analytics.exports.is_empty() {
        out.push_str("  - None\n");
    }
    for (kind, count) in &analytics.exports {
        out.push_str(&format!("  - {kind}: {count}\n"));
    }

    out.push_str("- Exported files:\n");
    if analytics.files.is_empty() {
        out.push_str("  • None\n");
    }
    for file in &analytics.files {
        let size = sizes
            .get(&file.name)
            .map(|bytes| format!(" ({:.2} KB)", *bytes as f64 / 1024.0))
            .unwrap_or_default();
        out.push_str(&format!(
            "  🔗 {}: {base_url}/download/{}{size}\n",
            friendly_export_label(&file.name),
            file.name
        ));
    }

    if !windows.is_empty() {
        out.push_str("\n=== Integration Module Usage ===\n");
        for window in windows {
            let end = match &window.closed_at {
                Some(closed) => format!("closed at {}", timestamp(closed)),
                None => "still active".to_string(),
            };
            out.push_str(&format!(
                "- {}: initiated at {}, {end}\n",
                window.module_name,
                timestamp(&window.init_time)
            ));
        }
    }

    out.trim_end().to_string()
}

/// `!kazbot show session analytics`: one block per window plus totals
pub fn format_session_analytics(stats: &[WindowStats]) -> String {
    if stats.is_empty() {
        return "ℹ️ No integration module has been initialized in this session yet.".to_string();
    }

    let mut out = String::from("📊 Session analytics while integration modules were active:\n");
    for (i, s) in stats.iter().enumerate() {
        let end = match &s.closed_at {
            Some(closed) => format!("closed at {}", timestamp(closed)),
            None => "still active".to_string(),
        };
        out.push_str(&format!(
            "\n{}. {} (initiated at {}, {end})\n   - Messages: {}\n   - User prompts: {}\n   - Bot answers: {}\n",
            i + 1,
            s.module_name,
            timestamp(&s.init_time),
            s.total,
            s.prompts,
            s.answers
        ));
    }

    let sum = totals(stats);
    out.push_str(&format!(
        "\nTotals: {} messages, {} prompts, {} answers",
        sum.total, sum.prompts, sum.answers
    ));
    out
}
