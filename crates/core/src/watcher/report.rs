//! Notification texts.

use crate::job::display_label;
use crate::messenger::escape_html;
use crate::remote::TorrentStatus;

/// One consolidated progress message for every entry of a job.
pub fn progress_message(tag: &str, statuses: &[TorrentStatus]) -> String {
    let lines: Vec<String> = statuses
        .iter()
        .map(|s| {
            format!(
                "{}: {:.1}% ({} B/s)",
                escape_html(&s.name),
                s.percent(),
                s.download_rate
            )
        })
        .collect();

    format!("🔁 Progress {}\n{}", display_label(tag), lines.join("\n"))
}

/// Completion message naming the finished entries.
pub fn finished_message(tag: &str, finished: &[&TorrentStatus]) -> String {
    let names: Vec<String> = finished.iter().map(|s| escape_html(&s.name)).collect();
    format!("🟢 Finished {}\n{}", display_label(tag), names.join(", "))
}
