// Stdout line parsing - turns one renderer output line into zero or
// more job updates.
//
// The renderer only emits free-form text, so this stays substring-based
// on purpose; keeping it behind one function means a structured protocol
// can replace it later without touching the state machine.

use crate::domain::JobPatch;

/// Stage keywords in match order. Only the first matching stage fires
/// for a given line.
const STAGES: &[(&[&str], u32, &str)] = &[
    (&["Fetching", "Downloading"], 15, "Fetching map data..."),
    (&["Processing", "Building"], 40, "Processing map data..."),
    (&["Rendering", "Drawing"], 70, "Rendering poster..."),
    (&["Saving", "Writing"], 90, "Saving poster image..."),
];

/// Parse one output line into job updates, in application order.
///
/// A bare `<digits>%` is applied first, then the first matching stage
/// keyword; when both occur on one line the stage's progress value is
/// the last write. Percentages are taken verbatim: no clamping and no
/// monotonicity, the record follows the reporter.
pub fn updates_for_line(line: &str) -> Vec<JobPatch> {
    let mut updates = Vec::new();

    if let Some(percent) = percent_value(line) {
        updates.push(JobPatch::progress(percent));
    }

    for (keywords, progress, message) in STAGES {
        if keywords.iter().any(|keyword| line.contains(keyword)) {
            updates.push(JobPatch::stage(*progress, *message));
            break;
        }
    }

    updates
}

/// First `<digits>%` substring in the line, parsed verbatim.
fn percent_value(line: &str) -> Option<u32> {
    let bytes = line.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'%' {
            let mut start = i;
            while start > 0 && bytes[start - 1].is_ascii_digit() {
                start -= 1;
            }
            if start < i {
                if let Ok(value) = line[start..i].parse::<u32>() {
                    return Some(value);
                }
            }
        }
    }
    None
}
