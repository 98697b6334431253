use crate::{LogLine, Severity};

// Marker glyphs are a convention of the automation script's output, not a
// protocol; only the four-way split matters.
const SUCCESS_MARKERS: &[&str] = &["✅", "🎉"];
const ERROR_MARKERS: &[&str] = &["❌", "⚠"];
const WARNING_MARKERS: &[&str] = &["🔍", "📝"];

/// Classifies a free-text log line by its markers. First match wins.
pub fn classify_line(line: &str) -> Severity {
    let has_any = |markers: &[&str]| markers.iter().any(|m| line.contains(m));
    if has_any(SUCCESS_MARKERS) {
        Severity::Success
    } else if has_any(ERROR_MARKERS) {
        Severity::Error
    } else if has_any(WARNING_MARKERS) {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Severity for a server log line: the explicit level if the server sent one,
/// otherwise marker sniffing.
pub fn severity_for_line(line: &LogLine) -> Severity {
    line.severity.unwrap_or_else(|| classify_line(&line.message))
}
