use std::time::Duration;

/// Compact human-readable span, e.g. `"15m"`, `"7m30s"`, `"1h"`, `"45s"`.
pub fn format_span(span: Duration) -> String {
    let total = span.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{s}s"));
    }
    out
}
