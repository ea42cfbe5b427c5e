use chrono::{DateTime, Utc};

/// Date/time rendering helper for templates.
///
/// Timestamps are emitted as UTC inside a `moment` span; the browser-side
/// script localizes them. The text content is a readable UTC fallback.
#[derive(Debug, Clone, Default)]
pub struct Moment;

impl Moment {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, timestamp: DateTime<Utc>, format: &str) -> String {
        self.render(timestamp, "format", Some(format))
    }

    pub fn from_now(&self, timestamp: DateTime<Utc>) -> String {
        self.render(timestamp, "fromNow", None)
    }

    fn render(&self, timestamp: DateTime<Utc>, function: &str, format: Option<&str>) -> String {
        let format_attr = format
            .map(|f| format!(" data-format=\"{}\"", escape_attr(f)))
            .unwrap_or_default();

        format!(
            "<span class=\"moment\" data-timestamp=\"{}\" data-function=\"{}\"{}>{}</span>",
            timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
            function,
            format_attr,
            timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_renders_timestamp_and_format() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let html = Moment::new().format(ts, "LLL");

        assert!(html.contains("data-timestamp=\"2026-10-18T09:30:00Z\""));
        assert!(html.contains("data-function=\"format\""));
        assert!(html.contains("data-format=\"LLL\""));
        assert!(html.contains(">2026-10-18 09:30:00 UTC</span>"));
    }

    #[test]
    fn test_from_now_has_no_format() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let html = Moment::new().from_now(ts);

        assert!(html.contains("data-function=\"fromNow\""));
        assert!(!html.contains("data-format"));
    }
}
