// Expiry timestamps arrive from the service as `YYYY-MM-DDTHH:MM:SS`,
// sometimes with a fractional-second suffix and no zone (always UTC).
// Formatting is for display only, so anything unparseable is shown as-is.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const WIRE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";
const DISPLAY_LAYOUT: &str = "%Y-%m-%d %H:%M %Z";

/// Parse a service timestamp, ignoring anything after the first `.`.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let base = raw.split_once('.').map_or(raw, |(head, _)| head);
    NaiveDateTime::parse_from_str(base, WIRE_LAYOUT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Render `raw` as e.g. `2024-03-01 10:15 UTC`, or return it unchanged
/// when it does not parse.
pub fn format(raw: &str) -> String {
    match parse(raw) {
        Some(ts) => ts.format(DISPLAY_LAYOUT).to_string(),
        None => raw.to_string(),
    }
}
