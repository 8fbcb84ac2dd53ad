use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// IMF-fixdate, the preferred RFC 7231 format: `Sun, 06 Nov 1994 08:49:37 GMT`.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Obsolete RFC 850 format still seen from old caches:
/// `Sunday, 06-Nov-94 08:49:37 GMT`.
const RFC850: &str = "%A, %d-%b-%y %H:%M:%S GMT";

/// ANSI C asctime format: `Sun Nov  6 08:49:37 1994`.
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Parse an HTTP date header value. A malformed date returns `None`;
/// callers ignore the carrying precondition rather than erroring.
pub fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    for format in [IMF_FIXDATE, RFC850, ASCTIME] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Format a timestamp as IMF-fixdate for response headers. Sub-second
/// precision truncates; HTTP dates carry whole seconds.
pub fn format_http_date(when: DateTime<Utc>) -> String {
    when.format(IMF_FIXDATE).to_string()
}

/// Truncate to whole seconds; comparisons between a stored timestamp
/// and a parsed header value must not differ by sub-second noise.
pub fn truncate_to_seconds(when: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(when.timestamp(), 0)
        .single()
        .unwrap_or(when)
}
