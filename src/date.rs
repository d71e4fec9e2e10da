//! # Date Normalizer
//!
//! Site dates come in several shapes (`2023.5.1 09:00`, `2023/05/01 21:07`,
//! `20230501`, ...). They are parsed as wall-clock times and rendered as
//! `YYYY-MM-DDTHH:MM:SS+08:00`. The offset is a fixed display convention of
//! the persisted stores, not the real timezone of the post, and must not be
//! replaced with the host offset.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

/// Offset suffix appended to every canonical timestamp
pub const FIXED_OFFSET: &str = "+08:00";

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Date layouts used by the supported sites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `yyyy.M.d HH:mm`
    DotMinute,
    /// `yyyy/M/d`
    SlashDate,
    /// `yyyy/MM/dd HH:mm:ss`
    SlashSeconds,
    /// `yyyy.MM.dd`
    DotDate,
    /// `yyyy/MM/dd HH:mm`
    SlashMinute,
    /// `yyyyMMdd`, parsed as a literal date with no timezone inference
    Compact,
}

/// Parse a site date and render it as a canonical timestamp.
///
/// With `japan_time` set, one hour is subtracted after parsing. Returns
/// `None` (and logs) when the text cannot be parsed.
pub fn normalize(text: &str, format: DateFormat, japan_time: bool) -> Option<String> {
    let Some(parsed) = parse_naive(text, format) else {
        warn!("Unable to convert '{}' with format {:?}", text, format);
        return None;
    };
    let adjusted = if japan_time {
        parsed - Duration::hours(1)
    } else {
        parsed
    };
    Some(render(adjusted))
}

/// Render a wall-clock time with the fixed offset suffix
pub fn render(value: NaiveDateTime) -> String {
    format!("{}{}", value.format(CANONICAL_FORMAT), FIXED_OFFSET)
}

/// Parse a site date without any hour correction
pub fn parse_naive(text: &str, format: DateFormat) -> Option<NaiveDateTime> {
    let text = text.trim();
    if format == DateFormat::Compact && text.len() == 8 {
        return parse_compact(text);
    }
    parse_generic(text)
}

/// Parse a canonical timestamp back to its wall-clock value.
///
/// The offset is ignored on purpose, so `2023-05-01T09:00:00+08:00` yields
/// `2023-05-01 09:00:00`.
pub fn parse_canonical(text: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.naive_local())
        .or_else(|| parse_generic(text))
}

fn parse_compact(text: &str) -> Option<NaiveDateTime> {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn parse_generic(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    let normalized = text.replace('.', "/");
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(dt);
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(&normalized, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}
