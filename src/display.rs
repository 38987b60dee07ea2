//! Text formatting shared by the dashboard panels.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

// ---

/// Timestamp layout used for history rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of the header clock, e.g. `Sat, Oct 17, 2026, 03:04 PM`.
pub const CLOCK_FORMAT: &str = "%a, %b %-d, %Y, %I:%M %p";

/// Layout of chart x-axis labels, e.g. `3:04:05 PM`.
pub const TIME_LABEL_FORMAT: &str = "%-I:%M:%S %p";

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_timestamp<Tz>(t: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    t.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_clock<Tz>(t: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    t.format(CLOCK_FORMAT).to_string()
}

pub fn time_label<Tz>(t: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    t.format(TIME_LABEL_FORMAT).to_string()
}

/// Parse a history timestamp back into a sortable value.
///
/// Accepts the history layout and RFC 3339 (rows written by older builds).
/// Both come back as local wall-clock time so mixed rows sort together.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    // ---
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| t.with_timezone(&Local).naive_local())
        })
}

/// Format a number with en-US digit grouping and at most three decimals,
/// e.g. `121405.8` → `121,405.8`.
pub fn format_grouped(value: f64) -> String {
    // ---
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(char::from(*d));
    }

    let negative = value < 0.0 && (grouped != "0" || !frac_part.is_empty());
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}
