use chrono::{NaiveDateTime, ParseError, Timelike};

/// Renders a clip timestamp for display, e.g. `Jan 05 2023, 2:30 PM`.
///
/// The input is a date-time string without a timezone suffix and is
/// interpreted as UTC. Both the `T` and space separators are accepted, as is
/// an optional trailing `Z`. Malformed input surfaces chrono's parse error
/// unchanged.
pub fn format_clip_timestamp(raw: &str) -> Result<String, ParseError> {
    let timestamp = parse_utc_naive(raw)?;

    let hour = timestamp.hour();
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let clock_hour = match hour % 12 {
        0 => 12,
        other => other,
    };

    Ok(format!(
        "{}, {}:{:02} {}",
        timestamp.format("%b %d %Y"),
        clock_hour,
        timestamp.minute(),
        meridiem
    ))
}

fn parse_utc_naive(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    match NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(value) => Ok(value),
        Err(_) => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"),
    }
}
