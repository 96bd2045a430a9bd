//! Relative time filters such as `30m`, `2d` or `1h30m`.

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};

/// Parses a relative duration made of one or more `<n><unit>` groups, where
/// unit is one of `s`, `m`, `h`, `d` or `w`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput("empty relative time".to_string()));
    }

    let invalid = || {
        Error::InvalidInput(format!(
            "invalid relative time {raw:?} (expected e.g. 30s, 15m, 2h, 3d, 1w or 1h30m)"
        ))
    };

    let mut total = Duration::zero();
    let mut digits = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(invalid());
        }
        let n: i64 = digits.parse().map_err(|_| invalid())?;
        let unit = match c {
            's' => Duration::try_seconds(n),
            'm' => Duration::try_minutes(n),
            'h' => Duration::try_hours(n),
            'd' => Duration::try_days(n),
            'w' => Duration::try_weeks(n),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "unsupported relative time suffix {c:?} (expected s/m/h/d/w)"
                )))
            }
        };
        total = unit
            .and_then(|d| total.checked_add(&d))
            .ok_or_else(invalid)?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(total)
}

/// The instant `input` before `now`.
pub fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let duration = parse_duration(input)?;
    now.checked_sub_signed(duration)
        .ok_or_else(|| Error::InvalidInput(format!("relative time {input:?} is out of range")))
}
