//! Time-of-day and duration arithmetic.
//!
//! Everything inside the crate speaks "HH:MM" strings. This module owns the
//! parsing of those strings, the 12-hour display form, the service-duration
//! normalization, and the decimal-hour values the backend sends
//! (`14.5` == "14:30").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::NominalDuration;

/// Minutes assumed for a service whose duration is missing or unparsable.
/// Callers can tell this happened from [`DurationSource::Defaulted`].
pub const DEFAULT_DURATION_MINS: u32 = 60;

const MINUTES_PER_DAY: u32 = 24 * 60;

static CLOCK_24: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)(?::([0-5]\d))?$").unwrap());

static CLOCK_12: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(1[0-2]|0?[1-9]):([0-5]\d)\s?([AP])M$").unwrap());

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    #[error("'{0}' is not a valid HH:MM time")]
    InvalidClock(String),
    #[error("'{0}' is neither HH:MM nor h:MM AM/PM")]
    UnrecognizedFormat(String),
    #[error("{0} is not a valid decimal hour")]
    InvalidDecimalHour(f64),
}

// ---------------------------------------------------------------------------
// Clock strings
// ---------------------------------------------------------------------------

/// Minute of the day for "HH:MM" or "HH:MM:SS". Seconds are dropped.
pub fn clock_minutes(s: &str) -> Result<u32, TimeError> {
    let caps = CLOCK_24
        .captures(s.trim())
        .ok_or_else(|| TimeError::InvalidClock(s.to_string()))?;
    let hours: u32 = caps[1].parse().map_err(|_| TimeError::InvalidClock(s.to_string()))?;
    let minutes: u32 = caps[2].parse().map_err(|_| TimeError::InvalidClock(s.to_string()))?;
    Ok(hours * 60 + minutes)
}

/// Render a minute of the day as "HH:MM", wrapping past midnight.
pub fn format_minutes(minute_of_day: u32) -> String {
    let m = minute_of_day % MINUTES_PER_DAY;
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// Canonical "HH:MM" form of a 24-hour clock string.
pub fn normalize_clock(s: &str) -> Result<String, TimeError> {
    clock_minutes(s).map(format_minutes)
}

/// "HH:MM:SS" form used by the create-appointment payload.
pub fn with_seconds(s: &str) -> Result<String, TimeError> {
    clock_minutes(s).map(|m| format!("{}:00", format_minutes(m)))
}

/// `start + minutes`, wrapping the hour modulo 24. Appointments never span
/// two days, so the wrap is all the overflow handling there is.
pub fn add_minutes(start: &str, minutes: u32) -> Result<String, TimeError> {
    let start = clock_minutes(start)?;
    Ok(format_minutes((start + minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY))
}

/// "HH:MM" -> "h:MM AM/PM".
pub fn to_12_hour(time: &str) -> Result<String, TimeError> {
    let total = clock_minutes(time)?;
    let (hours, minutes) = (total / 60, total % 60);
    let suffix = if hours < 12 { "AM" } else { "PM" };
    let display_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    Ok(format!("{}:{:02} {}", display_hour, minutes, suffix))
}

/// "HH:MM" or "h:MM AM/PM" -> "HH:MM". Anything else is rejected.
pub fn to_24_hour(time: &str) -> Result<String, TimeError> {
    let trimmed = time.trim();

    if let Some(caps) = CLOCK_12.captures(trimmed) {
        let hour: u32 = caps[1]
            .parse()
            .map_err(|_| TimeError::UnrecognizedFormat(time.to_string()))?;
        let minutes: u32 = caps[2]
            .parse()
            .map_err(|_| TimeError::UnrecognizedFormat(time.to_string()))?;
        let pm = caps[3].eq_ignore_ascii_case("p");
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        return Ok(format_minutes(hour24 * 60 + minutes));
    }

    match CLOCK_24.captures(trimmed) {
        // Seconds are not part of either accepted display form.
        Some(caps) if caps.get(3).is_none() => normalize_clock(trimmed),
        _ => Err(TimeError::UnrecognizedFormat(time.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Service durations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationSource {
    Parsed,
    /// The input was absent or unparsable; [`DEFAULT_DURATION_MINS`] was used.
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDuration {
    pub minutes: u32,
    pub source: DurationSource,
}

impl ResolvedDuration {
    fn parsed(minutes: u32) -> Self {
        ResolvedDuration {
            minutes,
            source: DurationSource::Parsed,
        }
    }

    fn defaulted() -> Self {
        ResolvedDuration {
            minutes: DEFAULT_DURATION_MINS,
            source: DurationSource::Defaulted,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        self.source == DurationSource::Defaulted
    }
}

/// Parse "HH:MM:SS", "HH:MM" (first two fields are hours and minutes) or a
/// bare minute count.
pub fn parse_duration(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.contains(':') {
        let mut fields = s.split(':');
        let hours: u32 = fields.next()?.trim().parse().ok()?;
        let minutes: u32 = fields.next()?.trim().parse().ok()?;
        return hours.checked_mul(60)?.checked_add(minutes);
    }
    s.parse().ok()
}

/// Normalize a service's nominal duration to minutes, falling back to
/// [`DEFAULT_DURATION_MINS`] when it is missing or unparsable.
pub fn to_minutes(nominal: Option<&NominalDuration>) -> ResolvedDuration {
    let parsed = match nominal {
        Some(NominalDuration::Minutes(m)) => Some(*m),
        Some(NominalDuration::Text(s)) => parse_duration(s),
        None => None,
    };
    match parsed {
        Some(minutes) => ResolvedDuration::parsed(minutes),
        None => {
            tracing::warn!(
                ?nominal,
                default_mins = DEFAULT_DURATION_MINS,
                "service duration missing or unparsable; using default"
            );
            ResolvedDuration::defaulted()
        }
    }
}

/// Display-only duration, truncated to whole hours and minutes ("HH:MM").
/// Never feed this back into end-time arithmetic.
pub fn rounded_duration(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The duration exactly as the service declares it, as "HH:MM:SS".
pub fn actual_duration(nominal: Option<&NominalDuration>, resolved: ResolvedDuration) -> String {
    if let Some(NominalDuration::Text(s)) = nominal {
        let fields: Vec<&str> = s.trim().split(':').collect();
        if fields.len() == 3 && fields.iter().all(|f| f.parse::<u32>().is_ok()) {
            return s.trim().to_string();
        }
    }
    format!("{}:00", rounded_duration(resolved.minutes))
}

// ---------------------------------------------------------------------------
// Decimal hours (backend boundary)
// ---------------------------------------------------------------------------

/// `14.5` -> "14:30". Rounds to the nearest minute. Values outside
/// `[0, 24)` are rejected rather than wrapped.
pub fn from_decimal_hours(value: f64) -> Result<String, TimeError> {
    if !value.is_finite() || !(0.0..24.0).contains(&value) {
        return Err(TimeError::InvalidDecimalHour(value));
    }
    let total = (value * 60.0).round() as u32;
    if total >= MINUTES_PER_DAY {
        return Err(TimeError::InvalidDecimalHour(value));
    }
    Ok(format_minutes(total))
}

/// Like [`from_decimal_hours`], but also accepts `24.0`: a range ending at
/// midnight. It becomes "00:00", the same wrap [`add_minutes`] applies.
pub fn from_decimal_end_hours(value: f64) -> Result<String, TimeError> {
    if value == 24.0 {
        return Ok(format_minutes(0));
    }
    from_decimal_hours(value)
}

/// "14:30" -> `14.5`.
pub fn to_decimal_hours(time: &str) -> Result<f64, TimeError> {
    clock_minutes(time).map(|m| f64::from(m) / 60.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
