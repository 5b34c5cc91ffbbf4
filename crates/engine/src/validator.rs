use std::collections::HashSet;

use chrono::Weekday;
use serde::Serialize;

use crate::config::ShopConfig;
use crate::model::ScheduleConfig;
use crate::schedule::{parse_weekday, weekday_key};
use crate::timefmt;

// ---------------------------------------------------------------------------
// Validation result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validate implementation
// ---------------------------------------------------------------------------

/// Check a barber schedule for entries the resolver would silently ignore or
/// misread. Errors mean part of the schedule cannot take effect; warnings
/// are advisory.
pub fn validate_schedule(schedule: &ScheduleConfig, shop: &ShopConfig) -> ValidationResult {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    // -----------------------------------------------------------------------
    // Working days
    // -----------------------------------------------------------------------
    let mut seen_days: HashSet<Weekday> = HashSet::new();
    for (name, day) in &schedule.working_days {
        let Some(weekday) = parse_weekday(name) else {
            errors.push(format!(
                "Unknown weekday '{}' -- use an English or Spanish day name",
                name
            ));
            continue;
        };
        if !seen_days.insert(weekday) {
            errors.push(format!(
                "Weekday '{}' is configured more than once -- only the first entry is used",
                weekday_key(weekday)
            ));
        }

        let window = shop.window_for(weekday).bounds().ok();
        for hour in &day.explicit_hours {
            match timefmt::clock_minutes(hour) {
                Err(_) => errors.push(format!(
                    "Explicit hour '{}' on {} is not a valid HH:MM time",
                    hour, name
                )),
                Ok(minute) => {
                    let canonical = timefmt::format_minutes(minute);
                    if &canonical != hour {
                        warnings.push(format!(
                            "Explicit hour '{}' on {} will never match -- write it as '{}'",
                            hour, name, canonical
                        ));
                    }
                    if let Some((first, last)) = window {
                        if minute < first || minute > last {
                            warnings.push(format!(
                                "Explicit hour '{}' on {} is outside barbershop hours",
                                hour, name
                            ));
                        } else if (minute - first) % shop.cadence() != 0 {
                            warnings.push(format!(
                                "Explicit hour '{}' on {} is not on the {}-minute slot grid -- it can never be booked",
                                hour, name, shop.cadence()
                            ));
                        }
                    }
                }
            }
        }

        if !day.active && !day.explicit_hours.is_empty() {
            warnings.push(format!(
                "{} lists explicit hours but is not active -- the hours are ignored",
                name
            ));
        }
    }

    if !schedule.working_days.values().any(|d| d.active) {
        warnings.push("No active working day -- this barber can never be booked".to_string());
    }

    // -----------------------------------------------------------------------
    // Lunch break
    // -----------------------------------------------------------------------
    if let Some(lunch) = &schedule.lunch_break {
        let start = timefmt::clock_minutes(&lunch.start);
        let end = timefmt::clock_minutes(&lunch.end);
        if start.is_err() {
            errors.push(format!("Lunch start '{}' is not a valid HH:MM time", lunch.start));
        }
        if end.is_err() {
            errors.push(format!("Lunch end '{}' is not a valid HH:MM time", lunch.end));
        }
        if let (Ok(s), Ok(e)) = (start, end) {
            if s >= e {
                errors.push(format!(
                    "Lunch break {}-{} ends before it starts -- it would block nothing",
                    lunch.start, lunch.end
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Exceptions
    // -----------------------------------------------------------------------
    let mut seen_dates = HashSet::new();
    for exception in &schedule.exceptions {
        if !seen_dates.insert(exception.date) {
            warnings.push(format!(
                "Exception date {} appears more than once -- any inactive entry closes the day",
                exception.date
            ));
        }
    }

    ValidationResult { errors, warnings }
}
