use chrono::{NaiveDate, Weekday};

use crate::model::{LunchBreak, ScheduleConfig, ScheduleException, WorkingDay};
use crate::timefmt;

/// Resolve a weekday key as stored in `workingDays`. English and Spanish
/// names are accepted, case-insensitively, with or without accents.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let key = name.trim().to_lowercase();
    let weekday = match key.as_str() {
        "monday" | "mon" | "lunes" => Weekday::Mon,
        "tuesday" | "tue" | "martes" => Weekday::Tue,
        "wednesday" | "wed" | "miercoles" | "miércoles" => Weekday::Wed,
        "thursday" | "thu" | "jueves" => Weekday::Thu,
        "friday" | "fri" | "viernes" => Weekday::Fri,
        "saturday" | "sat" | "sabado" | "sábado" => Weekday::Sat,
        "sunday" | "sun" | "domingo" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// Canonical key used when this crate writes a weekday name.
pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Lunch break resolved to minute-of-day bounds, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunchWindow {
    pub start: u32,
    pub end: u32,
}

impl LunchWindow {
    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.start && minute_of_day < self.end
    }
}

impl ScheduleConfig {
    /// The exception entry for `date`, if any.
    pub fn exception_for(&self, date: NaiveDate) -> Option<&ScheduleException> {
        self.exceptions.iter().find(|e| e.date == date)
    }

    /// True when an inactive exception closes `date`.
    pub fn is_exception_day(&self, date: NaiveDate) -> bool {
        self.exceptions.iter().any(|e| e.date == date && !e.active)
    }

    pub fn working_day(&self, weekday: Weekday) -> Option<&WorkingDay> {
        self.working_days
            .iter()
            .find(|(name, _)| parse_weekday(name) == Some(weekday))
            .map(|(_, day)| day)
    }

    /// A weekday without an entry counts as a day off.
    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        self.working_day(weekday).map(|d| d.active).unwrap_or(false)
    }

    /// Explicit start times for `weekday`. Empty means no restriction.
    pub fn explicit_hours_for(&self, weekday: Weekday) -> &[String] {
        self.working_day(weekday)
            .map(|d| d.explicit_hours.as_slice())
            .unwrap_or(&[])
    }

    /// Effective lunch break, or `None` when it is switched off.
    ///
    /// Falls back to `shop_default` when the barber has none configured, and
    /// also when the configured bounds do not parse.
    pub fn lunch_window(&self, shop_default: &LunchBreak) -> Option<LunchWindow> {
        let lunch = self.lunch_break.as_ref().unwrap_or(shop_default);
        if !lunch.active {
            return None;
        }
        match resolve_lunch(lunch) {
            Some(window) => Some(window),
            None => {
                tracing::warn!(
                    start = %lunch.start,
                    end = %lunch.end,
                    "unparsable lunch break; using shop default"
                );
                resolve_lunch(shop_default)
            }
        }
    }
}

fn resolve_lunch(lunch: &LunchBreak) -> Option<LunchWindow> {
    let start = timefmt::clock_minutes(&lunch.start).ok()?;
    let end = timefmt::clock_minutes(&lunch.end).ok()?;
    Some(LunchWindow { start, end })
}
