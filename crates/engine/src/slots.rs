use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::config::ShopConfig;
use crate::model::Slot;
use crate::timefmt::{self, TimeError};

/// Every slot of the shop's operating window for `date`, ignoring the clock.
///
/// Start times run from the window's first slot to its last slot inclusive,
/// at the configured cadence. Barber-agnostic: per-barber availability is
/// decided in `availability`.
pub fn operating_slots(date: NaiveDate, shop: &ShopConfig) -> Result<Vec<Slot>, TimeError> {
    let (first, last) = shop.window_for(date.weekday()).bounds()?;
    let step = shop.cadence();

    let mut slots = Vec::new();
    let mut start = first;
    while start <= last {
        slots.push(make_slot(start, step)?);
        start += step;
    }
    Ok(slots)
}

/// The day's candidate slots as of `now`. On today's date, slots starting
/// strictly before the current minute are dropped.
pub fn generate_slots(
    date: NaiveDate,
    now: NaiveDateTime,
    shop: &ShopConfig,
) -> Result<Vec<Slot>, TimeError> {
    let mut slots = operating_slots(date, shop)?;
    if date == now.date() {
        let current = now.hour() * 60 + now.minute();
        slots.retain(|s| {
            timefmt::clock_minutes(&s.start_time)
                .map(|start| start >= current)
                .unwrap_or(false)
        });
    }
    tracing::debug!(%date, count = slots.len(), "generated slots");
    Ok(slots)
}

/// [`generate_slots`] against the local wall clock.
pub fn generate_slots_now(date: NaiveDate, shop: &ShopConfig) -> Result<Vec<Slot>, TimeError> {
    generate_slots(date, Local::now().naive_local(), shop)
}

/// True when `minute_of_day` is a slot start inside the operating window.
pub fn is_operating_start(
    date: NaiveDate,
    minute_of_day: u32,
    shop: &ShopConfig,
) -> Result<bool, TimeError> {
    let (first, last) = shop.window_for(date.weekday()).bounds()?;
    Ok(minute_of_day >= first
        && minute_of_day <= last
        && (minute_of_day - first) % shop.cadence() == 0)
}

fn make_slot(start: u32, span: u32) -> Result<Slot, TimeError> {
    let start_time = timefmt::format_minutes(start);
    let end_time = timefmt::add_minutes(&start_time, span)?;
    let display_label = format!(
        "{} - {}",
        timefmt::to_12_hour(&start_time)?,
        timefmt::to_12_hour(&end_time)?
    );
    Ok(Slot {
        start_time,
        end_time,
        display_label,
    })
}
