use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::ShopConfig;
use crate::model::{Appointment, AppointmentStatus, Barber, Slot};
use crate::slots;
use crate::timefmt::{self, TimeError};

// ---------------------------------------------------------------------------
// Verdict types
// ---------------------------------------------------------------------------

/// Why a slot cannot be booked. Variants are listed in the order the
/// filters run; the first failing filter wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UnavailableReason {
    /// An inactive exception closes the whole date.
    ExceptionDay,
    /// The barber does not work this weekday.
    NotWorkingDay,
    /// The start time is not a slot of the shop's operating window.
    OutsideOperatingHours,
    /// The weekday lists explicit hours and this is not one of them.
    NotInExplicitHours,
    LunchBreak,
    /// A non-cancelled appointment already holds this barber/date/time.
    AlreadyBooked,
    /// The slot starts before the current time.
    SlotInPast,
}

impl UnavailableReason {
    /// Message for the booking screens.
    pub fn message(self) -> &'static str {
        match self {
            UnavailableReason::ExceptionDay => "Barber is not available on this date",
            UnavailableReason::NotWorkingDay => "Barber does not work on this day",
            UnavailableReason::OutsideOperatingHours => "Outside barbershop hours",
            UnavailableReason::NotInExplicitHours => "Barber is not available at this hour",
            UnavailableReason::LunchBreak => "Lunch break",
            UnavailableReason::AlreadyBooked => "This time is already booked",
            UnavailableReason::SlotInPast => "This time has already passed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(UnavailableReason),
}

impl Availability {
    pub fn is_available(self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(self) -> Option<UnavailableReason> {
        match self {
            Availability::Available => None,
            Availability::Unavailable(r) => Some(r),
        }
    }
}

/// A generated slot annotated with the barber's availability for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    #[serde(flatten)]
    pub slot: Slot,
    pub available: bool,
    pub reason: Option<UnavailableReason>,
}

// ---------------------------------------------------------------------------
// Conflict check
// ---------------------------------------------------------------------------

/// True when a non-cancelled appointment already occupies
/// `(barber_id, date, start_time)`. Times are compared in "HH:MM" form, so
/// "15:00:00" from the backend matches a "15:00" slot.
pub fn has_conflict(
    barber_id: u64,
    date: NaiveDate,
    start_time: &str,
    appointments: &[Appointment],
) -> bool {
    let wanted = canonical(start_time);
    appointments.iter().any(|a| {
        a.barber_id == barber_id
            && a.date == date
            && a.status != AppointmentStatus::Cancelled
            && canonical(&a.start_time) == wanted
    })
}

fn canonical(time: &str) -> String {
    timefmt::normalize_clock(time).unwrap_or_else(|_| time.trim().to_string())
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Day-level filters only: exception dates and working days.
pub fn check_day(barber: &Barber, date: NaiveDate) -> Availability {
    let schedule = &barber.schedule;
    if schedule.is_exception_day(date) {
        return Availability::Unavailable(UnavailableReason::ExceptionDay);
    }
    if !schedule.is_working_day(date.weekday()) {
        return Availability::Unavailable(UnavailableReason::NotWorkingDay);
    }
    Availability::Available
}

/// Decide whether `barber` can take `slot_start` on `date`.
///
/// Filters run in a fixed order and the first one that fails names the
/// reason: exception date, working day, operating window, explicit hours,
/// lunch break, existing booking. The clock is not consulted; see
/// [`resolve_at`] for the past-slot check.
pub fn resolve(
    barber: &Barber,
    date: NaiveDate,
    slot_start: &str,
    appointments: &[Appointment],
    shop: &ShopConfig,
) -> Result<Availability, TimeError> {
    let start_minute = timefmt::clock_minutes(slot_start)?;
    let start = timefmt::format_minutes(start_minute);
    let weekday = date.weekday();

    let verdict = if let Availability::Unavailable(r) = check_day(barber, date) {
        Availability::Unavailable(r)
    } else if !slots::is_operating_start(date, start_minute, shop)? {
        Availability::Unavailable(UnavailableReason::OutsideOperatingHours)
    } else if !explicit_hours_allow(barber, weekday, &start) {
        Availability::Unavailable(UnavailableReason::NotInExplicitHours)
    } else if barber
        .schedule
        .lunch_window(&shop.default_lunch)
        .is_some_and(|lunch| lunch.contains(start_minute))
    {
        Availability::Unavailable(UnavailableReason::LunchBreak)
    } else if has_conflict(barber.id, date, &start, appointments) {
        Availability::Unavailable(UnavailableReason::AlreadyBooked)
    } else {
        Availability::Available
    };

    tracing::debug!(barber_id = barber.id, %date, slot = %start, ?verdict, "resolved slot");
    Ok(verdict)
}

/// [`resolve`], plus rejection of slots that started before `now`. The past check runs last so the schedule reasons keep priority.
pub fn resolve_at(
    barber: &Barber,
    date: NaiveDate,
    slot_start: &str,
    appointments: &[Appointment],
    now: NaiveDateTime,
    shop: &ShopConfig,
) -> Result<Availability, TimeError> {
    let verdict = resolve(barber, date, slot_start, appointments, shop)?;
    if verdict.is_available() && is_past(date, slot_start, now)? {
        return Ok(Availability::Unavailable(UnavailableReason::SlotInPast));
    }
    Ok(verdict)
}

/// Boolean form of [`resolve`]. A malformed start time is never available.
pub fn is_available(
    barber: &Barber,
    date: NaiveDate,
    slot_start: &str,
    appointments: &[Appointment],
    shop: &ShopConfig,
) -> bool {
    resolve(barber, date, slot_start, appointments, shop)
        .map(Availability::is_available)
        .unwrap_or(false)
}

fn explicit_hours_allow(barber: &Barber, weekday: chrono::Weekday, start: &str) -> bool {
    let hours = barber.schedule.explicit_hours_for(weekday);
    hours.is_empty() || hours.iter().any(|h| h == start)
}

fn is_past(date: NaiveDate, slot_start: &str, now: NaiveDateTime) -> Result<bool, TimeError> {
    if date < now.date() {
        return Ok(true);
    }
    if date > now.date() {
        return Ok(false);
    }
    let start = timefmt::clock_minutes(slot_start)?;
    Ok(start < now.hour() * 60 + now.minute())
}

// ---------------------------------------------------------------------------
// Day views
// ---------------------------------------------------------------------------

/// Every remaining slot of the day with the barber's verdict on it.
pub fn agenda_for(
    barber: &Barber,
    date: NaiveDate,
    appointments: &[Appointment],
    now: NaiveDateTime,
    shop: &ShopConfig,
) -> Result<Vec<SlotAvailability>, TimeError> {
    slots::generate_slots(date, now, shop)?
        .into_iter()
        .map(|slot| {
            let verdict = resolve(barber, date, &slot.start_time, appointments, shop)?;
            Ok(SlotAvailability {
                slot,
                available: verdict.is_available(),
                reason: verdict.reason(),
            })
        })
        .collect()
}

/// Whether the barber shows as "Available" for the whole day: the day-level
/// filters pass and at least one remaining slot is still bookable.
pub fn day_available(
    barber: &Barber,
    date: NaiveDate,
    appointments: &[Appointment],
    now: NaiveDateTime,
    shop: &ShopConfig,
) -> Result<bool, TimeError> {
    if !check_day(barber, date).is_available() {
        return Ok(false);
    }
    for slot in slots::generate_slots(date, now, shop)? {
        if resolve(barber, date, &slot.start_time, appointments, shop)?.is_available() {
            return Ok(true);
        }
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LunchBreak, ScheduleConfig, ScheduleException, WorkingDay};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Monday
    fn booking_day() -> NaiveDate {
        date(2025, 6, 2)
    }

    fn make_barber(days: &[(&str, bool, &[&str])]) -> Barber {
        let working_days: BTreeMap<String, WorkingDay> = days
            .iter()
            .map(|(name, active, hours)| {
                (
                    name.to_string(),
                    WorkingDay {
                        active: *active,
                        explicit_hours: hours.iter().map(|h| h.to_string()).collect(),
                    },
                )
            })
            .collect();
        Barber {
            id: 1,
            name: "Carlos".to_string(),
            schedule: ScheduleConfig {
                working_days,
                lunch_break: None,
                exceptions: vec![],
            },
        }
    }

    fn make_appointment(
        barber_id: u64,
        d: NaiveDate,
        start: &str,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: Some(7),
            barber_id,
            service_id: Some(3),
            client: None,
            date: d,
            start_time: start.to_string(),
            end_time: timefmt::add_minutes(start, 30).unwrap(),
            duration_actual: None,
            duration_rounded: None,
            location: None,
            status,
        }
    }

    fn monday_barber() -> Barber {
        make_barber(&[("monday", true, &[])])
    }

    fn verdict(barber: &Barber, start: &str, appts: &[Appointment]) -> Availability {
        resolve(barber, booking_day(), start, appts, &ShopConfig::default()).unwrap()
    }

    #[test]
    fn test_monday_scenario() {
        let barber = monday_barber();
        assert_eq!(
            verdict(&barber, "13:30", &[]),
            Availability::Unavailable(UnavailableReason::LunchBreak)
        );
        assert_eq!(
            verdict(&barber, "10:00", &[]),
            Availability::Unavailable(UnavailableReason::OutsideOperatingHours)
        );
        assert_eq!(verdict(&barber, "11:00", &[]), Availability::Available);
    }

    #[test]
    fn test_lunch_is_half_open() {
        let barber = monday_barber();
        assert!(!verdict(&barber, "13:00", &[]).is_available());
        assert!(verdict(&barber, "14:00", &[]).is_available());
        assert!(verdict(&barber, "12:30", &[]).is_available());
    }

    #[test]
    fn test_inactive_lunch_does_not_block() {
        let mut barber = monday_barber();
        barber.schedule.lunch_break = Some(LunchBreak {
            active: false,
            ..LunchBreak::default()
        });
        assert!(verdict(&barber, "13:30", &[]).is_available());
    }

    #[test]
    fn test_exception_beats_everything() {
        let mut barber = monday_barber();
        barber.schedule.exceptions.push(ScheduleException {
            date: booking_day(),
            active: false,
        });
        let shop = ShopConfig::default();
        for slot in slots::operating_slots(booking_day(), &shop).unwrap() {
            assert_eq!(
                verdict(&barber, &slot.start_time, &[]),
                Availability::Unavailable(UnavailableReason::ExceptionDay)
            );
        }
        // An active exception entry does not close the day.
        barber.schedule.exceptions[0].active = true;
        assert!(verdict(&barber, "11:00", &[]).is_available());
    }

    #[test]
    fn test_day_off_and_missing_day() {
        let barber = make_barber(&[("monday", false, &[])]);
        assert_eq!(
            verdict(&barber, "11:00", &[]),
            Availability::Unavailable(UnavailableReason::NotWorkingDay)
        );
        let barber = make_barber(&[("tuesday", true, &[])]);
        assert_eq!(
            verdict(&barber, "11:00", &[]),
            Availability::Unavailable(UnavailableReason::NotWorkingDay)
        );
    }

    #[test]
    fn test_explicit_hours() {
        let barber = make_barber(&[("lunes", true, &["11:00", "15:30"])]);
        assert!(verdict(&barber, "15:30", &[]).is_available());
        assert_eq!(
            verdict(&barber, "16:00", &[]),
            Availability::Unavailable(UnavailableReason::NotInExplicitHours)
        );
        // Explicit hours run before the lunch filter.
        assert_eq!(
            verdict(&barber, "13:30", &[]),
            Availability::Unavailable(UnavailableReason::NotInExplicitHours)
        );
    }

    #[test]
    fn test_conflicts_ignore_cancelled_and_other_barbers() {
        let barber = monday_barber();
        let d = booking_day();

        let booked = [make_appointment(1, d, "15:00:00", AppointmentStatus::Pending)];
        assert_eq!(
            verdict(&barber, "15:00", &booked),
            Availability::Unavailable(UnavailableReason::AlreadyBooked)
        );

        let cancelled = [make_appointment(1, d, "15:00", AppointmentStatus::Cancelled)];
        assert!(verdict(&barber, "15:00", &cancelled).is_available());

        let expired = [make_appointment(1, d, "15:00", AppointmentStatus::Expired)];
        assert!(!verdict(&barber, "15:00", &expired).is_available());

        let other_barber = [make_appointment(2, d, "15:00", AppointmentStatus::Pending)];
        assert!(verdict(&barber, "15:00", &other_barber).is_available());

        let other_day = [make_appointment(1, date(2025, 6, 9), "15:00", AppointmentStatus::Pending)];
        assert!(verdict(&barber, "15:00", &other_day).is_available());
    }

    #[test]
    fn test_malformed_start_time() {
        let barber = monday_barber();
        let shop = ShopConfig::default();
        assert!(resolve(&barber, booking_day(), "3pm", &[], &shop).is_err());
        assert!(!is_available(&barber, booking_day(), "3pm", &[], &shop));
    }

    #[test]
    fn test_past_slot_on_today() {
        let barber = monday_barber();
        let shop = ShopConfig::default();
        let now = booking_day().and_hms_opt(16, 5, 0).unwrap();
        assert_eq!(
            resolve_at(&barber, booking_day(), "16:00", &[], now, &shop).unwrap(),
            Availability::Unavailable(UnavailableReason::SlotInPast)
        );
        assert!(resolve_at(&barber, booking_day(), "16:30", &[], now, &shop)
            .unwrap()
            .is_available());
        // Schedule reasons still win over the clock.
        assert_eq!(
            resolve_at(&barber, booking_day(), "13:00", &[], now, &shop).unwrap(),
            Availability::Unavailable(UnavailableReason::LunchBreak)
        );
    }

    #[test]
    fn test_agenda_marks_each_slot() {
        let barber = monday_barber();
        let shop = ShopConfig::default();
        let now = date(2025, 6, 1).and_hms_opt(9, 0, 0).unwrap();
        let booked = [make_appointment(1, booking_day(), "11:30", AppointmentStatus::Pending)];
        let agenda = agenda_for(&barber, booking_day(), &booked, now, &shop).unwrap();

        assert_eq!(agenda.len(), 21);
        assert!(agenda[0].available);
        assert_eq!(agenda[1].reason, Some(UnavailableReason::AlreadyBooked));
        let lunch: Vec<_> = agenda
            .iter()
            .filter(|s| s.reason == Some(UnavailableReason::LunchBreak))
            .map(|s| s.slot.start_time.as_str())
            .collect();
        assert_eq!(lunch, vec!["13:00", "13:30"]);
    }

    #[test]
    fn test_day_summary() {
        let shop = ShopConfig::default();
        let now = date(2025, 6, 1).and_hms_opt(9, 0, 0).unwrap();
        let barber = make_barber(&[("monday", true, &["11:00"])]);
        assert!(day_available(&barber, booking_day(), &[], now, &shop).unwrap());

        // The only explicit hour is taken: capacity is exhausted.
        let booked = [make_appointment(1, booking_day(), "11:00", AppointmentStatus::Pending)];
        assert!(!day_available(&barber, booking_day(), &booked, now, &shop).unwrap());

        let off = make_barber(&[("tuesday", true, &[])]);
        assert!(!day_available(&off, booking_day(), &[], now, &shop).unwrap());

        // Late on the day itself, nothing remains.
        let late = booking_day().and_hms_opt(21, 15, 0).unwrap();
        assert!(!day_available(&monday_barber(), booking_day(), &[], late, &shop).unwrap());
    }

    #[test]
    fn test_booked_slot_becomes_unavailable() {
        let barber = monday_barber();
        let shop = ShopConfig::default();
        assert!(is_available(&barber, booking_day(), "15:00", &[], &shop));
        let after = [make_appointment(1, booking_day(), "15:00", AppointmentStatus::Pending)];
        assert!(!is_available(&barber, booking_day(), "15:00", &after, &shop));
    }

    proptest! {
        #[test]
        fn lunch_window_blocks_half_open(start_h in 11u32..19, len_slots in 1u32..4) {
            let mut barber = monday_barber();
            let start = format!("{:02}:00", start_h);
            let end = timefmt::add_minutes(&start, len_slots * 30).unwrap();
            barber.schedule.lunch_break = Some(LunchBreak {
                active: true,
                start: start.clone(),
                end: end.clone(),
            });
            let shop = ShopConfig::default();
            for slot in slots::operating_slots(booking_day(), &shop).unwrap() {
                let m = timefmt::clock_minutes(&slot.start_time).unwrap();
                let inside = m >= start_h * 60 && m < start_h * 60 + len_slots * 30;
                let v = verdict(&barber, &slot.start_time, &[]);
                prop_assert_eq!(v == Availability::Unavailable(UnavailableReason::LunchBreak), inside);
            }
            prop_assert!(verdict(&barber, &end, &[]).is_available());
        }

        #[test]
        fn resolve_is_idempotent(slot_idx in 0usize..21) {
            let barber = monday_barber();
            let shop = ShopConfig::default();
            let slots = slots::operating_slots(booking_day(), &shop).unwrap();
            let start = &slots[slot_idx].start_time;
            prop_assert_eq!(verdict(&barber, start, &[]), verdict(&barber, start, &[]));
        }
    }
}
