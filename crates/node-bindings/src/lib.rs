#![deny(clippy::all)]

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use napi_derive::napi;

use barberia_agenda::availability;
use barberia_agenda::config::ShopConfig;
use barberia_agenda::lifecycle;
use barberia_agenda::model as engine;
use barberia_agenda::{slots, timefmt, validator};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[napi(string_enum)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
    Expired,
}

#[napi(string_enum)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusAction {
    Complete,
    Cancel,
    Expire,
}

// ---------------------------------------------------------------------------
// Enum conversions: napi <-> engine
// ---------------------------------------------------------------------------

impl From<AppointmentStatus> for engine::AppointmentStatus {
    fn from(v: AppointmentStatus) -> Self {
        match v {
            AppointmentStatus::Pending => engine::AppointmentStatus::Pending,
            AppointmentStatus::Completed => engine::AppointmentStatus::Completed,
            AppointmentStatus::Cancelled => engine::AppointmentStatus::Cancelled,
            AppointmentStatus::Expired => engine::AppointmentStatus::Expired,
        }
    }
}

impl From<engine::AppointmentStatus> for AppointmentStatus {
    fn from(v: engine::AppointmentStatus) -> Self {
        match v {
            engine::AppointmentStatus::Pending => AppointmentStatus::Pending,
            engine::AppointmentStatus::Completed => AppointmentStatus::Completed,
            engine::AppointmentStatus::Cancelled => AppointmentStatus::Cancelled,
            engine::AppointmentStatus::Expired => AppointmentStatus::Expired,
        }
    }
}

impl From<StatusAction> for lifecycle::StatusAction {
    fn from(v: StatusAction) -> Self {
        match v {
            StatusAction::Complete => lifecycle::StatusAction::Complete,
            StatusAction::Cancel => lifecycle::StatusAction::Cancel,
            StatusAction::Expire => lifecycle::StatusAction::Expire,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_date(field: &str, s: &str) -> napi::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| napi::Error::from_reason(format!("{} '{}' is not YYYY-MM-DD: {}", field, s, e)))
}

fn parse_now(now: Option<String>) -> napi::Result<NaiveDateTime> {
    match now {
        Some(s) => NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M"))
            .map_err(|e| napi::Error::from_reason(format!("now '{}' is not a local datetime: {}", s, e))),
        None => Ok(Local::now().naive_local()),
    }
}

fn reason<E: std::fmt::Display>(e: E) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Mirror types: schedule / input side
// ---------------------------------------------------------------------------

#[napi(object)]
#[derive(Debug, Clone)]
pub struct WorkingDay {
    /// Weekday name, English or Spanish.
    pub day: String,
    pub active: bool,
    pub explicit_hours: Option<Vec<String>>,
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct LunchBreak {
    pub active: Option<bool>,
    pub start: String,
    pub end: String,
}

impl From<LunchBreak> for engine::LunchBreak {
    fn from(v: LunchBreak) -> Self {
        engine::LunchBreak {
            active: v.active.unwrap_or(true),
            start: v.start,
            end: v.end,
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct ScheduleException {
    pub date: String,
    pub active: bool,
}

impl TryFrom<ScheduleException> for engine::ScheduleException {
    type Error = napi::Error;

    fn try_from(v: ScheduleException) -> napi::Result<Self> {
        Ok(engine::ScheduleException {
            date: parse_date("exception date", &v.date)?,
            active: v.active,
        })
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct Barber {
    pub id: u32,
    pub name: String,
    pub working_days: Vec<WorkingDay>,
    pub lunch_break: Option<LunchBreak>,
    pub exceptions: Vec<ScheduleException>,
}

impl TryFrom<Barber> for engine::Barber {
    type Error = napi::Error;

    fn try_from(v: Barber) -> napi::Result<Self> {
        let working_days: BTreeMap<String, engine::WorkingDay> = v
            .working_days
            .into_iter()
            .map(|d| {
                (
                    d.day,
                    engine::WorkingDay {
                        active: d.active,
                        explicit_hours: d.explicit_hours.unwrap_or_default(),
                    },
                )
            })
            .collect();
        let exceptions = v
            .exceptions
            .into_iter()
            .map(engine::ScheduleException::try_from)
            .collect::<napi::Result<Vec<_>>>()?;
        Ok(engine::Barber {
            id: u64::from(v.id),
            name: v.name,
            schedule: engine::ScheduleConfig {
                working_days,
                lunch_break: v.lunch_break.map(Into::into),
                exceptions,
            },
        })
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct Appointment {
    pub id: Option<u32>,
    pub barber_id: u32,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
}

impl TryFrom<Appointment> for engine::Appointment {
    type Error = napi::Error;

    fn try_from(v: Appointment) -> napi::Result<Self> {
        Ok(engine::Appointment {
            id: v.id.map(u64::from),
            barber_id: u64::from(v.barber_id),
            service_id: None,
            client: None,
            date: parse_date("appointment date", &v.date)?,
            start_time: v.start_time,
            end_time: v.end_time,
            duration_actual: None,
            duration_rounded: None,
            location: None,
            status: v.status.into(),
        })
    }
}

fn convert_appointments(appointments: Vec<Appointment>) -> napi::Result<Vec<engine::Appointment>> {
    appointments
        .into_iter()
        .map(engine::Appointment::try_from)
        .collect()
}

// ---------------------------------------------------------------------------
// Mirror types: output side
// ---------------------------------------------------------------------------

#[napi(object)]
#[derive(Debug, Clone)]
pub struct Slot {
    pub start_time: String,
    pub end_time: String,
    pub display_label: String,
}

impl From<engine::Slot> for Slot {
    fn from(v: engine::Slot) -> Self {
        Slot {
            start_time: v.start_time,
            end_time: v.end_time,
            display_label: v.display_label,
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct SlotVerdict {
    pub start_time: String,
    pub end_time: String,
    pub display_label: String,
    pub available: bool,
    /// camelCase reason, e.g. "lunchBreak". Absent when available.
    pub reason: Option<String>,
    pub message: Option<String>,
}

fn reason_key(r: availability::UnavailableReason) -> String {
    serde_json::to_value(r)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", r))
}

impl From<availability::SlotAvailability> for SlotVerdict {
    fn from(v: availability::SlotAvailability) -> Self {
        SlotVerdict {
            start_time: v.slot.start_time,
            end_time: v.slot.end_time,
            display_label: v.slot.display_label,
            available: v.available,
            reason: v.reason.map(reason_key),
            message: v.reason.map(|r| r.message().to_string()),
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct EndTime {
    pub end_time: String,
    pub minutes: u32,
    /// True when the 60-minute default stood in for a missing duration.
    pub defaulted: bool,
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<validator::ValidationResult> for ValidationResult {
    fn from(v: validator::ValidationResult) -> Self {
        ValidationResult {
            errors: v.errors,
            warnings: v.warnings,
        }
    }
}

// ---------------------------------------------------------------------------
// Exported functions
// ---------------------------------------------------------------------------

/// Candidate slots for `date` ("YYYY-MM-DD"). `now` defaults to the local
/// clock.
#[napi]
pub fn generate_slots(date: String, now: Option<String>) -> napi::Result<Vec<Slot>> {
    let date = parse_date("date", &date)?;
    let now = parse_now(now)?;
    slots::generate_slots(date, now, &ShopConfig::default())
        .map(|slots| slots.into_iter().map(Into::into).collect())
        .map_err(reason)
}

/// Whether `barber` can take `startTime` on `date`, with the reason when not.
#[napi]
pub fn is_available(
    barber: Barber,
    date: String,
    start_time: String,
    appointments: Vec<Appointment>,
) -> napi::Result<SlotVerdict> {
    let barber = engine::Barber::try_from(barber)?;
    let date = parse_date("date", &date)?;
    let appointments = convert_appointments(appointments)?;
    let shop = ShopConfig::default();

    let verdict = availability::resolve(&barber, date, &start_time, &appointments, &shop).map_err(reason)?;
    let start = timefmt::normalize_clock(&start_time).map_err(reason)?;
    let end = timefmt::add_minutes(&start, shop.cadence()).map_err(reason)?;
    let display_label = format!(
        "{} - {}",
        timefmt::to_12_hour(&start).map_err(reason)?,
        timefmt::to_12_hour(&end).map_err(reason)?
    );
    Ok(availability::SlotAvailability {
        slot: engine::Slot {
            start_time: start,
            end_time: end,
            display_label,
        },
        available: verdict.is_available(),
        reason: verdict.reason(),
    }
    .into())
}

/// The barber's day: every remaining slot with its verdict.
#[napi]
pub fn agenda(
    barber: Barber,
    date: String,
    appointments: Vec<Appointment>,
    now: Option<String>,
) -> napi::Result<Vec<SlotVerdict>> {
    let barber = engine::Barber::try_from(barber)?;
    let date = parse_date("date", &date)?;
    let appointments = convert_appointments(appointments)?;
    let now = parse_now(now)?;
    availability::agenda_for(&barber, date, &appointments, now, &ShopConfig::default())
        .map(|slots| slots.into_iter().map(Into::into).collect())
        .map_err(reason)
}

/// "Available" / "Not available" badge for the barber list.
#[napi]
pub fn day_available(
    barber: Barber,
    date: String,
    appointments: Vec<Appointment>,
    now: Option<String>,
) -> napi::Result<bool> {
    let barber = engine::Barber::try_from(barber)?;
    let date = parse_date("date", &date)?;
    let appointments = convert_appointments(appointments)?;
    let now = parse_now(now)?;
    availability::day_available(&barber, date, &appointments, now, &ShopConfig::default())
        .map_err(reason)
}

/// End time of a service starting at `startTime`. `duration` is a duration
/// string or minute count; missing or unparsable means 60 minutes.
#[napi]
pub fn compute_end_time(start_time: String, duration: Option<String>) -> napi::Result<EndTime> {
    let nominal = duration.map(engine::NominalDuration::Text);
    let resolved = timefmt::to_minutes(nominal.as_ref());
    let end_time = timefmt::add_minutes(&start_time, resolved.minutes).map_err(reason)?;
    Ok(EndTime {
        end_time,
        minutes: resolved.minutes,
        defaulted: resolved.is_defaulted(),
    })
}

#[napi(js_name = "to12Hour")]
pub fn to_12_hour(time: String) -> napi::Result<String> {
    timefmt::to_12_hour(&time).map_err(reason)
}

#[napi(js_name = "to24Hour")]
pub fn to_24_hour(time: String) -> napi::Result<String> {
    timefmt::to_24_hour(&time).map_err(reason)
}

/// Next status after `action`, or an error for terminal states.
#[napi]
pub fn transition(status: AppointmentStatus, action: StatusAction) -> napi::Result<AppointmentStatus> {
    lifecycle::next_status(status.into(), action.into())
        .map(Into::into)
        .map_err(reason)
}

/// Whether a Pending appointment has waited long enough to expire.
#[napi]
pub fn is_expiration_eligible(appointment: Appointment, today: Option<String>) -> napi::Result<bool> {
    let appointment = engine::Appointment::try_from(appointment)?;
    let today = match today {
        Some(s) => parse_date("today", &s)?,
        None => Local::now().date_naive(),
    };
    Ok(lifecycle::is_expiration_eligible(
        &appointment,
        today,
        ShopConfig::default().expiration_days,
    ))
}

/// Lint a barber's schedule without resolving anything.
#[napi]
pub fn validate_schedule(barber: Barber) -> napi::Result<ValidationResult> {
    let barber = engine::Barber::try_from(barber)?;
    Ok(validator::validate_schedule(&barber.schedule, &ShopConfig::default()).into())
}
