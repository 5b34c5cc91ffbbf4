use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::availability::{self, Availability, UnavailableReason};
use crate::config::ShopConfig;
use crate::lifecycle::{self, StatusAction, TransitionError, Trigger};
use crate::model::{Appointment, AppointmentStatus, Barber, ClientRef, Service};
use crate::timefmt::{self, DurationSource, TimeError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Slot not available: {}", .0.message())]
    Unavailable(UnavailableReason),
    /// The backend refused a slot that looked free locally. Authoritative;
    /// never retried.
    #[error("Booking conflict: the slot was taken before this booking reached the server")]
    BookingConflict,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Failure reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("slot already taken")]
    SlotTaken,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<BackendError> for BookingError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::SlotTaken => BookingError::BookingConflict,
            other => BookingError::Backend(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// The remote API that owns appointment storage. It enforces the
/// one-booking-per-(barber, date, start) rule atomically.
pub trait AppointmentBackend {
    fn create_appointment(&self, appointment: &NewAppointment) -> Result<Appointment, BackendError>;
    fn update_status(&self, appointment_id: u64, status: AppointmentStatus) -> Result<(), BackendError>;
}

/// Sends the "your appointment is booked" message. Best-effort.
pub trait ConfirmationNotifier {
    fn send_confirmation(&self, appointment: &Appointment) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
// Request / payload types
// ---------------------------------------------------------------------------

/// What the booking screen collected. Every field is optional so missing
/// input is reported by name instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub barber_id: Option<u64>,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub client: Option<ClientRef>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// "HH:MM" or "h:MM AM/PM".
    #[serde(default)]
    pub start_time: Option<String>,
}

/// Create-appointment payload sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub barber_id: u64,
    pub service_id: u64,
    pub client: ClientRef,
    pub date: NaiveDate,
    /// "HH:MM:SS"
    pub start_time: String,
    /// "HH:MM:SS", always computed from the unrounded duration.
    pub end_time: String,
    pub duration_actual: String,
    /// Display only.
    pub duration_rounded: String,
    pub duration_source: DurationSource,
    pub location: String,
    pub status: AppointmentStatus,
}

impl NewAppointment {
    /// The appointment as it will exist once the backend assigns `id`.
    pub fn into_appointment(self, id: u64) -> Appointment {
        Appointment {
            id: Some(id),
            barber_id: self.barber_id,
            service_id: Some(self.service_id),
            client: Some(self.client),
            date: self.date,
            start_time: trim_seconds(&self.start_time),
            end_time: trim_seconds(&self.end_time),
            duration_actual: Some(self.duration_actual),
            duration_rounded: Some(self.duration_rounded),
            location: Some(self.location),
            status: self.status,
        }
    }
}

fn trim_seconds(time: &str) -> String {
    timefmt::normalize_clock(time).unwrap_or_else(|_| time.to_string())
}

/// Everything the booking flow reads besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct BookingContext<'a> {
    pub barbers: &'a [Barber],
    /// Last-fetched appointments; may be stale.
    pub appointments: &'a [Appointment],
    pub now: NaiveDateTime,
    pub shop: &'a ShopConfig,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate `request` and build the create payload. No network call is made.
///
/// Checks run in order: service and barber supplied, client supplied, date
/// and start time supplied and well-formed, slot available (see
/// [`availability::resolve_at`]).
pub fn validate_booking(
    request: &BookingRequest,
    ctx: &BookingContext<'_>,
) -> Result<NewAppointment, BookingError> {
    let service = request
        .service
        .as_ref()
        .ok_or(BookingError::MissingField("service"))?;
    let barber_id = request.barber_id.ok_or(BookingError::MissingField("barberId"))?;
    let barber = ctx
        .barbers
        .iter()
        .find(|b| b.id == barber_id)
        .ok_or_else(|| BookingError::InvalidField {
            field: "barberId",
            reason: format!("unknown barber {}", barber_id),
        })?;

    let client = validate_client(request.client.as_ref())?;

    let date = request.date.ok_or(BookingError::MissingField("date"))?;
    let raw_start = request
        .start_time
        .as_deref()
        .ok_or(BookingError::MissingField("startTime"))?;
    let start = timefmt::to_24_hour(raw_start).map_err(|e| invalid("startTime", e))?;

    let verdict = availability::resolve_at(barber, date, &start, ctx.appointments, ctx.now, ctx.shop)
        .map_err(|e| invalid("startTime", e))?;
    if let Availability::Unavailable(reason) = verdict {
        return Err(BookingError::Unavailable(reason));
    }

    let duration = timefmt::to_minutes(service.nominal_duration.as_ref());
    let end = timefmt::add_minutes(&start, duration.minutes).map_err(|e| invalid("startTime", e))?;

    Ok(NewAppointment {
        barber_id,
        service_id: service.id,
        client,
        date,
        start_time: timefmt::with_seconds(&start).map_err(|e| invalid("startTime", e))?,
        end_time: timefmt::with_seconds(&end).map_err(|e| invalid("startTime", e))?,
        duration_actual: timefmt::actual_duration(service.nominal_duration.as_ref(), duration),
        duration_rounded: timefmt::rounded_duration(duration.minutes),
        duration_source: duration.source,
        location: ctx.shop.in_shop_location.clone(),
        status: AppointmentStatus::Pending,
    })
}

fn validate_client(client: Option<&ClientRef>) -> Result<ClientRef, BookingError> {
    match client {
        None => Err(BookingError::MissingField("client")),
        Some(ClientRef::Registered { client_id }) => Ok(ClientRef::Registered {
            client_id: *client_id,
        }),
        Some(ClientRef::Temporary { name, phone }) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(BookingError::MissingField("temporaryClientName"));
            }
            let phone = phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string);
            Ok(ClientRef::Temporary {
                name: name.to_string(),
                phone,
            })
        }
    }
}

fn invalid(field: &'static str, e: TimeError) -> BookingError {
    BookingError::InvalidField {
        field,
        reason: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Validate, persist, then confirm.
///
/// A backend rejection of the slot surfaces as
/// [`BookingError::BookingConflict`] even if the local check passed. A
/// failed confirmation is logged and does not fail the booking.
pub fn book(
    backend: &dyn AppointmentBackend,
    notifier: Option<&dyn ConfirmationNotifier>,
    request: &BookingRequest,
    ctx: &BookingContext<'_>,
) -> Result<Appointment, BookingError> {
    let payload = validate_booking(request, ctx)?;
    if payload.duration_source == DurationSource::Defaulted {
        tracing::debug!(
            service_id = payload.service_id,
            "booking with default service duration"
        );
    }

    let created = backend.create_appointment(&payload)?;
    tracing::info!(
        id = ?created.id,
        barber_id = created.barber_id,
        date = %created.date,
        start = %created.start_time,
        "appointment booked"
    );

    if let Some(notifier) = notifier {
        if let Err(e) = notifier.send_confirmation(&created) {
            tracing::warn!(id = ?created.id, error = %e, "confirmation not sent");
        }
    }
    Ok(created)
}

/// Apply a status change locally, then push it to the backend.
pub fn change_status(
    backend: &dyn AppointmentBackend,
    appointment: &mut Appointment,
    action: StatusAction,
    trigger: Trigger,
    today: NaiveDate,
    shop: &ShopConfig,
) -> Result<AppointmentStatus, BookingError> {
    let id = appointment.id.ok_or(BookingError::MissingField("id"))?;
    let previous = appointment.status;
    let next = lifecycle::apply(appointment, action, trigger, today, shop.expiration_days)?;
    if let Err(e) = backend.update_status(id, next) {
        appointment.status = previous;
        return Err(e.into());
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
