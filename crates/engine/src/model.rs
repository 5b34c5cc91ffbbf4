use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Status of an appointment. `Pending` is the only non-terminal state.
///
/// The backend reports statuses in Spanish; both spellings are accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentStatus {
    #[serde(alias = "Pending", alias = "pendiente")]
    Pending,
    #[serde(alias = "Completed", alias = "completada", alias = "completado")]
    Completed,
    #[serde(alias = "Cancelled", alias = "cancelada", alias = "cancelado")]
    Cancelled,
    #[serde(alias = "Expired", alias = "expirada", alias = "expirado")]
    Expired,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Pending)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Barber schedule configuration
// ---------------------------------------------------------------------------

/// Availability of a barber on one weekday.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingDay {
    #[serde(default, alias = "activo")]
    pub active: bool,
    /// When non-empty, only these exact "HH:MM" start times are bookable.
    #[serde(default, alias = "horas", alias = "horarios")]
    pub explicit_hours: Vec<String>,
}

/// The barber's daily lunch break. Slots starting in `[start, end)` are
/// blocked while `active` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LunchBreak {
    #[serde(default = "default_true", alias = "activo")]
    pub active: bool,
    #[serde(default = "default_lunch_start", alias = "inicio")]
    pub start: String,
    #[serde(default = "default_lunch_end", alias = "fin")]
    pub end: String,
}

impl Default for LunchBreak {
    fn default() -> Self {
        LunchBreak {
            active: true,
            start: default_lunch_start(),
            end: default_lunch_end(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lunch_start() -> String {
    "13:00".to_string()
}

fn default_lunch_end() -> String {
    "14:00".to_string()
}

/// A date-specific override. `active == false` closes the whole day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleException {
    #[serde(alias = "fecha")]
    pub date: NaiveDate,
    #[serde(default, alias = "activo")]
    pub active: bool,
}

/// A barber's weekly availability. Read-only here: the barber-management
/// screens own it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// Keyed by weekday name, English or Spanish (e.g. "monday", "lunes").
    #[serde(default, alias = "diasLaborales")]
    pub working_days: BTreeMap<String, WorkingDay>,
    /// `None` means the shop default lunch break applies.
    #[serde(default, alias = "horarioAlmuerzo")]
    pub lunch_break: Option<LunchBreak>,
    #[serde(default, alias = "excepciones")]
    pub exceptions: Vec<ScheduleException>,
}

/// A barber as listed by the backend, schedule fields inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "BarberRecord")]
pub struct Barber {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub schedule: ScheduleConfig,
}

/// Wire form of [`Barber`]. Kept flat so the backend's Spanish aliases
/// resolve on every schedule field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BarberRecord {
    id: u64,
    #[serde(default, alias = "nombre")]
    name: String,
    #[serde(default, alias = "diasLaborales")]
    working_days: BTreeMap<String, WorkingDay>,
    #[serde(default, alias = "horarioAlmuerzo")]
    lunch_break: Option<LunchBreak>,
    #[serde(default, alias = "excepciones")]
    exceptions: Vec<ScheduleException>,
}

impl From<BarberRecord> for Barber {
    fn from(r: BarberRecord) -> Self {
        Barber {
            id: r.id,
            name: r.name,
            schedule: ScheduleConfig {
                working_days: r.working_days,
                lunch_break: r.lunch_break,
                exceptions: r.exceptions,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Services and clients
// ---------------------------------------------------------------------------

/// Nominal duration of a service as the backend reports it: either a
/// duration string ("01:30:00", "45") or a bare minute count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NominalDuration {
    Minutes(u32),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: u64,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "precio")]
    pub price: f64,
    #[serde(default, alias = "duracion")]
    pub nominal_duration: Option<NominalDuration>,
}

/// Who the appointment is for: a registered client or a walk-in that only
/// left a name (and maybe a phone number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClientRef {
    #[serde(rename_all = "camelCase")]
    Registered { client_id: u64 },
    #[serde(rename_all = "camelCase")]
    Temporary {
        name: String,
        #[serde(default)]
        phone: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Slots and appointments
// ---------------------------------------------------------------------------

/// A candidate half-hour interval. Value object, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    /// e.g. "11:00 AM - 11:30 AM"
    pub display_label: String,
}

/// An appointment as fetched from the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// `None` for entries that came from a decimal-hour agenda without ids.
    #[serde(default)]
    pub id: Option<u64>,
    pub barber_id: u64,
    #[serde(default)]
    pub service_id: Option<u64>,
    #[serde(default)]
    pub client: Option<ClientRef>,
    pub date: NaiveDate,
    /// "HH:MM" (a trailing ":SS" from the backend is tolerated).
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub duration_actual: Option<String>,
    #[serde(default)]
    pub duration_rounded: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub status: AppointmentStatus,
}
