//! Shapes the remote API returns, and their conversion into the crate's
//! "HH:MM" model at the boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Appointment, AppointmentStatus};
use crate::timefmt::{self, TimeError};

/// One booked range as the day-agenda endpoint reports it, with decimal
/// hours (`14.5` == 14:30).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookedRange {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(alias = "inicio")]
    pub start: f64,
    #[serde(alias = "fin")]
    pub end: f64,
    #[serde(default, alias = "estado")]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub service_id: Option<u64>,
}

/// Appointments for one barber on the requested date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BarberAgenda {
    #[serde(alias = "barberoId")]
    pub barber_id: u64,
    #[serde(default, alias = "citas")]
    pub appointments: Vec<BookedRange>,
}

impl BookedRange {
    /// Entries without a status are live bookings.
    pub fn to_appointment(&self, barber_id: u64, date: NaiveDate) -> Result<Appointment, TimeError> {
        Ok(Appointment {
            id: self.id,
            barber_id,
            service_id: self.service_id,
            client: None,
            date,
            start_time: timefmt::from_decimal_hours(self.start)?,
            end_time: timefmt::from_decimal_end_hours(self.end)?,
            duration_actual: None,
            duration_rounded: None,
            location: None,
            status: self.status.unwrap_or(AppointmentStatus::Pending),
        })
    }
}

/// Flatten per-barber agendas for `date` into appointments.
pub fn normalize_agendas(
    date: NaiveDate,
    agendas: &[BarberAgenda],
) -> Result<Vec<Appointment>, TimeError> {
    agendas
        .iter()
        .flat_map(|agenda| {
            agenda
                .appointments
                .iter()
                .map(move |range| range.to_appointment(agenda.barber_id, date))
        })
        .collect()
}
