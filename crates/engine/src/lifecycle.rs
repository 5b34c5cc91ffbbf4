use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Appointment, AppointmentStatus};

/// A status change requested for an appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusAction {
    /// Service rendered and paid. Not verified here.
    Complete,
    Cancel,
    Expire,
}

/// Who asked for the change. The automatic trigger may only expire, and only
/// once the appointment is eligible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    #[default]
    Manual,
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Appointment is already {0}; a {0} appointment cannot change status")]
    TerminalStatus(AppointmentStatus),
    #[error("Appointment on {date} is not eligible for automatic expiration until {eligible_on}")]
    NotYetExpirable {
        date: NaiveDate,
        eligible_on: NaiveDate,
    },
    #[error("{0:?} must be requested manually")]
    ManualOnly(StatusAction),
}

impl StatusAction {
    pub fn target(self) -> AppointmentStatus {
        match self {
            StatusAction::Complete => AppointmentStatus::Completed,
            StatusAction::Cancel => AppointmentStatus::Cancelled,
            StatusAction::Expire => AppointmentStatus::Expired,
        }
    }
}

/// Actions accepted from `status`. Empty for the terminal states.
pub fn valid_actions(status: AppointmentStatus) -> &'static [StatusAction] {
    match status {
        AppointmentStatus::Pending => &[
            StatusAction::Complete,
            StatusAction::Cancel,
            StatusAction::Expire,
        ],
        AppointmentStatus::Completed
        | AppointmentStatus::Cancelled
        | AppointmentStatus::Expired => &[],
    }
}

/// Pure transition function of the status machine.
pub fn next_status(
    current: AppointmentStatus,
    action: StatusAction,
) -> Result<AppointmentStatus, TransitionError> {
    if valid_actions(current).contains(&action) {
        Ok(action.target())
    } else {
        Err(TransitionError::TerminalStatus(current))
    }
}

/// First day on which an unconfirmed appointment dated `date` may expire
/// automatically.
pub fn expiration_eligible_on(date: NaiveDate, expiration_days: u32) -> NaiveDate {
    date + Duration::days(i64::from(expiration_days))
}

/// True when `appointment` is still Pending and `expiration_days` have
/// elapsed since its date.
///
/// Only the check lives here; the backend decides when to run it.
pub fn is_expiration_eligible(
    appointment: &Appointment,
    today: NaiveDate,
    expiration_days: u32,
) -> bool {
    appointment.status == AppointmentStatus::Pending
        && today >= expiration_eligible_on(appointment.date, expiration_days)
}

/// Ids of every appointment eligible for automatic expiration.
pub fn expiration_candidates(
    appointments: &[Appointment],
    today: NaiveDate,
    expiration_days: u32,
) -> Vec<u64> {
    appointments
        .iter()
        .filter(|a| is_expiration_eligible(a, today, expiration_days))
        .filter_map(|a| a.id)
        .collect()
}

/// Apply `action` to `appointment` in place and return the new status.
pub fn apply(
    appointment: &mut Appointment,
    action: StatusAction,
    trigger: Trigger,
    today: NaiveDate,
    expiration_days: u32,
) -> Result<AppointmentStatus, TransitionError> {
    let next = next_status(appointment.status, action)?;

    if trigger == Trigger::Automatic && action != StatusAction::Expire {
        return Err(TransitionError::ManualOnly(action));
    }
    if trigger == Trigger::Automatic
        && action == StatusAction::Expire
        && !is_expiration_eligible(appointment, today, expiration_days)
    {
        return Err(TransitionError::NotYetExpirable {
            date: appointment.date,
            eligible_on: expiration_eligible_on(appointment.date, expiration_days),
        });
    }

    tracing::info!(
        id = ?appointment.id,
        from = %appointment.status,
        to = %next,
        ?trigger,
        "appointment status changed"
    );
    appointment.status = next;
    Ok(next)
}
