use std::io::{self, Read, Write};

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use barberia_agenda::availability::{self, Availability};
use barberia_agenda::backend::{self, BarberAgenda};
use barberia_agenda::booking::{self, BookingContext, BookingRequest};
use barberia_agenda::config::ShopConfig;
use barberia_agenda::lifecycle::{self, StatusAction, Trigger};
use barberia_agenda::model::{Appointment, AppointmentStatus, Barber, NominalDuration, ScheduleConfig};
use barberia_agenda::{slots, timefmt, validator};

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Booked appointments, either already normalized or as the backend's
/// decimal-hour agendas. Both lists are merged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Bookings {
    #[serde(default)]
    appointments: Vec<Appointment>,
    #[serde(default)]
    agendas: Vec<BarberAgenda>,
}

impl Bookings {
    fn resolve(self, date: NaiveDate) -> Result<Vec<Appointment>, String> {
        let mut all = self.appointments;
        all.extend(backend::normalize_agendas(date, &self.agendas).map_err(|e| e.to_string())?);
        Ok(all)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
enum Request {
    Slots {
        date: NaiveDate,
        now: Option<NaiveDateTime>,
        #[serde(default)]
        shop: ShopConfig,
    },
    #[serde(rename_all = "camelCase")]
    Availability {
        barber: Barber,
        date: NaiveDate,
        start_time: String,
        #[serde(flatten)]
        bookings: Bookings,
        now: Option<NaiveDateTime>,
        #[serde(default)]
        shop: ShopConfig,
    },
    Agenda {
        barber: Barber,
        date: NaiveDate,
        #[serde(flatten)]
        bookings: Bookings,
        now: Option<NaiveDateTime>,
        #[serde(default)]
        shop: ShopConfig,
    },
    DaySummary {
        barbers: Vec<Barber>,
        date: NaiveDate,
        #[serde(flatten)]
        bookings: Bookings,
        now: Option<NaiveDateTime>,
        #[serde(default)]
        shop: ShopConfig,
    },
    Book {
        request: BookingRequest,
        barbers: Vec<Barber>,
        #[serde(flatten)]
        bookings: Bookings,
        now: Option<NaiveDateTime>,
        #[serde(default)]
        shop: ShopConfig,
    },
    Transition {
        appointment: Appointment,
        action: StatusAction,
        #[serde(default)]
        trigger: Trigger,
        today: Option<NaiveDate>,
        #[serde(default)]
        shop: ShopConfig,
    },
    ExpirationCheck {
        appointments: Vec<Appointment>,
        today: Option<NaiveDate>,
        #[serde(default)]
        shop: ShopConfig,
    },
    ValidateSchedule {
        schedule: ScheduleConfig,
        #[serde(default)]
        shop: ShopConfig,
    },
    #[serde(rename_all = "camelCase")]
    EndTime {
        start_time: String,
        duration: Option<NominalDuration>,
    },
    ConvertTime {
        time: String,
    },
}

#[derive(Debug, Serialize)]
struct OkResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ErrResponse {
    ok: bool,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityResponse {
    available: bool,
    reason: Option<availability::UnavailableReason>,
    message: Option<&'static str>,
}

impl From<Availability> for AvailabilityResponse {
    fn from(v: Availability) -> Self {
        AvailabilityResponse {
            available: v.is_available(),
            reason: v.reason(),
            message: v.reason().map(|r| r.message()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BarberDay {
    barber_id: u64,
    available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransitionResponse {
    status: AppointmentStatus,
    appointment: Appointment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndTimeResponse {
    end_time: String,
    duration: timefmt::ResolvedDuration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertTimeResponse {
    time24: String,
    time12: String,
    decimal_hours: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("barberia_agenda=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn now_or_local(now: Option<NaiveDateTime>) -> NaiveDateTime {
    now.unwrap_or_else(|| Local::now().naive_local())
}

fn today_or_local(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

fn write_ok<T: Serialize>(data: T) {
    let resp = OkResponse { ok: true, data };
    let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
        format!("{{\"ok\":false,\"error\":\"serialization error: {}\"}}", e)
    });
    println!("{}", json);
    let _ = io::stdout().flush();
}

fn write_err(msg: impl std::fmt::Display) -> ! {
    let resp = ErrResponse {
        ok: false,
        error: msg.to_string(),
    };
    let json = serde_json::to_string(&resp).unwrap_or_else(|_| {
        "{\"ok\":false,\"error\":\"double serialization error\"}".to_string()
    });
    println!("{}", json);
    let _ = io::stdout().flush();
    std::process::exit(1);
}

fn respond<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) {
    match result {
        Ok(data) => write_ok(data),
        Err(e) => write_err(e),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    init_tracing();

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        write_err(format!("Failed to read stdin: {}", e));
    }

    let request: Request = match serde_json::from_str(&input) {
        Ok(r) => r,
        Err(e) => write_err(format!("Invalid JSON input: {}", e)),
    };

    match request {
        Request::Slots { date, now, shop } => {
            respond(slots::generate_slots(date, now_or_local(now), &shop));
        }
        Request::Availability {
            barber,
            date,
            start_time,
            bookings,
            now,
            shop,
        } => {
            let appointments = bookings.resolve(date).unwrap_or_else(|e| write_err(e));
            let verdict = match now {
                Some(now) => {
                    availability::resolve_at(&barber, date, &start_time, &appointments, now, &shop)
                }
                None => availability::resolve(&barber, date, &start_time, &appointments, &shop),
            };
            respond(verdict.map(AvailabilityResponse::from));
        }
        Request::Agenda {
            barber,
            date,
            bookings,
            now,
            shop,
        } => {
            let appointments = bookings.resolve(date).unwrap_or_else(|e| write_err(e));
            respond(availability::agenda_for(
                &barber,
                date,
                &appointments,
                now_or_local(now),
                &shop,
            ));
        }
        Request::DaySummary {
            barbers,
            date,
            bookings,
            now,
            shop,
        } => {
            let appointments = bookings.resolve(date).unwrap_or_else(|e| write_err(e));
            let now = now_or_local(now);
            let summary: Result<Vec<BarberDay>, _> = barbers
                .iter()
                .map(|b| {
                    availability::day_available(b, date, &appointments, now, &shop).map(|available| {
                        BarberDay {
                            barber_id: b.id,
                            available,
                        }
                    })
                })
                .collect();
            respond(summary);
        }
        Request::Book {
            request,
            barbers,
            bookings,
            now,
            shop,
        } => {
            let appointments = match request.date {
                Some(date) => bookings.resolve(date).unwrap_or_else(|e| write_err(e)),
                None => bookings.appointments,
            };
            let ctx = BookingContext {
                barbers: &barbers,
                appointments: &appointments,
                now: now_or_local(now),
                shop: &shop,
            };
            respond(booking::validate_booking(&request, &ctx));
        }
        Request::Transition {
            mut appointment,
            action,
            trigger,
            today,
            shop,
        } => {
            let today = today_or_local(today);
            let result = lifecycle::apply(&mut appointment, action, trigger, today, shop.expiration_days);
            respond(result.map(|status| TransitionResponse { status, appointment }));
        }
        Request::ExpirationCheck {
            appointments,
            today,
            shop,
        } => {
            let today = today_or_local(today);
            write_ok(lifecycle::expiration_candidates(
                &appointments,
                today,
                shop.expiration_days,
            ));
        }
        Request::ValidateSchedule { schedule, shop } => {
            write_ok(validator::validate_schedule(&schedule, &shop));
        }
        Request::EndTime {
            start_time,
            duration,
        } => {
            let duration = timefmt::to_minutes(duration.as_ref());
            respond(
                timefmt::add_minutes(&start_time, duration.minutes)
                    .map(|end_time| EndTimeResponse { end_time, duration }),
            );
        }
        Request::ConvertTime { time } => {
            let converted = timefmt::to_24_hour(&time).and_then(|time24| {
                Ok(ConvertTimeResponse {
                    time12: timefmt::to_12_hour(&time24)?,
                    decimal_hours: timefmt::to_decimal_hours(&time24)?,
                    time24,
                })
            });
            respond(converted);
        }
    }
}
