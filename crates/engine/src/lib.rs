pub mod availability;
pub mod backend;
pub mod booking;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod schedule;
pub mod slots;
pub mod timefmt;
pub mod validator;
