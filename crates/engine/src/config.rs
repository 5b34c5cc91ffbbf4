use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::model::LunchBreak;
use crate::timefmt::{self, TimeError};

/// Expiration threshold for unconfirmed appointments, in days after the
/// appointment date.
pub const DEFAULT_EXPIRATION_DAYS: u32 = 3;

pub const DEFAULT_SLOT_MINUTES: u32 = 30;

pub const IN_SHOP_LOCATION: &str = "Barbería";

/// First and last slot start of an operating day, both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperatingWindow {
    pub first_slot: String,
    pub last_slot: String,
}

impl OperatingWindow {
    fn new(first_slot: &str, last_slot: &str) -> Self {
        OperatingWindow {
            first_slot: first_slot.to_string(),
            last_slot: last_slot.to_string(),
        }
    }

    /// Minute-of-day bounds of the window.
    pub fn bounds(&self) -> Result<(u32, u32), TimeError> {
        let first = timefmt::clock_minutes(&self.first_slot)?;
        let last = timefmt::clock_minutes(&self.last_slot)?;
        Ok((first, last))
    }
}

/// Shop-wide settings. Every field has a default, so callers may send a
/// partial object (or none at all).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopConfig {
    /// Monday to Wednesday.
    pub early_week: OperatingWindow,
    /// Thursday to Sunday.
    pub rest_of_week: OperatingWindow,
    pub slot_minutes: u32,
    pub expiration_days: u32,
    /// Applies to barbers whose schedule carries no lunch break.
    pub default_lunch: LunchBreak,
    pub in_shop_location: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            early_week: OperatingWindow::new("11:00", "21:00"),
            rest_of_week: OperatingWindow::new("09:00", "22:30"),
            slot_minutes: DEFAULT_SLOT_MINUTES,
            expiration_days: DEFAULT_EXPIRATION_DAYS,
            default_lunch: LunchBreak::default(),
            in_shop_location: IN_SHOP_LOCATION.to_string(),
        }
    }
}

impl ShopConfig {
    pub fn window_for(&self, weekday: Weekday) -> &OperatingWindow {
        match weekday {
            Weekday::Mon | Weekday::Tue | Weekday::Wed => &self.early_week,
            _ => &self.rest_of_week,
        }
    }

    /// Slot cadence, never zero.
    pub fn cadence(&self) -> u32 {
        self.slot_minutes.max(1)
    }
}
