//! Source of "today" for date validation.

use reef_core::CalendarDate;

pub trait Clock: Send + Sync {
    /// The current local date.
    fn today(&self) -> CalendarDate;
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        CalendarDate::from(chrono::Local::now().date_naive())
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDate {
        self.0
    }
}
