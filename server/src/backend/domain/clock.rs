//! Source of "today" for date-window calculations.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current calendar date at local midnight
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the server's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
