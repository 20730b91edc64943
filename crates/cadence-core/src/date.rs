//! Calendar-day arithmetic and the clock abstraction.
//!
//! All scheduling happens on the local wall clock at day granularity; there is
//! no timezone handling.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of "now" for operations that are not given an explicit date.
pub trait Clock: Send + Sync {
  fn now(&self) -> NaiveDateTime;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime { Local::now().naive_local() }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
  fn now(&self) -> NaiveDateTime { self.0 }
}

// ─── Arithmetic ──────────────────────────────────────────────────────────────

/// `at` moved by `days` whole days; time of day is preserved.
pub fn add_days(at: NaiveDateTime, days: i64) -> NaiveDateTime {
  at + Duration::days(days)
}

/// Whether two instants fall on the same calendar day.
pub fn same_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
  a.date() == b.date()
}

/// Whether `at` falls on a calendar day in `start..=end`.
pub fn within_days(at: NaiveDateTime, start: NaiveDate, end: NaiveDate) -> bool {
  let day = at.date();
  start <= day && day <= end
}

/// First and last calendar day of `month` in `year`. `None` for an invalid
/// month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  let next_first = if month == 12 {
    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
  } else {
    NaiveDate::from_ymd_opt(year, month + 1, 1)?
  };
  Some((first, next_first.pred_opt()?))
}
