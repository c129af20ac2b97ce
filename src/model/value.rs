//! A single day of a metric series

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

/// One calendar day of a daily metric.
///
/// Providers omit days with no activity; the densifier fills those days
/// with a zero [`DailyValue`] so stored series are calendar-complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyValue {
    /// The calendar day (UTC, day precision).
    pub date: NaiveDate,
    /// The metric value for that day.
    pub value: i64,
}

impl DailyValue {
    /// Creates a new daily value.
    pub fn new(date: NaiveDate, value: i64) -> Self {
        Self { date, value }
    }

    /// Creates a zero value for the given day.
    pub fn zero(date: NaiveDate) -> Self {
        Self { date, value: 0 }
    }
}
