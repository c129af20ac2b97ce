//! Calendar densification of sparse daily rows
//!
//! Providers omit days with no activity, so a fetched series usually has
//! holes. [`densify`] turns such a sparse sequence into exactly one entry
//! per calendar day of a range, zero-filling every day the provider said
//! nothing about.

use crate::model::DailyValue;
use crate::model::DateRange;

/// Fills `range` with one entry per calendar day.
///
/// `rows` must be date-ascending, duplicate-free, and entirely within
/// `range`. Each input row keeps its value; every other day of the range
/// becomes zero. The first and last day of the range are always emitted,
/// even when no row matches them, and an empty `rows` produces a fully
/// zero-filled range.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use seriescache::densify::densify;
/// use seriescache::model::{DailyValue, DateRange};
///
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
/// ).unwrap();
/// let rows = vec![DailyValue::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), 7)];
///
/// let series = densify(&rows, range);
/// assert_eq!(series.len(), 4);
/// assert_eq!(series[2].value, 7);
/// assert_eq!(series[0].value, 0);
/// ```
pub fn densify(rows: &[DailyValue], range: DateRange) -> Vec<DailyValue> {
    debug_assert!(rows.windows(2).all(|pair| pair[0].date < pair[1].date));
    debug_assert!(rows.iter().all(|row| range.contains(row.date)));

    let mut rows = rows.iter().peekable();
    let mut series = Vec::with_capacity(range.len_days() as usize);

    for day in range.iter_days() {
        match rows.peek() {
            Some(row) if row.date == day => {
                series.push(**row);
                rows.next();
            }
            _ => series.push(DailyValue::zero(day)),
        }
    }

    series
}
