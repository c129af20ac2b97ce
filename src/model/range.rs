//! Inclusive day-precision date ranges

use chrono::Days;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

/// An inclusive range of calendar days.
///
/// Both bounds are part of the range; `start <= end` always holds, so the
/// range is never empty. All coverage arithmetic in the cache is expressed
/// through this type rather than raw date pairs.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use seriescache::model::DateRange;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// let range = DateRange::new(start, end).unwrap();
///
/// assert_eq!(range.len_days(), 31);
/// assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a new range.
    ///
    /// Returns `None` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Creates a range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The first day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, inclusive of both bounds.
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Returns `true` if `day` falls within the range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Returns `true` if `other` is entirely within this range.
    pub fn covers(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Iterates every day of the range in ascending order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(move |day| *day <= end)
    }
}

/// Returns the day after `day`.
///
/// Saturates at the maximum representable date, which is far beyond any
/// realistic trailing window.
pub fn next_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}
