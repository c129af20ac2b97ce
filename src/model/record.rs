//! Coverage record for one cached series

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use super::DailyValue;
use super::DateRange;
use super::SeriesKey;
use super::next_day;

/// A calendar-complete slice of one daily metric series.
///
/// A record is either absent from the store or fully valid: `values` holds
/// exactly one entry per day of `range`, in ascending date order, with no
/// gaps and no duplicates. `last_date` is the most recent day for which the
/// provider actually returned a row; it may lag `range.end()` when the
/// provider reported nothing for the final day(s), and it is the resume
/// point for forward extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Identity of the series this record covers.
    pub key: SeriesKey,
    /// Inclusive bounds of the densified range currently stored.
    pub range: DateRange,
    /// Date of the last row actually fetched from the provider.
    pub last_date: NaiveDate,
    /// One entry per calendar day in `range`, date-ascending.
    pub values: Vec<DailyValue>,
}

/// Error returned by [`CacheRecord::new`] when the parts do not form a
/// calendar-complete record.
#[derive(Debug, thiserror::Error)]
pub enum InvalidRecord {
    /// `values` has a different length than the range.
    #[error("Expected {expected} values for the range, got {actual}")]
    WrongLength { expected: u64, actual: usize },

    /// A value's date does not match its calendar position in the range.
    #[error("Value at index {index} has date {actual}, expected {expected}")]
    Misaligned {
        index: usize,
        expected: NaiveDate,
        actual: NaiveDate,
    },

    /// `last_date` lies after the end of the range.
    #[error("last_date {last_date} is after range end {end}")]
    LastDateBeyondEnd { last_date: NaiveDate, end: NaiveDate },
}

impl CacheRecord {
    /// Builds a record, validating the calendar-completeness invariant.
    pub fn new(
        key: SeriesKey,
        range: DateRange,
        last_date: NaiveDate,
        values: Vec<DailyValue>,
    ) -> Result<Self, InvalidRecord> {
        if values.len() as u64 != range.len_days() {
            return Err(InvalidRecord::WrongLength {
                expected: range.len_days(),
                actual: values.len(),
            });
        }
        for (index, (expected, value)) in range.iter_days().zip(&values).enumerate() {
            if value.date != expected {
                return Err(InvalidRecord::Misaligned {
                    index,
                    expected,
                    actual: value.date,
                });
            }
        }
        if last_date > range.end() {
            return Err(InvalidRecord::LastDateBeyondEnd {
                last_date,
                end: range.end(),
            });
        }
        Ok(Self {
            key,
            range,
            last_date,
            values,
        })
    }

    /// Appends already-densified trailing days, advancing the range end and
    /// the provider resume point.
    ///
    /// The caller guarantees `appended` starts at the day after the current
    /// end and is itself calendar-complete through `new_end`; stores
    /// re-validate before accepting the extension.
    pub(crate) fn apply_extension(
        &mut self,
        appended: Vec<DailyValue>,
        new_end: NaiveDate,
        new_last_date: NaiveDate,
    ) {
        self.values.extend(appended);
        self.range = DateRange::new(self.range.start(), new_end)
            .unwrap_or(self.range);
        self.last_date = new_last_date;
    }

    /// Checks that `appended` is a valid contiguous extension of this record.
    pub(crate) fn extension_is_valid(
        &self,
        appended: &[DailyValue],
        new_end: NaiveDate,
        new_last_date: NaiveDate,
    ) -> bool {
        if new_end <= self.range.end() || new_last_date > new_end {
            return false;
        }
        let Some(tail) = DateRange::new(next_day(self.range.end()), new_end) else {
            return false;
        };
        appended.len() as u64 == tail.len_days()
            && tail.iter_days().zip(appended).all(|(day, v)| v.date == day)
    }

    /// Returns the stored values restricted to `window`.
    ///
    /// Days of `window` outside the stored range are omitted; callers that
    /// need the full window must extend coverage first.
    pub fn slice(&self, window: &DateRange) -> Vec<DailyValue> {
        self.values
            .iter()
            .filter(|value| window.contains(value.date))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::Metric;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key() -> SeriesKey {
        SeriesKey::new(Uuid::nil(), "UC123", Metric::Views)
    }

    fn dense(range: DateRange) -> Vec<DailyValue> {
        range.iter_days().map(DailyValue::zero).collect()
    }

    #[test]
    fn test_valid_record() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();
        let record = CacheRecord::new(key(), range, date(2024, 1, 4), dense(range));
        assert!(record.is_ok());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();
        let mut values = dense(range);
        values.pop();
        let err = CacheRecord::new(key(), range, date(2024, 1, 5), values).unwrap_err();
        assert!(matches!(err, InvalidRecord::WrongLength { .. }));
    }

    #[test]
    fn test_rejects_misaligned_dates() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        let values = vec![
            DailyValue::zero(date(2024, 1, 1)),
            DailyValue::zero(date(2024, 1, 3)),
            DailyValue::zero(date(2024, 1, 3)),
        ];
        let err = CacheRecord::new(key(), range, date(2024, 1, 3), values).unwrap_err();
        assert!(matches!(err, InvalidRecord::Misaligned { index: 1, .. }));
    }

    #[test]
    fn test_rejects_last_date_beyond_end() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        let err = CacheRecord::new(key(), range, date(2024, 1, 4), dense(range)).unwrap_err();
        assert!(matches!(err, InvalidRecord::LastDateBeyondEnd { .. }));
    }

    #[test]
    fn test_extension_validation() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        let record = CacheRecord::new(key(), range, date(2024, 1, 3), dense(range)).unwrap();

        let tail = DateRange::new(date(2024, 1, 4), date(2024, 1, 6)).unwrap();
        assert!(record.extension_is_valid(&dense(tail), date(2024, 1, 6), date(2024, 1, 6)));

        // Overlaps the stored end.
        let overlap = DateRange::new(date(2024, 1, 3), date(2024, 1, 6)).unwrap();
        assert!(!record.extension_is_valid(&dense(overlap), date(2024, 1, 6), date(2024, 1, 6)));

        // Gap after the stored end.
        let gapped = DateRange::new(date(2024, 1, 5), date(2024, 1, 6)).unwrap();
        assert!(!record.extension_is_valid(&dense(gapped), date(2024, 1, 6), date(2024, 1, 6)));
    }

    #[test]
    fn test_slice() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 10)).unwrap();
        let record = CacheRecord::new(key(), range, date(2024, 1, 10), dense(range)).unwrap();
        let window = DateRange::new(date(2024, 1, 5), date(2024, 1, 7)).unwrap();
        let slice = record.slice(&window);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].date, date(2024, 1, 5));
        assert_eq!(slice[2].date, date(2024, 1, 7));
    }
}
