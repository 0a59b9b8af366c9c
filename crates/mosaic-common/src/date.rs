//! Date partition keys for the daily mosaic archive.

use crate::{MosaicError, MosaicResult};
use serde::{Deserialize, Serialize};

/// A year/month/day partition key.
///
/// The archive is partitioned by plain integer date components; asset
/// locators embed them unpadded. Components are range-checked only, not
/// validated against a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateKey {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl DateKey {
    /// Create a date key, rejecting out-of-range components.
    pub fn new(year: u32, month: u32, day: u32) -> MosaicResult<Self> {
        if year == 0 {
            return Err(MosaicError::invalid_parameter("year", "must be positive"));
        }
        if !(1..=12).contains(&month) {
            return Err(MosaicError::invalid_parameter("month", "must be 1-12"));
        }
        if !(1..=31).contains(&day) {
            return Err(MosaicError::invalid_parameter("day", "must be 1-31"));
        }
        Ok(Self { year, month, day })
    }
}

impl std::fmt::Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_date() {
        let date = DateKey::new(2019, 1, 1).unwrap();
        assert_eq!(date.to_string(), "2019-1-1");
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(DateKey::new(0, 1, 1).is_err());
        assert!(DateKey::new(2019, 0, 1).is_err());
        assert!(DateKey::new(2019, 13, 1).is_err());
        assert!(DateKey::new(2019, 1, 0).is_err());
        assert!(DateKey::new(2019, 1, 32).is_err());
    }

    #[test]
    fn test_no_calendar_validation() {
        // Partition keys only range-check components.
        assert!(DateKey::new(2019, 2, 31).is_ok());
    }
}
