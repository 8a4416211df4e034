//! Dates

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while constructing a [`DateRange`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    /// Check-out was not strictly after check-in; zero-night stays are invalid.
    #[error("check-out {checkout} must be after check-in {checkin}")]
    ZeroNightStay {
        /// The rejected check-in date.
        checkin: NaiveDate,
        /// The rejected check-out date.
        checkout: NaiveDate,
    },

    /// Adding the requested number of nights overflowed the calendar.
    #[error("{nights} nights from {checkin} is out of calendar range")]
    OutOfRange {
        /// Check-in date the nights were added to.
        checkin: NaiveDate,
        /// Requested stay length.
        nights: u32,
    },
}

/// A stay between a check-in and a check-out date.
///
/// The range is half-open: the occupied nights are `[checkin, checkout)`.
/// The guest departs on the check-out date and does not occupy it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    checkin: NaiveDate,
    checkout: NaiveDate,
}

impl DateRange {
    /// Create a range from a check-in/check-out pair.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError::ZeroNightStay`] unless `checkin < checkout`.
    pub fn new(checkin: NaiveDate, checkout: NaiveDate) -> Result<Self, DateRangeError> {
        if checkin < checkout {
            Ok(Self { checkin, checkout })
        } else {
            Err(DateRangeError::ZeroNightStay { checkin, checkout })
        }
    }

    /// Create a range from a check-in date and a stay length in nights.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError::ZeroNightStay`] for `nights == 0`, or
    /// [`DateRangeError::OutOfRange`] if the checkout date is not representable.
    pub fn with_nights(checkin: NaiveDate, nights: u32) -> Result<Self, DateRangeError> {
        let checkout = checkin
            .checked_add_days(Days::new(u64::from(nights)))
            .ok_or(DateRangeError::OutOfRange { checkin, nights })?;

        Self::new(checkin, checkout)
    }

    /// The check-in date.
    #[must_use]
    pub fn checkin(&self) -> NaiveDate {
        self.checkin
    }

    /// The check-out date (not occupied).
    #[must_use]
    pub fn checkout(&self) -> NaiveDate {
        self.checkout
    }

    /// Number of occupied nights; always at least one.
    #[must_use]
    pub fn nights(&self) -> u32 {
        // The constructor guarantees checkout > checkin, so this never truncates.
        u32::try_from((self.checkout - self.checkin).num_days()).unwrap_or(0)
    }

    /// Iterate the occupied nights, `checkin` up to but excluding `checkout`.
    pub fn iter_nights(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let checkout = self.checkout;

        self.checkin.iter_days().take_while(move |d| *d < checkout)
    }

    /// Whether `date` is one of the occupied nights.
    #[must_use]
    pub fn contains_night(&self, date: NaiveDate) -> bool {
        self.checkin <= date && date < self.checkout
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.checkin, self.checkout)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn date(iso: &str) -> Result<NaiveDate, chrono::ParseError> {
        iso.parse()
    }

    #[test]
    fn new_accepts_ordered_pair() -> TestResult {
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;

        assert_eq!(range.nights(), 3);
        assert_eq!(range.checkin(), date("2025-06-01")?);
        assert_eq!(range.checkout(), date("2025-06-04")?);

        Ok(())
    }

    #[test]
    fn new_rejects_zero_night_stay() -> TestResult {
        let day = date("2025-06-01")?;

        assert!(matches!(
            DateRange::new(day, day),
            Err(DateRangeError::ZeroNightStay { .. })
        ));

        Ok(())
    }

    #[test]
    fn new_rejects_reversed_pair() -> TestResult {
        let result = DateRange::new(date("2025-06-04")?, date("2025-06-01")?);

        assert!(matches!(result, Err(DateRangeError::ZeroNightStay { .. })));

        Ok(())
    }

    #[test]
    fn with_nights_computes_checkout() -> TestResult {
        let range = DateRange::with_nights(date("2025-06-01")?, 3)?;

        assert_eq!(range.checkout(), date("2025-06-04")?);

        Ok(())
    }

    #[test]
    fn with_nights_rejects_zero() -> TestResult {
        let result = DateRange::with_nights(date("2025-06-01")?, 0);

        assert!(matches!(result, Err(DateRangeError::ZeroNightStay { .. })));

        Ok(())
    }

    #[test]
    fn iter_nights_excludes_checkout() -> TestResult {
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;
        let nights: Vec<NaiveDate> = range.iter_nights().collect();

        assert_eq!(
            nights,
            vec![date("2025-06-01")?, date("2025-06-02")?, date("2025-06-03")?]
        );

        Ok(())
    }

    #[test]
    fn contains_night_is_half_open() -> TestResult {
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;

        assert!(range.contains_night(date("2025-06-01")?));
        assert!(range.contains_night(date("2025-06-03")?));
        assert!(!range.contains_night(date("2025-06-04")?));
        assert!(!range.contains_night(date("2025-05-31")?));

        Ok(())
    }

    #[test]
    fn display_is_a_stable_range_key() -> TestResult {
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;

        assert_eq!(range.to_string(), "2025-06-01..2025-06-04");

        Ok(())
    }
}
