//! Calendar selection
//!
//! The two-click check-in/check-out state machine. A first valid click sets
//! the check-in; a later date commits the range; anything else restarts or is
//! ignored. Invalid clicks are silently dropped so the calendar stays
//! responsive; they are input rejection, not errors.

use chrono::NaiveDate;
use tracing::debug;

use crate::{dates::DateRange, overlay::AvailabilityOverlay};

/// Current selection of the booking calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// Nothing selected.
    #[default]
    Empty,

    /// Check-in chosen, waiting for a check-out click.
    CheckinOnly(NaiveDate),

    /// A committed check-in/check-out pair.
    Range(DateRange),
}

/// What a single day click did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClick {
    /// The click was invalid and the state did not change.
    Ignored,

    /// The click started or restarted selection at a new check-in date.
    CheckinSet(NaiveDate),

    /// The click committed a full range.
    RangeCommitted {
        /// The committed stay.
        range: DateRange,

        /// Whether a private-event night inside the range forces booking the
        /// entire property.
        requires_whole_property: bool,
    },
}

/// Finite-state machine over a single check-in/check-out pair.
///
/// One instance per booking form; the machine owns the [`SelectionState`]
/// exclusively and mutates it only through [`CalendarSelectionMachine::click`].
#[derive(Debug)]
pub struct CalendarSelectionMachine {
    state: SelectionState,
    today: NaiveDate,
}

impl CalendarSelectionMachine {
    /// Create an empty machine; `today` anchors the past-date check.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            state: SelectionState::Empty,
            today,
        }
    }

    /// The current selection.
    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Drop any selection back to empty.
    pub fn reset(&mut self) {
        self.state = SelectionState::Empty;
    }

    /// Apply a day click against current availability.
    ///
    /// A date blocked for arrival is rejected as a check-in but always
    /// accepted as a check-out candidate: full occupancy on the departure
    /// day blocks a guest who would be arriving, not one who is leaving.
    /// Clicking at or before the pending check-in restarts selection there;
    /// a committed range restarts on any further click. Zero-night ranges
    /// can never be committed.
    pub fn click(&mut self, date: NaiveDate, overlay: &AvailabilityOverlay<'_>) -> DayClick {
        let outcome = match self.state {
            SelectionState::Empty | SelectionState::Range(_) => self.start_selection(date, overlay),
            SelectionState::CheckinOnly(checkin) => {
                if date <= checkin {
                    self.start_selection(date, overlay)
                } else {
                    match DateRange::new(checkin, date) {
                        Ok(range) => {
                            self.state = SelectionState::Range(range);

                            DayClick::RangeCommitted {
                                range,
                                requires_whole_property: overlay
                                    .requires_whole_property_booking(&range),
                            }
                        }
                        // Unreachable given date > checkin; treat as noise.
                        Err(_) => DayClick::Ignored,
                    }
                }
            }
        };

        if outcome != DayClick::Ignored {
            debug!(%date, state = ?self.state, "selection transition");
        }

        outcome
    }

    /// Commit a range directly, bypassing the two-click flow.
    ///
    /// Used when the guest edits the stay-length field instead of clicking
    /// the calendar.
    pub fn commit_range(&mut self, range: DateRange) {
        self.state = SelectionState::Range(range);
    }

    fn start_selection(&mut self, date: NaiveDate, overlay: &AvailabilityOverlay<'_>) -> DayClick {
        if self.is_valid_checkin(date, overlay) {
            self.state = SelectionState::CheckinOnly(date);
            DayClick::CheckinSet(date)
        } else {
            DayClick::Ignored
        }
    }

    fn is_valid_checkin(&self, date: NaiveDate, overlay: &AvailabilityOverlay<'_>) -> bool {
        date >= self.today && !overlay.is_checkin_blocked(date)
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::overlay::{CalendarDay, DateStatus, DayBadges};

    use super::*;

    fn date(iso: &str) -> Result<NaiveDate, chrono::ParseError> {
        iso.parse()
    }

    fn machine() -> Result<CalendarSelectionMachine, chrono::ParseError> {
        Ok(CalendarSelectionMachine::new(date("2025-05-01")?))
    }

    fn status_day(status: DateStatus, private: bool) -> CalendarDay {
        CalendarDay {
            status,
            price: None,
            is_private_event: private,
            badges: DayBadges::default(),
        }
    }

    fn overlay_with(
        days: &[(&str, CalendarDay)],
    ) -> Result<AvailabilityOverlay<'static>, chrono::ParseError> {
        let mut overlay = AvailabilityOverlay::new(GBP);
        let mut map = FxHashMap::default();

        for (iso, entry) in days {
            map.insert(date(iso)?, *entry);
        }

        overlay.absorb(map);
        Ok(overlay)
    }

    #[test]
    fn two_clicks_commit_a_range() -> TestResult {
        let overlay = AvailabilityOverlay::new(GBP);
        let mut machine = machine()?;

        let first = machine.click(date("2025-06-01")?, &overlay);
        assert_eq!(first, DayClick::CheckinSet(date("2025-06-01")?));

        let second = machine.click(date("2025-06-04")?, &overlay);
        let expected = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;

        assert_eq!(
            second,
            DayClick::RangeCommitted {
                range: expected,
                requires_whole_property: false
            }
        );
        assert_eq!(machine.state(), SelectionState::Range(expected));

        Ok(())
    }

    #[test]
    fn same_date_twice_never_commits_zero_nights() -> TestResult {
        let overlay = AvailabilityOverlay::new(GBP);
        let mut machine = machine()?;
        let day = date("2025-06-01")?;

        assert_eq!(machine.click(day, &overlay), DayClick::CheckinSet(day));
        assert_eq!(machine.click(day, &overlay), DayClick::CheckinSet(day));
        assert_eq!(machine.state(), SelectionState::CheckinOnly(day));

        Ok(())
    }

    #[test]
    fn earlier_click_restarts_checkin() -> TestResult {
        let overlay = AvailabilityOverlay::new(GBP);
        let mut machine = machine()?;

        machine.click(date("2025-06-10")?, &overlay);
        let outcome = machine.click(date("2025-06-05")?, &overlay);

        assert_eq!(outcome, DayClick::CheckinSet(date("2025-06-05")?));
        assert_eq!(
            machine.state(),
            SelectionState::CheckinOnly(date("2025-06-05")?)
        );

        Ok(())
    }

    #[test]
    fn past_dates_are_ignored_as_checkin() -> TestResult {
        let overlay = AvailabilityOverlay::new(GBP);
        let mut machine = machine()?;

        let outcome = machine.click(date("2025-04-30")?, &overlay);

        assert_eq!(outcome, DayClick::Ignored);
        assert_eq!(machine.state(), SelectionState::Empty);

        Ok(())
    }

    #[test]
    fn booked_date_rejected_for_checkin_but_valid_for_checkout() -> TestResult {
        let overlay = overlay_with(&[(
            "2025-06-04",
            status_day(DateStatus::Booked, false),
        )])?;
        let mut machine = machine()?;

        // Arriving on a fully booked day is impossible.
        assert_eq!(machine.click(date("2025-06-04")?, &overlay), DayClick::Ignored);

        // Departing on it is fine.
        machine.click(date("2025-06-01")?, &overlay);
        let outcome = machine.click(date("2025-06-04")?, &overlay);

        assert!(matches!(outcome, DayClick::RangeCommitted { .. }));

        Ok(())
    }

    #[test]
    fn committed_range_restarts_on_next_click() -> TestResult {
        let overlay = AvailabilityOverlay::new(GBP);
        let mut machine = machine()?;

        machine.click(date("2025-06-01")?, &overlay);
        machine.click(date("2025-06-04")?, &overlay);

        let outcome = machine.click(date("2025-06-10")?, &overlay);

        assert_eq!(outcome, DayClick::CheckinSet(date("2025-06-10")?));
        assert_eq!(
            machine.state(),
            SelectionState::CheckinOnly(date("2025-06-10")?)
        );

        Ok(())
    }

    #[test]
    fn private_event_night_flags_whole_property() -> TestResult {
        let overlay = overlay_with(&[(
            "2025-06-02",
            status_day(DateStatus::Free, true),
        )])?;
        let mut machine = machine()?;

        machine.click(date("2025-06-01")?, &overlay);
        let outcome = machine.click(date("2025-06-04")?, &overlay);

        match outcome {
            DayClick::RangeCommitted {
                requires_whole_property,
                ..
            } => assert!(requires_whole_property, "private-event night must force whole property"),
            other => panic!("expected committed range, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn private_event_on_checkout_day_does_not_lock() -> TestResult {
        let overlay = overlay_with(&[(
            "2025-06-04",
            status_day(DateStatus::Free, true),
        )])?;
        let mut machine = machine()?;

        machine.click(date("2025-06-01")?, &overlay);
        let outcome = machine.click(date("2025-06-04")?, &overlay);

        match outcome {
            DayClick::RangeCommitted {
                requires_whole_property,
                ..
            } => assert!(!requires_whole_property),
            other => panic!("expected committed range, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn reset_returns_to_empty() -> TestResult {
        let overlay = AvailabilityOverlay::new(GBP);
        let mut machine = machine()?;

        machine.click(date("2025-06-01")?, &overlay);
        machine.reset();

        assert_eq!(machine.state(), SelectionState::Empty);

        Ok(())
    }
}
