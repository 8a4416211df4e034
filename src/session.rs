//! Booking form session
//!
//! One [`BookingFormSession`] per booking form on the page. The session owns
//! the selection machine, the pricing engine configuration, the unit catalog,
//! the availability overlay and the last computed breakdown; the UI layer is
//! a thin adapter that forwards events here and renders what comes back.
//! Nothing in this module is fatal: every failure path leaves the session
//! interactive with a safe breakdown in place.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    dates::DateRange,
    overlay::{AvailabilityOverlay, CalendarDay},
    pricing::{PricingBreakdown, StayPricingEngine},
    selection::{CalendarSelectionMachine, DayClick, SelectionState},
    units::{UnitCatalog, UnitKey, UnitSelection},
};

/// Result of a day click, for the UI layer to render.
#[derive(Debug)]
pub struct DateClickResponse<'s, 'a> {
    /// Selection state after the click.
    pub state: SelectionState,

    /// The breakdown for the committed range, or `None` while no range is
    /// selected.
    pub breakdown: Option<&'s PricingBreakdown<'a>>,

    /// Whether this click forced whole-property booking, clearing any
    /// individually selected units.
    pub forced_whole_property: bool,
}

/// A coalesced availability fetch the host should perform.
///
/// Produced by [`BookingFormSession::overlay_request`]; hand the backend's
/// answer back via [`BookingFormSession::apply_overlay_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRequest {
    range: DateRange,
}

impl OverlayRequest {
    /// The date range the fetch should cover.
    #[must_use]
    pub fn range(&self) -> DateRange {
        self.range
    }
}

/// Session state for a single booking form.
#[derive(Debug)]
pub struct BookingFormSession<'a> {
    catalog: UnitCatalog<'a>,
    overlay: AvailabilityOverlay<'a>,
    engine: StayPricingEngine,
    machine: CalendarSelectionMachine,
    selection: UnitSelection,
    breakdown: PricingBreakdown<'a>,
    forced_whole_property: bool,
    booking_date: NaiveDate,
    in_flight: Option<DateRange>,
    stale_data: bool,
}

impl<'a> BookingFormSession<'a> {
    /// Create a session over a catalog.
    ///
    /// `booking_date` is the day the guest is booking on; it anchors both
    /// early-bird eligibility and the past-date click check.
    #[must_use]
    pub fn new(
        catalog: UnitCatalog<'a>,
        engine: StayPricingEngine,
        booking_date: NaiveDate,
    ) -> Self {
        let currency = catalog.currency();

        Self {
            overlay: AvailabilityOverlay::new(currency),
            machine: CalendarSelectionMachine::new(booking_date),
            engine,
            selection: UnitSelection::None,
            breakdown: PricingBreakdown::zero(currency),
            forced_whole_property: false,
            booking_date,
            in_flight: None,
            stale_data: false,
            catalog,
        }
    }

    /// The unit catalog.
    #[must_use]
    pub fn catalog(&self) -> &UnitCatalog<'a> {
        &self.catalog
    }

    /// The current availability overlay.
    #[must_use]
    pub fn overlay(&self) -> &AvailabilityOverlay<'a> {
        &self.overlay
    }

    /// Current selection state of the calendar.
    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.machine.state()
    }

    /// Current unit selection.
    #[must_use]
    pub fn selection(&self) -> &UnitSelection {
        &self.selection
    }

    /// The most recently computed breakdown.
    #[must_use]
    pub fn breakdown(&self) -> &PricingBreakdown<'a> {
        &self.breakdown
    }

    /// Whether the overlay may be out of date after a failed fetch.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale_data
    }

    /// Handle a calendar day click.
    ///
    /// Commits, restarts or ignores per the selection machine's rules. When
    /// a committed range contains a private-event night, any individually
    /// selected units are cleared and replaced by the whole-property flag
    /// before repricing, never silently kept.
    pub fn on_date_clicked(&mut self, date: NaiveDate) -> DateClickResponse<'_, 'a> {
        let outcome = self.machine.click(date, &self.overlay);

        match outcome {
            DayClick::RangeCommitted {
                range,
                requires_whole_property,
            } => {
                self.apply_whole_property_lock(requires_whole_property);
                self.reprice(Some(range));
            }
            DayClick::CheckinSet(_) => {
                // Half-selected: previous range's breakdown no longer applies.
                self.forced_whole_property = false;
                self.breakdown = PricingBreakdown::zero(self.catalog.currency());
            }
            DayClick::Ignored => {}
        }

        DateClickResponse {
            state: self.machine.state(),
            breakdown: self.current_breakdown(),
            forced_whole_property: self.forced_whole_property,
        }
    }

    /// Handle a unit checkbox toggle; returns the refreshed breakdown.
    ///
    /// Toggles are ignored while the selected range forces whole-property
    /// booking.
    pub fn on_unit_toggled(&mut self, unit: UnitKey, checked: bool) -> &PricingBreakdown<'a> {
        if self.forced_whole_property {
            debug!(?unit, "ignoring unit toggle while whole property is forced");
            return &self.breakdown;
        }

        self.selection.toggle(unit, checked);

        if let SelectionState::Range(range) = self.machine.state() {
            self.reprice(Some(range));
        }

        &self.breakdown
    }

    /// Handle an edit of the stay-length field.
    ///
    /// Recomputes the check-out from the pending check-in plus `nights` and
    /// reprices. Returns the new range, or `None` when there is no check-in
    /// to extend or the length is invalid.
    pub fn on_duration_changed(&mut self, nights: u32) -> Option<DateRange> {
        let checkin = match self.machine.state() {
            SelectionState::CheckinOnly(date) => date,
            SelectionState::Range(range) => range.checkin(),
            SelectionState::Empty => return None,
        };

        let range = DateRange::with_nights(checkin, nights).ok()?;

        self.machine.commit_range(range);
        let locked = self.overlay.requires_whole_property_booking(&range);
        self.apply_whole_property_lock(locked);
        self.reprice(Some(range));

        Some(range)
    }

    /// Ask for an availability fetch covering `range`.
    ///
    /// Returns `None` when an identical fetch is already in flight; the new
    /// request is coalesced into it.
    pub fn overlay_request(&mut self, range: DateRange) -> Option<OverlayRequest> {
        if self.in_flight == Some(range) {
            debug!(%range, "suppressing duplicate availability fetch");
            return None;
        }

        self.in_flight = Some(range);
        Some(OverlayRequest { range })
    }

    /// Apply the outcome of an availability fetch.
    ///
    /// Fetched data is absorbed even when the guest has moved to a different
    /// range since the request went out; it is valid calendar data either
    /// way. Pricing is always recomputed against the *current* range. A
    /// failed fetch keeps the last-known-good overlay and marks the session
    /// stale without clearing any UI state.
    pub fn apply_overlay_response(
        &mut self,
        request: OverlayRequest,
        response: Option<FxHashMap<NaiveDate, CalendarDay>>,
    ) {
        if self.in_flight == Some(request.range) {
            self.in_flight = None;
        }

        match response {
            Some(days) => {
                self.overlay.absorb(days);
                self.stale_data = false;

                if let SelectionState::Range(range) = self.machine.state() {
                    let locked = self.overlay.requires_whole_property_booking(&range);
                    self.apply_whole_property_lock(locked);
                    self.reprice(Some(range));
                }
            }
            None => {
                warn!(range = %request.range, "availability fetch failed; keeping last-known data");
                self.stale_data = true;
            }
        }
    }

    /// Force-clear individual selections when a range becomes private-event
    /// locked; release the lock (keeping whole-property selected) otherwise.
    fn apply_whole_property_lock(&mut self, locked: bool) {
        if locked {
            if !self.selection.is_whole_property() {
                debug!("clearing individual unit selection for private-event range");
                self.selection = UnitSelection::WholeProperty;
            }

            self.forced_whole_property = true;
        } else {
            self.forced_whole_property = false;
        }
    }

    fn reprice(&mut self, range: Option<DateRange>) {
        let currency = self.catalog.currency();

        let Some(range) = range else {
            self.breakdown = PricingBreakdown::zero(currency);
            return;
        };

        match self.engine.breakdown(
            &range,
            &self.selection,
            &self.catalog,
            &self.overlay,
            self.booking_date,
        ) {
            Ok(breakdown) => self.breakdown = breakdown,
            Err(error) => {
                // Pricing must never take the form down; fall back to zero.
                warn!(%error, "pricing failed; falling back to zero breakdown");
                self.breakdown = PricingBreakdown::zero(currency);
            }
        }
    }

    fn current_breakdown(&self) -> Option<&PricingBreakdown<'a>> {
        match self.machine.state() {
            SelectionState::Range(_) => Some(&self.breakdown),
            SelectionState::Empty | SelectionState::CheckinOnly(_) => None,
        }
    }
}
