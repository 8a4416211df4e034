//! Availability overlay
//!
//! Read-only adapter over the backend's sparse per-date override map. Turns
//! raw calendar data into deterministic per-night price lookups for the
//! pricing engine and per-date lockout flags for the selection machine.
//! Dates with no entry are free with no override; malformed entries fail
//! open to base pricing.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use tracing::warn;

use crate::dates::DateRange;

/// Availability status of a calendar date, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStatus {
    /// Open for booking.
    #[default]
    Free,

    /// Fully booked.
    Booked,

    /// Held by a pending, unconfirmed booking.
    Pending,

    /// Blocked by the property owner.
    Blocked,

    /// Blocked by an external channel sync.
    External,
}

impl DateStatus {
    /// Whether a guest may *arrive* on a date with this status.
    ///
    /// Departure is never blocked by occupancy; only arrivals are.
    #[must_use]
    pub fn allows_checkin(self) -> bool {
        matches!(self, DateStatus::Free)
    }
}

/// Display badges attached to a calendar day by the backend.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DayBadges {
    /// Day is part of a private event.
    #[serde(default)]
    pub private: bool,

    /// Day carries special pricing.
    #[serde(default)]
    pub special: bool,
}

/// One day of the backend availability response.
///
/// `price` is in major currency units, as the calendar endpoint sends it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CalendarDay {
    /// Availability status; defaults to free.
    #[serde(default)]
    pub status: DateStatus,

    /// Special nightly price for the day, if any.
    #[serde(default)]
    pub price: Option<Decimal>,

    /// Whether the day is reserved for a private event.
    #[serde(default)]
    pub is_private_event: bool,

    /// Display badges. Informational only; the explicit flags above are
    /// authoritative, never the badge set.
    #[serde(default)]
    pub badges: DayBadges,
}

/// A sanitized per-date override.
#[derive(Debug, Clone, Copy)]
pub struct DateOverride<'a> {
    status: DateStatus,
    special_price: Option<Money<'a, Currency>>,
    is_private_event: bool,
}

impl<'a> DateOverride<'a> {
    /// The day's availability status.
    #[must_use]
    pub fn status(&self) -> DateStatus {
        self.status
    }

    /// The day's special price, if a valid one is set.
    #[must_use]
    pub fn special_price(&self) -> Option<&Money<'a, Currency>> {
        self.special_price.as_ref()
    }

    /// Whether the day is locked to a private event.
    #[must_use]
    pub fn is_private_event(&self) -> bool {
        self.is_private_event
    }
}

/// How a nightly price was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// A per-date special price override.
    Special,

    /// The unit's early-bird rate.
    EarlyBird,

    /// The unit's base rate.
    Base,
}

/// The resolved price for one unit for one calendar night.
///
/// Derived on every pricing pass; never stored across calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightlyPrice<'a> {
    /// The occupied night.
    pub date: NaiveDate,

    /// The resolved nightly price.
    pub price: Money<'a, Currency>,

    /// Which pricing tier produced the price.
    pub source: PriceSource,

    /// Whether the night falls inside a private event.
    pub is_private_event: bool,
}

/// Sparse per-date override map with price and lockout lookups.
#[derive(Debug)]
pub struct AvailabilityOverlay<'a> {
    overrides: FxHashMap<NaiveDate, DateOverride<'a>>,
    currency: &'static Currency,
}

impl<'a> AvailabilityOverlay<'a> {
    /// Create an empty overlay: every date free, no overrides.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            overrides: FxHashMap::default(),
            currency,
        }
    }

    /// Absorb a fetched calendar map, replacing existing entries per date.
    ///
    /// Malformed entries (non-positive or unrepresentable special price) are
    /// kept with the special price dropped, so the engine falls open to base
    /// pricing for those nights.
    pub fn absorb(&mut self, days: FxHashMap<NaiveDate, CalendarDay>) {
        for (date, day) in days {
            let special_price = day
                .price
                .and_then(|price| self.special_price_from_major(date, price));

            self.overrides.insert(
                date,
                DateOverride {
                    status: day.status,
                    special_price,
                    is_private_event: day.is_private_event,
                },
            );
        }
    }

    /// Convert a major-unit special price into minor-unit money, failing open
    /// on anything non-positive or out of range.
    fn special_price_from_major(
        &self,
        date: NaiveDate,
        price: Decimal,
    ) -> Option<Money<'a, Currency>> {
        if price <= Decimal::ZERO {
            warn!(%date, %price, "ignoring non-positive special price override");
            return None;
        }

        let scale = Decimal::from(10_u64.pow(self.currency.exponent));
        let minor = (price * scale)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64();

        match minor {
            Some(minor) => Some(Money::from_minor(minor, self.currency)),
            None => {
                warn!(%date, %price, "ignoring unrepresentable special price override");
                None
            }
        }
    }

    /// The sanitized override for a date, if the backend sent one.
    #[must_use]
    pub fn override_for(&self, date: NaiveDate) -> Option<&DateOverride<'a>> {
        self.overrides.get(&date)
    }

    /// The valid special price for a date, if any.
    #[must_use]
    pub fn special_price_for(&self, date: NaiveDate) -> Option<&Money<'a, Currency>> {
        self.overrides.get(&date).and_then(DateOverride::special_price)
    }

    /// Whether a date is locked to a private event.
    #[must_use]
    pub fn is_private_event_locked(&self, date: NaiveDate) -> bool {
        self.overrides
            .get(&date)
            .is_some_and(DateOverride::is_private_event)
    }

    /// Whether a stay over `range` must book the entire property.
    ///
    /// True iff any occupied night is private-event locked. The check-out
    /// date is excluded: the guest departs that day and does not occupy it.
    #[must_use]
    pub fn requires_whole_property_booking(&self, range: &DateRange) -> bool {
        range
            .iter_nights()
            .any(|night| self.is_private_event_locked(night))
    }

    /// The single flat special price covering every occupied night of
    /// `range`, if one exists.
    ///
    /// A property-wide flat rate supersedes individual unit pricing; it only
    /// applies when every night carries the same valid special price.
    #[must_use]
    pub fn flat_special_price(&self, range: &DateRange) -> Option<Money<'a, Currency>> {
        let mut flat: Option<Money<'a, Currency>> = None;

        for night in range.iter_nights() {
            let price = *self.special_price_for(night)?;

            match flat {
                None => flat = Some(price),
                Some(existing) if existing == price => {}
                Some(_) => return None,
            }
        }

        flat
    }

    /// Whether a date is unusable as a check-in day.
    ///
    /// A fully occupied date still works as a check-out: occupancy blocks a
    /// guest who would be arriving, not one who is leaving.
    #[must_use]
    pub fn is_checkin_blocked(&self, date: NaiveDate) -> bool {
        self.overrides
            .get(&date)
            .is_some_and(|entry| !entry.status().allows_checkin())
    }

    /// Resolve one unit's price for one night.
    ///
    /// Precedence, strictly in this order: a valid special price for the
    /// night; else the early-bird rate when the booking is eligible and the
    /// rate undercuts base; else the base rate. Violating this order
    /// silently produces wrong totals, so nothing else may pick a nightly
    /// price.
    #[must_use]
    pub fn nightly_price(
        &self,
        date: NaiveDate,
        base_price: Money<'a, Currency>,
        early_bird_price: Option<Money<'a, Currency>>,
        early_bird_eligible: bool,
    ) -> NightlyPrice<'a> {
        let is_private_event = self.is_private_event_locked(date);

        if let Some(special) = self.special_price_for(date) {
            return NightlyPrice {
                date,
                price: *special,
                source: PriceSource::Special,
                is_private_event,
            };
        }

        if early_bird_eligible {
            if let Some(early) = early_bird_price {
                if early.to_minor_units() < base_price.to_minor_units() {
                    return NightlyPrice {
                        date,
                        price: early,
                        source: PriceSource::EarlyBird,
                        is_private_event,
                    };
                }
            }
        }

        NightlyPrice {
            date,
            price: base_price,
            source: PriceSource::Base,
            is_private_event,
        }
    }

    /// Number of dates carrying an override.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether the overlay carries no overrides at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// The overlay currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
