//! Stay pricing
//!
//! Pure computation of a [`PricingBreakdown`] from a resolved date range, the
//! guest's unit selection, the unit catalog and the availability overlay.
//! The engine owns nothing across calls; every pass recomputes from scratch.

use chrono::NaiveDate;
use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    dates::DateRange,
    overlay::{AvailabilityOverlay, NightlyPrice, PriceSource},
    units::{UnitCatalog, UnitKey, UnitSelection},
};

/// Errors that can occur while computing a pricing breakdown.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The deposit percentage could not be applied to the total.
    #[error("deposit percentage could not be safely applied to the total")]
    DepositConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Aggregate pricing result for a stay.
///
/// `discount` is the informational early-bird saving: the nightly prices in
/// `per_unit_nightly` already reflect the discounted rate, so `total` equals
/// `subtotal` and the discount is never subtracted a second time.
#[derive(Debug, Clone)]
pub struct PricingBreakdown<'a> {
    subtotal: Money<'a, Currency>,
    discount: Money<'a, Currency>,
    total: Money<'a, Currency>,
    deposit: Money<'a, Currency>,
    balance: Money<'a, Currency>,
    per_unit_nightly: FxHashMap<UnitKey, Vec<NightlyPrice<'a>>>,
    submittable: bool,
    currency: &'static Currency,
}

impl<'a> PricingBreakdown<'a> {
    /// The all-zero breakdown: valid for display, not submittable.
    #[must_use]
    pub fn zero(currency: &'static Currency) -> Self {
        let nothing = Money::from_minor(0, currency);

        Self {
            subtotal: nothing,
            discount: nothing,
            total: nothing,
            deposit: nothing,
            balance: nothing,
            per_unit_nightly: FxHashMap::default(),
            submittable: false,
            currency,
        }
    }

    /// Sum of all resolved nightly prices.
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Early-bird savings already baked into the subtotal. Display only.
    #[must_use]
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// Amount payable for the stay. Always equals the subtotal.
    #[must_use]
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Deposit due at booking time.
    #[must_use]
    pub fn deposit(&self) -> Money<'a, Currency> {
        self.deposit
    }

    /// Balance due later; `deposit + balance` equals `total` exactly.
    #[must_use]
    pub fn balance(&self) -> Money<'a, Currency> {
        self.balance
    }

    /// Resolved nightly prices for one unit, in night order.
    #[must_use]
    pub fn nights_for(&self, unit: UnitKey) -> Option<&[NightlyPrice<'a>]> {
        self.per_unit_nightly.get(&unit).map(Vec::as_slice)
    }

    /// All priced units with their nightly series.
    pub fn iter_units(&self) -> impl Iterator<Item = (UnitKey, &[NightlyPrice<'a>])> {
        self.per_unit_nightly
            .iter()
            .map(|(key, nights)| (*key, nights.as_slice()))
    }

    /// Whether the breakdown covers a selection a guest could submit.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        self.submittable
    }

    /// The breakdown currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// Pure pricing engine with a configured deposit percentage.
#[derive(Debug, Clone, Copy)]
pub struct StayPricingEngine {
    deposit_percent: Percentage,
}

impl StayPricingEngine {
    /// Create an engine from a fractional deposit percentage (`0.5` = 50%).
    #[must_use]
    pub fn new(deposit_percent: Percentage) -> Self {
        Self { deposit_percent }
    }

    /// Create an engine from deposit percent points (`50` = 50%).
    #[must_use]
    pub fn from_percent_points(points: Decimal) -> Self {
        Self::new(Percentage::from(points / Decimal::ONE_HUNDRED))
    }

    /// Compute the breakdown for a stay.
    ///
    /// Empty selections yield the zero breakdown rather than an error; a
    /// stale click must never take the booking form down. Units selected but
    /// missing from the catalog are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if money arithmetic fails (currency
    /// mismatch between catalog and overlay) or the deposit percentage
    /// cannot be applied.
    pub fn breakdown<'a>(
        &self,
        range: &DateRange,
        selection: &UnitSelection,
        catalog: &UnitCatalog<'a>,
        overlay: &AvailabilityOverlay<'a>,
        booking_date: NaiveDate,
    ) -> Result<PricingBreakdown<'a>, PricingError> {
        let currency = catalog.currency();
        let keys = selection.resolve(catalog);

        if keys.is_empty() || range.nights() == 0 {
            return Ok(PricingBreakdown::zero(currency));
        }

        // A property-wide flat rate covering every night supersedes each
        // unit's own pricing; the per-unit multiplication still applies.
        let flat_special = if selection.is_whole_property() {
            overlay.flat_special_price(range)
        } else {
            None
        };

        let mut per_unit_nightly = FxHashMap::default();
        let mut subtotal = Money::from_minor(0, currency);
        let mut discount_minor = 0_i64;

        for key in keys {
            let Some(unit) = catalog.get(key) else {
                warn!(?key, "selected unit missing from catalog; skipping");
                continue;
            };

            let eligible = unit.early_bird_eligible(booking_date);
            let mut nights = Vec::with_capacity(usize::try_from(range.nights()).unwrap_or(0));

            for night in range.iter_nights() {
                let nightly = match flat_special {
                    Some(flat) => NightlyPrice {
                        date: night,
                        price: flat,
                        source: PriceSource::Special,
                        is_private_event: overlay.is_private_event_locked(night),
                    },
                    None => overlay.nightly_price(
                        night,
                        *unit.base_price(),
                        unit.early_bird_price().copied(),
                        eligible,
                    ),
                };

                if nightly.source == PriceSource::EarlyBird {
                    discount_minor +=
                        unit.base_price().to_minor_units() - nightly.price.to_minor_units();
                }

                subtotal = subtotal.add(nightly.price)?;
                nights.push(nightly);
            }

            per_unit_nightly.insert(key, nights);
        }

        if per_unit_nightly.is_empty() {
            return Ok(PricingBreakdown::zero(currency));
        }

        // Total equals subtotal: nightly prices already carry the early-bird
        // rate, and subtracting the discount again double-discounts.
        let total_minor = subtotal.to_minor_units().max(0);
        let total = Money::from_minor(total_minor, currency);

        let deposit_minor = self.deposit_minor(total_minor)?;
        let deposit = Money::from_minor(deposit_minor, currency);

        // Balance takes the rounding remainder so the sum is exact.
        let balance = Money::from_minor(total_minor - deposit_minor, currency);

        debug!(
            range = %range,
            subtotal = subtotal.to_minor_units(),
            discount = discount_minor,
            deposit = deposit_minor,
            "priced stay"
        );

        Ok(PricingBreakdown {
            subtotal,
            discount: Money::from_minor(discount_minor, currency),
            total,
            deposit,
            balance,
            per_unit_nightly,
            submittable: true,
            currency,
        })
    }

    /// Deposit in minor units, rounded half away from zero.
    fn deposit_minor(&self, total_minor: i64) -> Result<i64, PricingError> {
        let deposit = (self.deposit_percent * Decimal::from(total_minor))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        deposit.to_i64().ok_or(PricingError::DepositConversion)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{overlay::CalendarDay, units::AccommodationUnit};

    use super::*;

    fn date(iso: &str) -> Result<NaiveDate, chrono::ParseError> {
        iso.parse()
    }

    fn special_day(price: Decimal) -> CalendarDay {
        CalendarDay {
            status: crate::overlay::DateStatus::Free,
            price: Some(price),
            is_private_event: false,
            badges: crate::overlay::DayBadges::default(),
        }
    }

    fn engine_half_deposit() -> StayPricingEngine {
        StayPricingEngine::from_percent_points(Decimal::from(50))
    }

    #[test]
    fn three_nights_base_only() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        let unit = catalog.add(AccommodationUnit::new(
            "Suite",
            Money::from_minor(10_000, GBP),
        ))?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;
        let selection = UnitSelection::Units(smallvec::smallvec![unit]);

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &selection,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        assert_eq!(breakdown.subtotal(), Money::from_minor(30_000, GBP));
        assert_eq!(breakdown.discount(), Money::from_minor(0, GBP));
        assert_eq!(breakdown.total(), Money::from_minor(30_000, GBP));
        assert_eq!(breakdown.deposit(), Money::from_minor(15_000, GBP));
        assert_eq!(breakdown.balance(), Money::from_minor(15_000, GBP));
        assert!(breakdown.is_submittable());

        Ok(())
    }

    #[test]
    fn special_price_night_replaces_base() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        let unit = catalog.add(AccommodationUnit::new(
            "Suite",
            Money::from_minor(10_000, GBP),
        ))?;

        let mut overlay = AvailabilityOverlay::new(GBP);
        let mut days = FxHashMap::default();
        days.insert(date("2025-06-02")?, special_day(Decimal::from(80)));
        overlay.absorb(days);

        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;
        let selection = UnitSelection::Units(smallvec::smallvec![unit]);

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &selection,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        let nightly: Vec<i64> = breakdown
            .nights_for(unit)
            .map(|nights| nights.iter().map(|n| n.price.to_minor_units()).collect())
            .unwrap_or_default();

        assert_eq!(nightly, vec![10_000, 8_000, 10_000]);
        assert_eq!(breakdown.subtotal(), Money::from_minor(28_000, GBP));

        Ok(())
    }

    #[test]
    fn early_bird_discount_is_informational_only() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        let unit = catalog.add(
            AccommodationUnit::new("Suite", Money::from_minor(10_000, GBP))
                .with_early_bird(Money::from_minor(8_000, GBP), date("2025-05-15")?),
        )?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;
        let selection = UnitSelection::Units(smallvec::smallvec![unit]);

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &selection,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        // Subtotal already reflects the discounted rate; total equals it.
        assert_eq!(breakdown.subtotal(), Money::from_minor(24_000, GBP));
        assert_eq!(breakdown.discount(), Money::from_minor(6_000, GBP));
        assert_eq!(breakdown.total(), Money::from_minor(24_000, GBP));

        Ok(())
    }

    #[test]
    fn mixed_eligibility_is_per_unit() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);

        let early = catalog.add(
            AccommodationUnit::new("Early", Money::from_minor(10_000, GBP))
                .with_early_bird(Money::from_minor(8_000, GBP), date("2025-06-01")?),
        )?;

        let lapsed = catalog.add(
            AccommodationUnit::new("Lapsed", Money::from_minor(10_000, GBP))
                .with_early_bird(Money::from_minor(8_000, GBP), date("2025-04-01")?),
        )?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-03")?)?;
        let selection = UnitSelection::Units(smallvec::smallvec![early, lapsed]);

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &selection,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        let source_of = |key| {
            breakdown
                .nights_for(key)
                .and_then(|nights| nights.first())
                .map(|night| night.source)
        };

        assert_eq!(source_of(early), Some(PriceSource::EarlyBird));
        assert_eq!(source_of(lapsed), Some(PriceSource::Base));
        assert_eq!(breakdown.subtotal(), Money::from_minor(36_000, GBP));
        assert_eq!(breakdown.discount(), Money::from_minor(4_000, GBP));

        Ok(())
    }

    #[test]
    fn empty_selection_yields_zero_breakdown() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        catalog.add(AccommodationUnit::new(
            "Suite",
            Money::from_minor(10_000, GBP),
        ))?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &UnitSelection::None,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        assert_eq!(breakdown.total(), Money::from_minor(0, GBP));
        assert!(!breakdown.is_submittable());

        Ok(())
    }

    #[test]
    fn whole_property_multiplies_units() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        catalog.add(AccommodationUnit::new("A", Money::from_minor(10_000, GBP)))?;
        catalog.add(AccommodationUnit::new("B", Money::from_minor(12_000, GBP)))?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-03")?)?;

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &UnitSelection::WholeProperty,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        // 2 nights x (100.00 + 120.00)
        assert_eq!(breakdown.subtotal(), Money::from_minor(44_000, GBP));

        Ok(())
    }

    #[test]
    fn whole_property_flat_special_overrides_unit_rates() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        catalog.add(
            AccommodationUnit::new("A", Money::from_minor(10_000, GBP))
                .with_early_bird(Money::from_minor(8_000, GBP), date("2025-06-01")?),
        )?;
        catalog.add(AccommodationUnit::new("B", Money::from_minor(12_000, GBP)))?;

        let mut overlay = AvailabilityOverlay::new(GBP);
        let mut days = FxHashMap::default();
        days.insert(date("2025-06-01")?, special_day(Decimal::from(150)));
        days.insert(date("2025-06-02")?, special_day(Decimal::from(150)));
        overlay.absorb(days);

        let range = DateRange::new(date("2025-06-01")?, date("2025-06-03")?)?;

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &UnitSelection::WholeProperty,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        // Flat 150.00 per unit per night: 2 units x 2 nights.
        assert_eq!(breakdown.subtotal(), Money::from_minor(60_000, GBP));
        assert_eq!(breakdown.discount(), Money::from_minor(0, GBP));

        for (_, nights) in breakdown.iter_units() {
            assert!(nights.iter().all(|n| n.source == PriceSource::Special));
        }

        Ok(())
    }

    #[test]
    fn deposit_remainder_lands_on_the_balance() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        let unit = catalog.add(AccommodationUnit::new(
            "Suite",
            Money::from_minor(10_001, GBP),
        ))?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-02")?)?;
        let selection = UnitSelection::Units(smallvec::smallvec![unit]);

        let breakdown = engine_half_deposit().breakdown(
            &range,
            &selection,
            &catalog,
            &overlay,
            date("2025-05-01")?,
        )?;

        // 10001 at 50%: deposit rounds to 5001, balance takes 5000.
        assert_eq!(breakdown.deposit(), Money::from_minor(5_001, GBP));
        assert_eq!(breakdown.balance(), Money::from_minor(5_000, GBP));

        let sum = breakdown.deposit().add(breakdown.balance())?;
        assert_eq!(sum, breakdown.total());

        Ok(())
    }

    #[test]
    fn deposit_split_is_exact_across_percentages() -> TestResult {
        let mut catalog = UnitCatalog::new(GBP);
        let unit = catalog.add(AccommodationUnit::new(
            "Suite",
            Money::from_minor(9_999, GBP),
        ))?;

        let overlay = AvailabilityOverlay::new(GBP);
        let range = DateRange::new(date("2025-06-01")?, date("2025-06-04")?)?;
        let selection = UnitSelection::Units(smallvec::smallvec![unit]);

        for points in [10, 15, 25, 30, 33, 50, 66, 75, 100] {
            let engine = StayPricingEngine::from_percent_points(Decimal::from(points));
            let breakdown =
                engine.breakdown(&range, &selection, &catalog, &overlay, date("2025-05-01")?)?;

            let sum = breakdown.deposit().add(breakdown.balance())?;
            assert_eq!(sum, breakdown.total(), "exact split at {points}%");
        }

        Ok(())
    }
}
