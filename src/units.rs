//! Accommodation units

use chrono::NaiveDate;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

new_key_type! {
    /// Accommodation Unit Key
    pub struct UnitKey;
}

/// Errors related to unit catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A unit's price currency differs from the catalog currency.
    #[error("unit '{0}' has currency {1}, but catalog has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),
}

/// A bookable accommodation unit with its configured rates.
#[derive(Debug, Clone)]
pub struct AccommodationUnit<'a> {
    name: String,
    base_price: Money<'a, Currency>,
    early_bird_price: Option<Money<'a, Currency>>,
    early_bird_cutoff: Option<NaiveDate>,
}

impl<'a> AccommodationUnit<'a> {
    /// Create a unit with a base nightly rate and no early-bird offer.
    #[must_use]
    pub fn new(name: impl Into<String>, base_price: Money<'a, Currency>) -> Self {
        Self {
            name: name.into(),
            base_price,
            early_bird_price: None,
            early_bird_cutoff: None,
        }
    }

    /// Attach an early-bird rate, valid for bookings made strictly before `cutoff`.
    #[must_use]
    pub fn with_early_bird(mut self, price: Money<'a, Currency>, cutoff: NaiveDate) -> Self {
        self.early_bird_price = Some(price);
        self.early_bird_cutoff = Some(cutoff);
        self
    }

    /// The unit's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base nightly rate.
    #[must_use]
    pub fn base_price(&self) -> &Money<'a, Currency> {
        &self.base_price
    }

    /// The early-bird nightly rate, if the unit has one.
    #[must_use]
    pub fn early_bird_price(&self) -> Option<&Money<'a, Currency>> {
        self.early_bird_price.as_ref()
    }

    /// Whether a booking made on `booking_date` qualifies for this unit's
    /// early-bird rate.
    ///
    /// Eligibility requires an early-bird rate that genuinely undercuts the
    /// base rate and a booking date strictly before the unit's cutoff. Each
    /// unit is evaluated independently; cutoffs are never shared.
    #[must_use]
    pub fn early_bird_eligible(&self, booking_date: NaiveDate) -> bool {
        match (&self.early_bird_price, self.early_bird_cutoff) {
            (Some(early), Some(cutoff)) => {
                booking_date < cutoff
                    && early.to_minor_units() < self.base_price.to_minor_units()
            }
            _ => false,
        }
    }
}

/// The property's catalog of bookable units, all priced in one currency.
#[derive(Debug)]
pub struct UnitCatalog<'a> {
    units: SlotMap<UnitKey, AccommodationUnit<'a>>,
    currency: &'static Currency,
}

impl<'a> UnitCatalog<'a> {
    /// Create an empty catalog for the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            units: SlotMap::with_key(),
            currency,
        }
    }

    /// Add a unit to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CurrencyMismatch`] if the unit's base or
    /// early-bird price is not in the catalog currency.
    pub fn add(&mut self, unit: AccommodationUnit<'a>) -> Result<UnitKey, CatalogError> {
        self.check_currency(&unit, unit.base_price.currency())?;

        if let Some(early) = &unit.early_bird_price {
            self.check_currency(&unit, early.currency())?;
        }

        Ok(self.units.insert(unit))
    }

    fn check_currency(
        &self,
        unit: &AccommodationUnit<'a>,
        currency: &Currency,
    ) -> Result<(), CatalogError> {
        if currency == self.currency {
            Ok(())
        } else {
            Err(CatalogError::CurrencyMismatch(
                unit.name.clone(),
                currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ))
        }
    }

    /// Look up a unit by key.
    #[must_use]
    pub fn get(&self, key: UnitKey) -> Option<&AccommodationUnit<'a>> {
        self.units.get(key)
    }

    /// Iterate all units with their keys, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitKey, &AccommodationUnit<'a>)> {
        self.units.iter()
    }

    /// All unit keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = UnitKey> {
        self.units.keys()
    }

    /// Number of units in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the catalog has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The catalog currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// Which units the guest has chosen for the stay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnitSelection {
    /// Nothing selected yet; a breakdown is displayable but not submittable.
    #[default]
    None,

    /// Specific units, in the order they were picked.
    Units(SmallVec<[UnitKey; 4]>),

    /// The entire property: every catalog unit at once.
    WholeProperty,
}

impl UnitSelection {
    /// Toggle an individual unit on or off.
    ///
    /// Toggling a unit on while the whole property is selected narrows the
    /// selection down to just that unit; the whole-property choice is a
    /// distinct state, not a shorthand for "all boxes ticked".
    pub fn toggle(&mut self, key: UnitKey, checked: bool) {
        match self {
            UnitSelection::Units(keys) => {
                if checked {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                } else {
                    keys.retain(|k| *k != key);

                    if keys.is_empty() {
                        *self = UnitSelection::None;
                    }
                }
            }
            UnitSelection::None | UnitSelection::WholeProperty => {
                if checked {
                    *self = UnitSelection::Units(SmallVec::from_slice(&[key]));
                }
            }
        }
    }

    /// Whether no unit is selected at all.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, UnitSelection::None)
    }

    /// Whether the whole property is selected.
    #[must_use]
    pub fn is_whole_property(&self) -> bool {
        matches!(self, UnitSelection::WholeProperty)
    }

    /// Resolve the selection to concrete unit keys against a catalog.
    #[must_use]
    pub fn resolve(&self, catalog: &UnitCatalog<'_>) -> SmallVec<[UnitKey; 4]> {
        match self {
            UnitSelection::None => SmallVec::new(),
            UnitSelection::Units(keys) => keys.clone(),
            UnitSelection::WholeProperty => catalog.keys().collect(),
        }
    }
}
