//! Property fixtures

use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    units::{AccommodationUnit, UnitCatalog, UnitKey},
};

/// Wrapper for a property definition in YAML.
#[derive(Debug, Deserialize)]
pub struct PropertyFixture {
    /// Deposit percentage in percent points (`50` = 50%).
    pub deposit_percent: Decimal,

    /// The day the guest is booking on.
    pub booking_date: NaiveDate,

    /// Map of unit id -> unit fixture.
    pub units: FxHashMap<String, UnitFixture>,
}

/// One unit definition in YAML.
#[derive(Debug, Deserialize)]
pub struct UnitFixture {
    /// Unit display name.
    pub name: String,

    /// Base nightly rate, e.g. `"GBP 100.00"`.
    pub base_price: String,

    /// Early-bird nightly rate, if offered.
    #[serde(default)]
    pub early_bird_price: Option<String>,

    /// Early-bird cutoff date; bookings strictly before qualify.
    #[serde(default)]
    pub early_bird_cutoff: Option<NaiveDate>,
}

impl PropertyFixture {
    /// Build the unit catalog and the id -> key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed prices, unknown currencies, or a
    /// currency mismatch between units.
    pub fn build_catalog(
        &self,
    ) -> Result<(UnitCatalog<'static>, FxHashMap<String, UnitKey>), FixtureError> {
        let mut currency: Option<&'static Currency> = None;
        let mut parsed: Vec<(&String, Money<'static, Currency>, &UnitFixture)> = Vec::new();

        for (id, unit) in &self.units {
            let (minor, unit_currency) = parse_price(&unit.base_price)?;
            currency.get_or_insert(unit_currency);
            parsed.push((id, Money::from_minor(minor, unit_currency), unit));
        }

        let currency = currency.ok_or(FixtureError::NoProperty)?;
        let mut catalog = UnitCatalog::new(currency);
        let mut keys = FxHashMap::default();

        // Sort by id so catalog insertion order is stable across runs.
        parsed.sort_by(|a, b| a.0.cmp(b.0));

        for (id, base_price, fixture) in parsed {
            let mut unit = AccommodationUnit::new(fixture.name.clone(), base_price);

            if let (Some(price), Some(cutoff)) =
                (&fixture.early_bird_price, fixture.early_bird_cutoff)
            {
                let (minor, early_currency) = parse_price(price)?;
                unit = unit.with_early_bird(Money::from_minor(minor, early_currency), cutoff);
            }

            let key = catalog.add(unit)?;
            keys.insert(id.clone(), key);
        }

        Ok((catalog, keys))
    }
}

/// Parse a `"GBP 100.00"` style price into minor units and its currency.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPrice`] for malformed amounts and
/// [`FixtureError::UnknownCurrency`] for unrecognized codes.
pub fn parse_price(raw: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = raw.split_whitespace();

    let (Some(code), Some(amount), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(raw.to_string()));
    };

    let currency = iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    let amount: Decimal = amount
        .parse()
        .map_err(|_err| FixtureError::InvalidPrice(raw.to_string()))?;

    let scale = Decimal::from(10_u64.pow(currency.exponent));
    let minor = (amount * scale)
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| FixtureError::InvalidPrice(raw.to_string()))?;

    Ok((minor, currency))
}
