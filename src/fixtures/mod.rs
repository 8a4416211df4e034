//! Fixtures
//!
//! YAML-backed property and calendar data for tests and demos.

use std::{fs, path::PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    dates::DateRange,
    fixtures::{calendar::CalendarFixture, property::PropertyFixture},
    overlay::CalendarDay,
    pricing::StayPricingEngine,
    session::BookingFormSession,
    units::{CatalogError, UnitCatalog, UnitKey},
};

pub mod calendar;
pub mod property;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Unit not found
    #[error("unit not found: {0}")]
    UnitNotFound(String),

    /// No property loaded yet
    #[error("no property loaded; load a property fixture first")]
    NoProperty,

    /// Catalog construction error
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Loaded fixture data: a unit catalog plus optional calendar overrides.
#[derive(Debug)]
pub struct Fixture {
    base_path: PathBuf,
    catalog: Option<UnitCatalog<'static>>,
    unit_keys: FxHashMap<String, UnitKey>,
    deposit_percent: Decimal,
    booking_date: Option<NaiveDate>,
    calendar: FxHashMap<NaiveDate, CalendarDay>,
}

impl Fixture {
    /// Create an empty fixture with the default base path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create an empty fixture with a custom base path.
    #[must_use]
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: None,
            unit_keys: FxHashMap::default(),
            deposit_percent: Decimal::ZERO,
            booking_date: None,
            calendar: FxHashMap::default(),
        }
    }

    /// Load a property (units, deposit, booking date) from a YAML fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is
    /// malformed, or the units mix currencies.
    pub fn load_property(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("property").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: PropertyFixture = serde_norway::from_str(&contents)?;

        let (catalog, unit_keys) = fixture.build_catalog()?;

        self.catalog = Some(catalog);
        self.unit_keys = unit_keys;
        self.deposit_percent = fixture.deposit_percent;
        self.booking_date = Some(fixture.booking_date);

        Ok(self)
    }

    /// Load calendar overrides from a YAML fixture, merging over any already
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_calendar(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("calendar").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CalendarFixture = serde_norway::from_str(&contents)?;

        self.calendar.extend(fixture.days);

        Ok(self)
    }

    /// Look up a unit key by its fixture identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UnitNotFound`] for unknown identifiers.
    pub fn unit_key(&self, id: &str) -> Result<UnitKey, FixtureError> {
        self.unit_keys
            .get(id)
            .copied()
            .ok_or_else(|| FixtureError::UnitNotFound(id.to_string()))
    }

    /// The booking date declared by the property fixture.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoProperty`] before a property is loaded.
    pub fn booking_date(&self) -> Result<NaiveDate, FixtureError> {
        self.booking_date.ok_or(FixtureError::NoProperty)
    }

    /// A copy of the loaded calendar days, for driving fetch flows by hand.
    #[must_use]
    pub fn calendar_days(&self) -> FxHashMap<NaiveDate, CalendarDay> {
        self.calendar.clone()
    }

    /// Build a booking session from the loaded property, with the loaded
    /// calendar already absorbed into the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoProperty`] before a property is loaded.
    pub fn into_session(self) -> Result<BookingFormSession<'static>, FixtureError> {
        let catalog = self.catalog.ok_or(FixtureError::NoProperty)?;
        let booking_date = self.booking_date.ok_or(FixtureError::NoProperty)?;

        let engine = StayPricingEngine::from_percent_points(self.deposit_percent);
        let mut session = BookingFormSession::new(catalog, engine, booking_date);

        if let Some(range) = calendar_span(&self.calendar) {
            if let Some(request) = session.overlay_request(range) {
                session.apply_overlay_response(request, Some(self.calendar));
            }
        }

        Ok(session)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest range covering every loaded calendar day.
fn calendar_span(days: &FxHashMap<NaiveDate, CalendarDay>) -> Option<DateRange> {
    let first = days.keys().min()?;
    let last = days.keys().max()?;

    DateRange::new(*first, last.succ_opt()?).ok()
}
