//! Booking statement
//!
//! Renders a [`PricingBreakdown`] as a terminal table: one line per unit per
//! night with the resolved price and its source, followed by the subtotal,
//! early-bird savings, total and deposit/balance split. Pure display; the
//! numbers come straight from the breakdown.

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    overlay::PriceSource,
    pricing::PricingBreakdown,
    units::UnitCatalog,
};

/// Errors that can occur while rendering a statement.
#[derive(Debug, Error)]
pub enum StatementError {
    /// Writing the rendered statement failed.
    #[error("failed to write statement")]
    Io(#[from] io::Error),
}

fn source_label(source: PriceSource) -> &'static str {
    match source {
        PriceSource::Special => "special",
        PriceSource::EarlyBird => "early bird",
        PriceSource::Base => "base",
    }
}

/// Write a statement for `breakdown` to `out`.
///
/// Units are listed in catalog order; units without nights in the breakdown
/// are omitted. Unknown unit keys render under a placeholder name rather
/// than failing the whole statement.
///
/// # Errors
///
/// Returns [`StatementError::Io`] if writing to `out` fails.
pub fn write_statement(
    out: &mut impl io::Write,
    breakdown: &PricingBreakdown<'_>,
    catalog: &UnitCatalog<'_>,
) -> Result<(), StatementError> {
    let mut builder = Builder::default();
    builder.push_record(["Unit", "Night", "Price", "Source"]);

    for key in catalog.keys() {
        let Some(nights) = breakdown.nights_for(key) else {
            continue;
        };

        let name = catalog.get(key).map_or("(unknown unit)", |u| u.name());

        for (idx, night) in nights.iter().enumerate() {
            let unit_cell = if idx == 0 { name.to_string() } else { String::new() };

            builder.push_record([
                unit_cell,
                night.date.to_string(),
                night.price.to_string(),
                source_label(night.source).to_string(),
            ]);
        }
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.modify(Columns::new(2..3), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(out, "  Subtotal:           {}", breakdown.subtotal())?;
    writeln!(out, "  Early-bird savings: {}", breakdown.discount())?;
    writeln!(out, "  Total:              {}", breakdown.total())?;
    writeln!(out, "  Deposit due now:    {}", breakdown.deposit())?;
    writeln!(out, "  Balance remaining:  {}", breakdown.balance())?;

    Ok(())
}
