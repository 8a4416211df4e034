//! Innkeep
//!
//! Innkeep is a stay pricing and calendar-range selection engine for multi-unit
//! accommodation: per-night price resolution with special-pricing and early-bird
//! precedence, deposit/balance splitting, private-event lockouts, and the
//! two-click check-in/check-out selection state machine that drives them.

pub mod dates;
pub mod fixtures;
pub mod overlay;
pub mod pricing;
pub mod selection;
pub mod session;
pub mod statement;
pub mod units;
