//! Hearth
//!
//! Hearth is the pricing core of a bakery backend: promotion validity and
//! discount calculation, order total reconciliation, and the loyalty tier and
//! points ledger.

pub mod discounts;
pub mod fixtures;
pub mod loyalty;
pub mod money;
pub mod orders;
pub mod prelude;
pub mod promotions;
