//! Hearth Domain Concerns

pub mod customers;
pub mod loyalty;
pub mod orders;
pub mod products;
pub mod promotions;
