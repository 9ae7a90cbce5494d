//! Loyalty

pub mod data;
mod errors;
pub(crate) mod points;
pub mod records;
mod repositories;
pub mod service;

pub use errors::LoyaltyServiceError;
pub use service::*;
