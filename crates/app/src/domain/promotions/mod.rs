//! Promotions

pub mod data;
mod errors;
pub mod records;
pub(crate) mod redemption;
mod repositories;
pub mod service;

pub use errors::PromotionsServiceError;
pub use service::*;
