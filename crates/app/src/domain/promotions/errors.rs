//! Promotions service errors.

use std::num::TryFromIntError;

use hearth::{discounts::DiscountError, promotions::InvalidReason};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromotionsServiceError {
    #[error("promotion already exists")]
    AlreadyExists,

    #[error("promotion not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("promotion cannot be used: {0}")]
    Invalid(InvalidReason),

    #[error("order total is below the promotion minimum of {minimum}")]
    NotApplicable { minimum: u64 },

    #[error("promotion does not cover any item on the order")]
    NoEligibleLines,

    #[error("discount calculation failed")]
    Discount(#[from] DiscountError),

    #[error("amount out of range")]
    InvalidAmount(#[from] TryFromIntError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PromotionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}

impl From<InvalidReason> for PromotionsServiceError {
    fn from(reason: InvalidReason) -> Self {
        Self::Invalid(reason)
    }
}
