//! Orders service errors.

use std::num::TryFromIntError;

use hearth::orders::{OrderStatus, TotalsError, TransitionError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    loyalty::LoyaltyServiceError, products::records::ProductUuid,
    promotions::PromotionsServiceError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("unknown product {0}")]
    UnknownProduct(ProductUuid),

    #[error("item quantity must be positive")]
    InvalidQuantity,

    #[error("order is {0}, only pending orders can be changed")]
    NotPending(OrderStatus),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("order status changed concurrently")]
    StatusChanged,

    #[error("a promotion has already been applied to this order")]
    PromotionAlreadyApplied,

    #[error("order totals could not be reconciled")]
    Totals(#[from] TotalsError),

    #[error(transparent)]
    Promotion(#[from] PromotionsServiceError),

    #[error(transparent)]
    Loyalty(#[from] LoyaltyServiceError),

    #[error("amount out of range")]
    InvalidAmount(#[from] TryFromIntError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
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
