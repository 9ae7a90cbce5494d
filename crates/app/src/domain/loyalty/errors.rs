//! Loyalty service errors.

use std::num::TryFromIntError;

use hearth::loyalty::{LedgerError, PointsError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoyaltyServiceError {
    #[error("loyalty record already exists")]
    AlreadyExists,

    #[error("loyalty record not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("insufficient points: {available} available, {required} required")]
    InsufficientPoints { available: i64, required: i64 },

    #[error("reward is not available")]
    RewardUnavailable,

    #[error("points already awarded for this order")]
    AlreadyAwarded,

    #[error("points calculation failed")]
    Points(#[from] PointsError),

    #[error("stored ledger is inconsistent")]
    Ledger(#[from] LedgerError),

    #[error("amount out of range")]
    InvalidAmount(#[from] TryFromIntError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for LoyaltyServiceError {
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
