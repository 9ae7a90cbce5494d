//! Products service errors.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("a product with this uuid already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("product references a missing record")]
    InvalidReference,

    #[error("product is missing a name or price")]
    MissingRequiredData,

    #[error("product name must not be empty")]
    InvalidData,

    #[error("products storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for ProductsServiceError {
    fn from(error: sqlx::Error) -> Self {
        let kind = match &error {
            sqlx::Error::RowNotFound => return Self::NotFound,
            other => other.as_database_error().map(DatabaseError::kind),
        };

        match kind {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
