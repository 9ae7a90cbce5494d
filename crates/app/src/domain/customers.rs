//! Customers
//!
//! Customers are owned by another system; only their identifiers are stored here.

use crate::uuids::TypedUuid;

/// Customer marker
#[derive(Debug)]
pub struct Customer;

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;
