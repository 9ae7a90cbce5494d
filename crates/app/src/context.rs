//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::Pricing,
    database::{self, Db},
    domain::{
        loyalty::{LoyaltyService, PgLoyaltyService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        promotions::{PgPromotionsService, PromotionsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub promotions: Arc<dyn PromotionsService>,
    pub loyalty: Arc<dyn LoyaltyService>,
    pub orders: Arc<dyn OrdersService>,
}

impl AppContext {
    /// Build application context over an existing database handle.
    #[must_use]
    pub fn new(db: Db, pricing: Pricing) -> Self {
        Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            promotions: Arc::new(PgPromotionsService::new(db.clone(), pricing)),
            loyalty: Arc::new(PgLoyaltyService::new(db.clone(), pricing)),
            orders: Arc::new(PgOrdersService::new(db, pricing)),
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, pricing: Pricing) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), pricing))
    }
}
