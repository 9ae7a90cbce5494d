use clap::{Args, Subcommand};
use hearth_app::{
    config::{DatabaseConfig, Pricing, PricingConfig},
    context::AppContext,
};

mod balance;
mod expire_points;

#[derive(Debug, Args)]
pub(crate) struct LoyaltyCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    pricing: PricingConfig,

    #[command(subcommand)]
    command: LoyaltySubcommand,
}

#[derive(Debug, Subcommand)]
enum LoyaltySubcommand {
    /// Write off points that have lapsed
    ExpirePoints(expire_points::ExpirePointsArgs),

    /// Show a customer's balance and tier
    Balance(balance::BalanceArgs),
}

pub(crate) async fn run(command: LoyaltyCommand) -> Result<(), String> {
    let pricing = Pricing::try_from(&command.pricing)
        .map_err(|error| format!("invalid pricing configuration: {error}"))?;

    let context = AppContext::from_database_url(&command.database.database_url, pricing)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    match command.command {
        LoyaltySubcommand::ExpirePoints(args) => expire_points::run(&context, args).await,
        LoyaltySubcommand::Balance(args) => balance::run(&context, args).await,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use hearth_app::domain::{
        loyalty::MockLoyaltyService, orders::MockOrdersService, products::MockProductsService,
        promotions::MockPromotionsService,
    };

    use super::*;

    pub(crate) fn context(loyalty: MockLoyaltyService) -> AppContext {
        AppContext {
            products: Arc::new(MockProductsService::new()),
            promotions: Arc::new(MockPromotionsService::new()),
            loyalty: Arc::new(loyalty),
            orders: Arc::new(MockOrdersService::new()),
        }
    }
}
