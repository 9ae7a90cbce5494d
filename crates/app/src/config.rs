//! Configuration
//!
//! Command line flags with environment fallbacks. `.env` files are loaded by the
//! binary before parsing.

use clap::Args;
use hearth::money::{AmountError, currency_from_code, from_major_units};
use jiff::SignedDuration;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use thiserror::Error;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Pricing and loyalty settings.
#[derive(Debug, Args)]
pub struct PricingConfig {
    /// ISO currency code all amounts are held in
    #[arg(long, env = "CURRENCY", default_value = "GBP")]
    pub currency: String,

    /// Tax rate applied to order subtotals, e.g. 0.2 for 20%
    #[arg(long, env = "TAX_RATE", default_value = "0")]
    pub tax_rate: Decimal,

    /// Shipping fee in major units
    #[arg(long, env = "SHIPPING_FEE", default_value = "0")]
    pub shipping_fee: Decimal,

    /// Amount a free-shipping promotion takes off, in major units
    #[arg(long, env = "FREE_SHIPPING_ESTIMATE", default_value = "0")]
    pub free_shipping_estimate: Decimal,

    /// Times one customer may use the same promotion
    #[arg(long, env = "PER_CUSTOMER_PROMOTION_LIMIT", default_value_t = 1)]
    pub per_customer_promotion_limit: u32,

    /// Days before earned points lapse; points never lapse when unset
    #[arg(long, env = "POINTS_VALIDITY_DAYS")]
    pub points_validity_days: Option<u32>,
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("{0} is too large")]
    OutOfRange(&'static str),
}

/// Resolved pricing settings shared by the services.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub currency: &'static Currency,
    pub tax_rate: Decimal,
    pub shipping_fee: u64,
    pub free_shipping_estimate: u64,
    pub per_customer_promotion_limit: u32,
    pub points_validity: Option<SignedDuration>,
}

impl TryFrom<&PricingConfig> for Pricing {
    type Error = ConfigError;

    fn try_from(config: &PricingConfig) -> Result<Self, Self::Error> {
        let currency = currency_from_code(&config.currency)?;

        if config.tax_rate.is_sign_negative() {
            return Err(ConfigError::Negative("TAX_RATE"));
        }

        Ok(Self {
            currency,
            tax_rate: config.tax_rate,
            shipping_fee: minor_units(config.shipping_fee, currency, "SHIPPING_FEE")?,
            free_shipping_estimate: minor_units(
                config.free_shipping_estimate,
                currency,
                "FREE_SHIPPING_ESTIMATE",
            )?,
            per_customer_promotion_limit: config.per_customer_promotion_limit,
            points_validity: config
                .points_validity_days
                .map(|days| SignedDuration::from_hours(i64::from(days) * 24)),
        })
    }
}

fn minor_units(
    amount: Decimal,
    currency: &Currency,
    name: &'static str,
) -> Result<u64, ConfigError> {
    if amount.is_sign_negative() {
        return Err(ConfigError::Negative(name));
    }

    from_major_units(amount, currency)
        .and_then(|minor| u64::try_from(minor).ok())
        .ok_or(ConfigError::OutOfRange(name))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn config() -> PricingConfig {
        PricingConfig {
            currency: "GBP".to_string(),
            tax_rate: Decimal::new(2, 1),
            shipping_fee: Decimal::new(399, 2),
            free_shipping_estimate: Decimal::new(499, 2),
            per_customer_promotion_limit: 2,
            points_validity_days: Some(365),
        }
    }

    #[test]
    fn pricing_resolves_amounts_to_minor_units() -> TestResult {
        let pricing = Pricing::try_from(&config())?;

        assert_eq!(pricing.currency, GBP);
        assert_eq!(pricing.shipping_fee, 399);
        assert_eq!(pricing.free_shipping_estimate, 499);
        assert_eq!(pricing.per_customer_promotion_limit, 2);
        assert_eq!(pricing.points_validity, Some(SignedDuration::from_hours(365 * 24)));

        Ok(())
    }

    #[test]
    fn pricing_rejects_unknown_currency() {
        let config = PricingConfig {
            currency: "XYZ".to_string(),
            ..config()
        };

        assert!(matches!(
            Pricing::try_from(&config),
            Err(ConfigError::Amount(AmountError::UnknownCurrency(_)))
        ));
    }

    #[test]
    fn pricing_rejects_negative_shipping() {
        let config = PricingConfig {
            shipping_fee: Decimal::NEGATIVE_ONE,
            ..config()
        };

        assert!(matches!(
            Pricing::try_from(&config),
            Err(ConfigError::Negative("SHIPPING_FEE"))
        ));
    }
}
