//! Fixtures
//!
//! YAML descriptions of promotions and loyalty tiers, used to drive tests and
//! local experiments without a database.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    fixtures::{promotions::PromotionsFixture, tiers::TiersFixture},
    loyalty::LoyaltyTier,
    money::AmountError,
    promotions::Promotion,
};

pub mod promotions;
pub mod tiers;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid money amount
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid product identifier
    #[error("Invalid product id: {0}")]
    InvalidProduct(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Invalid promotion data
    #[error("Invalid promotion data: {0}")]
    InvalidPromotionData(String),

    /// Invalid tier data
    #[error("Invalid tier data: {0}")]
    InvalidTier(String),

    /// Currency mismatch between promotions
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No amounts loaded yet
    #[error("No amounts loaded yet; currency unknown")]
    NoCurrency,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Promotions by fixture key
    promotions: FxHashMap<String, Promotion<'static>>,

    /// Tiers in file order
    tiers: Vec<LoyaltyTier>,

    /// Currency shared by every amount in the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            promotions: FxHashMap::default(),
            tiers: Vec::new(),
            currency: None,
        }
    }

    /// Load promotions from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a promotion is
    /// malformed, or if amounts use more than one currency.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self
            .base_path
            .join("promotions")
            .join(format!("{name}.yml"));

        let contents = fs::read_to_string(&file_path)?;
        let fixture: PromotionsFixture = serde_norway::from_str(&contents)?;

        for (key, promotion_fixture) in fixture.promotions {
            let promotion = Promotion::try_from(promotion_fixture)?;

            for currency in promotions::currencies(&promotion) {
                self.record_currency(currency)?;
            }

            self.promotions.insert(key, promotion);
        }

        Ok(self)
    }

    /// Load loyalty tiers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a tier is malformed.
    pub fn load_tiers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("tiers").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: TiersFixture = serde_norway::from_str(&contents)?;

        for tier_fixture in fixture.tiers {
            self.tiers.push(LoyaltyTier::try_from(tier_fixture)?);
        }

        Ok(self)
    }

    /// Load a complete fixture set (promotions and tiers with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_promotions(name)?.load_tiers(name)?;

        Ok(fixture)
    }

    /// Get a promotion by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion(&self, key: &str) -> Result<&Promotion<'static>, FixtureError> {
        self.promotions
            .get(key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Get a promotion by its promo code
    ///
    /// # Errors
    ///
    /// Returns an error if no promotion carries the code.
    pub fn promotion_by_code(&self, code: &str) -> Result<&Promotion<'static>, FixtureError> {
        self.promotions
            .values()
            .find(|promotion| promotion.code.as_deref() == Some(code))
            .ok_or_else(|| FixtureError::PromotionNotFound(code.to_string()))
    }

    /// Number of loaded promotions
    pub fn promotion_count(&self) -> usize {
        self.promotions.len()
    }

    /// Get all tiers
    pub fn tiers(&self) -> &[LoyaltyTier] {
        &self.tiers
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no amounts have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    fn record_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);

                Ok(())
            }
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rust_decimal::Decimal;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::promotions::Discount;

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_from_set_loads_promotions_and_tiers() -> TestResult {
        let fixture = Fixture::from_set("bakery")?;

        assert_eq!(fixture.promotion_count(), 5);
        assert_eq!(fixture.tiers().len(), 3);
        assert_eq!(fixture.currency()?, GBP);

        Ok(())
    }

    #[test]
    fn fixture_finds_promotion_by_code() -> TestResult {
        let fixture = Fixture::from_set("bakery")?;
        let promotion = fixture.promotion_by_code("LOAF15")?;

        assert_eq!(
            promotion.discount,
            Discount::Percentage(Decimal::from(15))
        );

        Ok(())
    }

    #[test]
    fn fixture_promotion_not_found_returns_error() {
        let fixture = Fixture::new();

        assert!(matches!(
            fixture.promotion("nonexistent"),
            Err(FixtureError::PromotionNotFound(_))
        ));
    }

    #[test]
    fn fixture_no_currency_returns_error() {
        assert!(matches!(
            Fixture::new().currency(),
            Err(FixtureError::NoCurrency)
        ));
    }

    #[test]
    fn fixture_rejects_mixed_currencies() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "promotions",
            "mixed",
            r#"
promotions:
  pounds:
    starts_at: "2026-01-01T00:00:00Z"
    discount:
      type: fixed_amount
      value: "1.00 GBP"
  dollars:
    starts_at: "2026-01-01T00:00:00Z"
    discount:
      type: fixed_amount
      value: "1.00 USD"
"#,
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        assert!(matches!(
            fixture.load_promotions("mixed"),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));

        Ok(())
    }

    #[test]
    fn fixture_missing_file_returns_io_error() {
        let mut fixture = Fixture::with_base_path("./does-not-exist");

        assert!(matches!(
            fixture.load_tiers("bakery"),
            Err(FixtureError::Io(_))
        ));
    }
}
