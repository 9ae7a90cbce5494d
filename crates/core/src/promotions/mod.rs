//! Promotions

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::promotions::{budget::UsageBudget, scope::PromotionScope};

pub mod budget;
pub mod scope;

/// Discount offered by a promotion.
#[derive(Clone, Copy, PartialEq)]
pub enum Discount<'a> {
    /// Percentage off the order total, on a 0-100 scale.
    Percentage(Decimal),

    /// Flat amount off the order total.
    FixedAmount(Money<'a, Currency>),

    /// Half off the order total.
    ///
    /// Eligible pairs are not inspected; the whole total is halved.
    BuyOneGetOne,

    /// The configured shipping estimate off the order total.
    FreeShipping,
}

impl Discount<'_> {
    /// The stored kind of this discount.
    pub const fn kind(&self) -> DiscountKind {
        match self {
            Self::Percentage(_) => DiscountKind::Percentage,
            Self::FixedAmount(_) => DiscountKind::FixedAmount,
            Self::BuyOneGetOne => DiscountKind::BuyOneGetOne,
            Self::FreeShipping => DiscountKind::FreeShipping,
        }
    }
}

impl fmt::Debug for Discount<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage(percent) => f.debug_tuple("Percentage").field(percent).finish(),
            Self::FixedAmount(amount) => f.debug_tuple("FixedAmount").field(amount).finish(),
            Self::BuyOneGetOne => f.write_str("BuyOneGetOne"),
            Self::FreeShipping => f.write_str("FreeShipping"),
        }
    }
}

/// Discount kind, as stored alongside a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountKind {
    /// See [`Discount::Percentage`].
    Percentage,

    /// See [`Discount::FixedAmount`].
    FixedAmount,

    /// See [`Discount::BuyOneGetOne`].
    BuyOneGetOne,

    /// See [`Discount::FreeShipping`].
    FreeShipping,
}

impl DiscountKind {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
            Self::BuyOneGetOne => "buy_one_get_one",
            Self::FreeShipping => "free_shipping",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown discount kind string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown discount kind: {0}")]
pub struct UnknownDiscountKind(pub String);

impl FromStr for DiscountKind {
    type Err = UnknownDiscountKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed_amount" => Ok(Self::FixedAmount),
            "buy_one_get_one" => Ok(Self::BuyOneGetOne),
            "free_shipping" => Ok(Self::FreeShipping),
            other => Err(UnknownDiscountKind(other.to_string())),
        }
    }
}

/// Half-open window `[starts_at, ends_at)` in which a promotion may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    /// First instant the promotion may be used.
    pub starts_at: Timestamp,

    /// First instant the promotion may no longer be used, if any.
    pub ends_at: Option<Timestamp>,
}

impl ValidityWindow {
    /// Window opening at `starts_at` with no end.
    pub const fn open_ended(starts_at: Timestamp) -> Self {
        Self {
            starts_at,
            ends_at: None,
        }
    }

    /// Window between two instants.
    pub const fn between(starts_at: Timestamp, ends_at: Timestamp) -> Self {
        Self {
            starts_at,
            ends_at: Some(ends_at),
        }
    }

    /// Whether `now` falls within the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        now >= self.starts_at && self.ends_at.is_none_or(|ends_at| now < ends_at)
    }
}

/// Why a promotion cannot be used right now.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvalidReason {
    /// Promotion has been switched off.
    #[error("promotion is not active")]
    Inactive,

    /// Validity window has not opened yet.
    #[error("promotion has not started")]
    NotStarted,

    /// Validity window has closed.
    #[error("promotion has expired")]
    Expired,

    /// Usage limit has been reached.
    #[error("promotion usage limit reached")]
    Exhausted,

    /// Customer has used the promotion as many times as allowed.
    #[error("promotion already used by this customer")]
    CustomerLimitReached,
}

/// A configured discount rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion<'a> {
    /// Promo code customers enter, if any.
    pub code: Option<String>,

    /// Discount offered.
    pub discount: Discount<'a>,

    /// Order total below which the promotion does not apply.
    pub minimum_order_value: Option<Money<'a, Currency>>,

    /// Upper bound on any discount produced.
    pub maximum_discount: Option<Money<'a, Currency>>,

    /// Usage limit and counter.
    pub budget: UsageBudget,

    /// When the promotion may be used.
    pub window: ValidityWindow,

    /// Whether the promotion is switched on.
    pub active: bool,

    /// Which order lines the discount is calculated over.
    pub scope: PromotionScope,
}

impl<'a> Promotion<'a> {
    /// Create an active, unlimited, order-wide promotion with no end date.
    pub fn new(discount: Discount<'a>, starts_at: Timestamp) -> Self {
        Self {
            code: None,
            discount,
            minimum_order_value: None,
            maximum_discount: None,
            budget: UsageBudget::unlimited(),
            window: ValidityWindow::open_ended(starts_at),
            active: true,
            scope: PromotionScope::Order,
        }
    }

    /// Set the promo code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the minimum order value.
    #[must_use]
    pub fn with_minimum_order_value(mut self, minimum: Money<'a, Currency>) -> Self {
        self.minimum_order_value = Some(minimum);
        self
    }

    /// Set the maximum discount.
    #[must_use]
    pub fn with_maximum_discount(mut self, maximum: Money<'a, Currency>) -> Self {
        self.maximum_discount = Some(maximum);
        self
    }

    /// Set the usage budget.
    #[must_use]
    pub fn with_budget(mut self, budget: UsageBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Close the validity window at `ends_at`.
    #[must_use]
    pub fn ending_at(mut self, ends_at: Timestamp) -> Self {
        self.window.ends_at = Some(ends_at);
        self
    }

    /// Restrict the discount to some order lines.
    #[must_use]
    pub fn scoped_to(mut self, scope: PromotionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Switch the promotion on or off.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Check whether the promotion may be used at `now`.
    ///
    /// An exhausted budget is reported regardless of the validity window.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidReason`] that applies.
    pub fn check_validity(&self, now: Timestamp) -> Result<(), InvalidReason> {
        if !self.active {
            return Err(InvalidReason::Inactive);
        }

        if self.budget.is_exhausted() {
            return Err(InvalidReason::Exhausted);
        }

        if now < self.window.starts_at {
            return Err(InvalidReason::NotStarted);
        }

        if !self.window.contains(now) {
            return Err(InvalidReason::Expired);
        }

        Ok(())
    }

    /// Whether the promotion may be used at `now`.
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.check_validity(now).is_ok()
    }
}
