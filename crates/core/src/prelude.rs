//! Hearth prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    discounts::{
        DiscountError, DiscountOutcome, DiscountPolicy, calculate_discount, eligible_total,
        evaluate_discount,
    },
    loyalty::{
        LapsedLot, Ledger, LedgerEntry, LedgerError, LoyaltyTier, NextTier, PointsError,
        TierPerks, TransactionKind, current_tier, next_tier, points_for_purchase,
    },
    money::{AmountError, currency_from_code, parse_money},
    orders::{
        Charges, OrderLine, OrderStatus, OrderTotals, TotalsError, TransitionError,
    },
    promotions::{
        Discount, DiscountKind, InvalidReason, Promotion, ValidityWindow, budget::UsageBudget,
        scope::PromotionScope,
    },
};
