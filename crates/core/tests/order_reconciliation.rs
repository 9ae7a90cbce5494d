//! Integration tests for order totals and the order state machine.

use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{Currency, GBP},
};
use testresult::TestResult;
use uuid::Uuid;

use hearth::{
    discounts::{DiscountPolicy, calculate_discount, eligible_total},
    fixtures::Fixture,
    orders::{Charges, OrderLine, OrderStatus, OrderTotals},
};

fn gbp(minor: i64) -> Money<'static, Currency> {
    Money::from_minor(minor, GBP)
}

fn basket() -> Vec<OrderLine<'static>> {
    vec![
        OrderLine::new(Uuid::now_v7(), 2, gbp(350)).with_category(Some("bread".to_string())),
        OrderLine::new(Uuid::now_v7(), 3, gbp(425)).with_category(Some("cakes".to_string())),
        OrderLine::new(Uuid::now_v7(), 1, gbp(199)),
    ]
}

#[test]
fn scoped_discount_feeds_reconciled_totals() -> TestResult {
    let fixture = Fixture::from_set("bakery")?;
    let promotion = fixture.promotion_by_code("CAKEPAIR")?;
    let lines = basket();

    let eligible = eligible_total(promotion, GBP, &lines)?;
    let discount = calculate_discount(
        promotion,
        &eligible,
        &DiscountPolicy {
            free_shipping_estimate: gbp(0),
        },
    )?;

    assert_eq!(eligible, gbp(1_275));
    assert_eq!(discount, gbp(638));

    let totals = OrderTotals::reconcile(
        GBP,
        &lines,
        &Charges {
            tax_rate: Decimal::new(2, 1),
            shipping: gbp(399),
            discount,
        },
    )?;

    assert_eq!(totals.subtotal, gbp(2_174));
    assert_eq!(totals.tax, gbp(435));
    assert_eq!(totals.total, gbp(2_174 + 435 + 399 - 638));
    assert!(totals.is_consistent());

    Ok(())
}

#[test]
fn oversized_discount_never_makes_total_negative() -> TestResult {
    let totals = OrderTotals::reconcile(
        GBP,
        &basket(),
        &Charges {
            discount: gbp(1_000_000),
            ..Charges::none(GBP)
        },
    )?;

    assert_eq!(totals.total, gbp(0));
    assert!(totals.is_consistent());

    Ok(())
}

#[test]
fn order_lifecycle_follows_state_machine() -> TestResult {
    let status = [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Refunded,
    ]
    .into_iter()
    .try_fold(OrderStatus::Pending, OrderStatus::transition)?;

    assert!(status.is_terminal());
    assert!(status.transition(OrderStatus::Pending).is_err());

    Ok(())
}
