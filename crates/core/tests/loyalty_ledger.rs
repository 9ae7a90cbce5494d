//! Integration tests for loyalty tiers, points and ledger replay.

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{GBP, USD},
};
use testresult::TestResult;

use hearth::{
    fixtures::Fixture,
    loyalty::{Ledger, LedgerEntry, current_tier, next_tier, points_for_purchase},
};

fn day(n: i64) -> Timestamp {
    Timestamp::UNIX_EPOCH + SignedDuration::from_hours(24 * n)
}

#[test]
fn balance_after_n_earns_is_n_times_value() -> TestResult {
    for n in 0..12 {
        let entries: Vec<LedgerEntry> = (0..n).map(|i| LedgerEntry::earn(25, day(i), None)).collect();

        assert_eq!(Ledger::replay(&entries)?.balance_at(day(100)), n * 25);
    }

    Ok(())
}

#[test]
fn expired_earns_are_subtracted() -> TestResult {
    let entries: Vec<LedgerEntry> = (0..6)
        .map(|i| LedgerEntry::earn(10, day(i), Some(day(i + 30))))
        .collect();

    let ledger = Ledger::replay(&entries)?;

    assert_eq!(ledger.balance_at(day(32)), 30);
    assert_eq!(ledger.lapsed_at(day(32)).len(), 3);

    Ok(())
}

#[test]
fn writing_off_lapsed_lots_twice_finds_nothing_the_second_time() -> TestResult {
    let mut entries = vec![
        LedgerEntry::earn(80, day(0), Some(day(10))),
        LedgerEntry::redeem(30, day(2)),
        LedgerEntry::earn(40, day(3), Some(day(40))),
    ];

    let first = Ledger::replay(&entries)?.lapsed_at(day(11));

    assert_eq!(first.len(), 1);
    assert_eq!(first.first().map(|lot| lot.remaining), Some(50));

    entries.extend(first.iter().map(|lot| LedgerEntry::expire(lot, day(11))));

    let ledger = Ledger::replay(&entries)?;

    assert!(ledger.lapsed_at(day(11)).is_empty());
    assert_eq!(ledger.balance_at(day(11)), 40);

    Ok(())
}

#[test]
fn base_tier_earns_one_point_per_unit() -> TestResult {
    assert_eq!(points_for_purchase(&Money::from_minor(2_000, USD), Decimal::ONE)?, 20);

    Ok(())
}

#[test]
fn fixture_tiers_drive_multiplier_and_progress() -> TestResult {
    let fixture = Fixture::from_set("bakery")?;
    let tiers = fixture.tiers();

    let tier = current_tier(tiers, 750).ok_or("no tier for 750 points")?;

    assert_eq!(tier.name, "Crust");
    assert_eq!(points_for_purchase(&Money::from_minor(1_299, GBP), tier.points_multiplier)?, 19);

    let next = next_tier(tiers, 750).ok_or("no tier above Crust")?;

    assert_eq!(next.tier.name, "Golden Loaf");
    assert_eq!(next.points_needed, 1_250);
    assert!(next.tier.perks.free_shipping);
    assert!(next_tier(tiers, 2_000).is_none());

    Ok(())
}
