//! Loyalty Repositories

pub(crate) mod ledger;
pub(crate) mod rewards;
pub(crate) mod tiers;

pub(crate) use ledger::PgLedgerRepository;
pub(crate) use rewards::PgRewardsRepository;
pub(crate) use tiers::PgTiersRepository;
