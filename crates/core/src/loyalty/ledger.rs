//! Loyalty Points Ledger
//!
//! The ledger is append-only; balances are derived by replaying it. Every positive
//! entry opens a *lot* of points. Redemptions and negative adjustments consume
//! live lots, soonest-expiring first. A lot whose expiry has passed no longer
//! counts towards the balance, whether or not an `Expire` entry has been written
//! for it yet. An `Expire` entry closes the lot it references.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

/// Ledger entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Points earned, positive.
    Earn,

    /// Points spent on a reward, negative.
    Redeem,

    /// Lapsed points written off, negative.
    Expire,

    /// Manual or compensating correction, either sign.
    Adjust,
}

impl TransactionKind {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Redeem => "redeem",
            Self::Expire => "expire",
            Self::Adjust => "adjust",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown transaction kind string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown transaction kind: {0}")]
pub struct UnknownTransactionKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earn" => Ok(Self::Earn),
            "redeem" => Ok(Self::Redeem),
            "expire" => Ok(Self::Expire),
            "adjust" => Ok(Self::Adjust),
            other => Err(UnknownTransactionKind(other.to_string())),
        }
    }
}

/// Errors raised while replaying a ledger.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Entry's sign does not match its kind.
    #[error("{kind} entry {entry} has invalid points value {points}")]
    InvalidSign {
        /// Offending entry
        entry: Uuid,
        /// Entry kind
        kind: TransactionKind,
        /// Signed points value
        points: i64,
    },

    /// An `Expire` entry did not reference the entry it writes off.
    #[error("expire entry {0} does not reference an entry")]
    MissingExpiredEntry(Uuid),
}

/// One immutable change to a customer's points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: Uuid,

    /// Entry kind.
    pub kind: TransactionKind,

    /// Signed change in points.
    pub points: i64,

    /// When the entry was appended.
    pub created_at: Timestamp,

    /// When the points of a positive entry lapse, if ever.
    pub expires_at: Option<Timestamp>,

    /// For `Expire` entries, the entry being written off.
    pub expires_entry: Option<Uuid>,
}

impl LedgerEntry {
    /// Points earned at `created_at`.
    pub fn earn(points: i64, created_at: Timestamp, expires_at: Option<Timestamp>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TransactionKind::Earn,
            points,
            created_at,
            expires_at,
            expires_entry: None,
        }
    }

    /// Points redeemed at `created_at`, given as a positive cost.
    pub fn redeem(cost: i64, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TransactionKind::Redeem,
            points: -cost,
            created_at,
            expires_at: None,
            expires_entry: None,
        }
    }

    /// Signed adjustment at `created_at`.
    pub fn adjust(points: i64, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TransactionKind::Adjust,
            points,
            created_at,
            expires_at: None,
            expires_entry: None,
        }
    }

    /// Write-off of a lapsed lot.
    pub fn expire(lot: &LapsedLot, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TransactionKind::Expire,
            points: -lot.remaining,
            created_at,
            expires_at: None,
            expires_entry: Some(lot.entry),
        }
    }

    fn check_sign(&self) -> Result<(), LedgerError> {
        let valid = match self.kind {
            TransactionKind::Earn => self.points >= 0,
            TransactionKind::Redeem | TransactionKind::Expire => self.points <= 0,
            TransactionKind::Adjust => true,
        };

        if valid {
            Ok(())
        } else {
            Err(LedgerError::InvalidSign {
                entry: self.id,
                kind: self.kind,
                points: self.points,
            })
        }
    }
}

/// A lapsed lot that has not been written off yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapsedLot {
    /// Entry that opened the lot.
    pub entry: Uuid,

    /// Points left in the lot.
    pub remaining: i64,

    /// When the lot lapsed.
    pub expired_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lot {
    entry: Uuid,
    remaining: i64,
    expires_at: Option<Timestamp>,
    closed: bool,
}

impl Lot {
    fn is_live_at(&self, at: Timestamp) -> bool {
        !self.closed && self.remaining > 0 && self.expires_at.is_none_or(|expires| at < expires)
    }
}

/// A replayed ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    lots: Vec<Lot>,
}

impl Ledger {
    /// Replay entries in the order they were appended.
    ///
    /// # Errors
    ///
    /// Returns an error when an entry's sign contradicts its kind, or an `Expire`
    /// entry has no reference.
    pub fn replay<'e, I>(entries: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = &'e LedgerEntry>,
    {
        let mut ledger = Self::default();

        for entry in entries {
            ledger.apply(entry)?;
        }

        Ok(ledger)
    }

    /// Apply one more entry.
    ///
    /// # Errors
    ///
    /// See [`Ledger::replay`].
    pub fn apply(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        entry.check_sign()?;

        match entry.kind {
            TransactionKind::Expire => {
                let target = entry
                    .expires_entry
                    .ok_or(LedgerError::MissingExpiredEntry(entry.id))?;

                if let Some(lot) = self.lots.iter_mut().find(|lot| lot.entry == target) {
                    lot.remaining = 0;
                    lot.closed = true;
                }
            }
            TransactionKind::Earn | TransactionKind::Adjust if entry.points > 0 => {
                self.lots.push(Lot {
                    entry: entry.id,
                    remaining: entry.points,
                    expires_at: entry.expires_at,
                    closed: false,
                });
            }
            TransactionKind::Earn | TransactionKind::Redeem | TransactionKind::Adjust => {
                self.consume(entry.points.saturating_neg(), entry.created_at);
            }
        }

        Ok(())
    }

    /// Live balance at `now`; never negative.
    pub fn balance_at(&self, now: Timestamp) -> i64 {
        self.lots
            .iter()
            .filter(|lot| lot.is_live_at(now))
            .map(|lot| lot.remaining)
            .sum()
    }

    /// Lots that have lapsed by `now` and have not been written off.
    ///
    /// Lots spent in full before lapsing are included with nothing remaining,
    /// so that an `Expire` entry closes them too.
    pub fn lapsed_at(&self, now: Timestamp) -> Vec<LapsedLot> {
        self.lots
            .iter()
            .filter(|lot| !lot.closed)
            .filter_map(|lot| match lot.expires_at {
                Some(expired_at) if expired_at <= now => Some(LapsedLot {
                    entry: lot.entry,
                    remaining: lot.remaining,
                    expired_at,
                }),
                _ => None,
            })
            .collect()
    }

    /// Points still live from the lot opened by `entry`.
    pub fn remaining_in(&self, entry: Uuid, now: Timestamp) -> i64 {
        self.lots
            .iter()
            .find(|lot| lot.entry == entry)
            .filter(|lot| lot.is_live_at(now))
            .map_or(0, |lot| lot.remaining)
    }

    fn consume(&mut self, points: i64, at: Timestamp) {
        let mut live: Vec<&mut Lot> = self
            .lots
            .iter_mut()
            .filter(|lot| lot.is_live_at(at))
            .collect();

        live.sort_by_key(|lot| (lot.expires_at.is_none(), lot.expires_at));

        let mut outstanding = points;

        for lot in live {
            if outstanding <= 0 {
                break;
            }

            let taken = lot.remaining.min(outstanding);

            lot.remaining -= taken;
            outstanding -= taken;
        }
    }
}
