//! Promotion Usage Budget

/// Usage limit and counter for a promotion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageBudget {
    /// Maximum number of uses across all customers
    pub limit: Option<u32>,

    /// Number of uses recorded so far
    pub used: u32,
}

impl UsageBudget {
    /// Create a budget with no limit
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            limit: None,
            used: 0,
        }
    }

    /// Create a budget with a limit and the uses recorded so far
    #[must_use]
    pub const fn limited(limit: u32, used: u32) -> Self {
        Self {
            limit: Some(limit),
            used,
        }
    }

    /// Uses left before the limit is reached, `None` when unlimited
    #[must_use]
    pub const fn remaining(&self) -> Option<u32> {
        match self.limit {
            Some(limit) => Some(limit.saturating_sub(self.used)),
            None => None,
        }
    }

    /// Check if no further uses are allowed
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        match self.limit {
            Some(limit) => self.used >= limit,
            None => false,
        }
    }
}
