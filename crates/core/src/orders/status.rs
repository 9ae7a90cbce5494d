//! Order Status

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Order lifecycle.
///
/// `Pending -> Confirmed -> Preparing -> Ready -> Completed`, with `Cancelled` and
/// `Refunded` reachable from every state before completion and `Refunded` also
/// reachable from `Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Created, totals and promotions may still change.
    #[default]
    Pending,

    /// Accepted by the bakery.
    Confirmed,

    /// Being baked or packed.
    Preparing,

    /// Ready for collection or dispatch.
    Ready,

    /// Handed over; loyalty points are awarded.
    Completed,

    /// Abandoned before completion.
    Cancelled,

    /// Money returned to the customer.
    Refunded,
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    /// Current status.
    pub from: OrderStatus,

    /// Requested status.
    pub to: OrderStatus,
}

/// Unknown order status string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl OrderStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// No further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// Entering this status undoes awarded points and promotion usage.
    pub const fn reverses_rewards(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Preparing)
                | (Self::Preparing, Self::Ready)
                | (Self::Ready, Self::Completed)
                | (
                    Self::Pending | Self::Confirmed | Self::Preparing | Self::Ready,
                    Self::Cancelled | Self::Refunded
                )
                | (Self::Completed, Self::Refunded)
        )
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not allowed.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    #[test]
    fn happy_path_walks_to_completed() -> Result<(), TransitionError> {
        let status = OrderStatus::Pending
            .transition(OrderStatus::Confirmed)?
            .transition(OrderStatus::Preparing)?
            .transition(OrderStatus::Ready)?
            .transition(OrderStatus::Completed)?;

        assert_eq!(status, OrderStatus::Completed);

        Ok(())
    }

    #[test]
    fn cannot_skip_steps() {
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Ready),
            Err(TransitionError {
                from: OrderStatus::Pending,
                to: OrderStatus::Ready,
            })
        );
    }

    #[test]
    fn cancel_and_refund_reachable_before_completion() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            assert!(from.can_transition_to(OrderStatus::Cancelled), "{from} -> cancelled");
            assert!(from.can_transition_to(OrderStatus::Refunded), "{from} -> refunded");
        }
    }

    #[test]
    fn completed_orders_can_only_be_refunded() {
        for next in ALL {
            assert_eq!(
                OrderStatus::Completed.can_transition_to(next),
                next == OrderStatus::Refunded,
                "completed -> {next}"
            );
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|status| status.is_terminal()) {
            for next in ALL {
                assert!(!from.can_transition_to(next), "{from} -> {next}");
            }
        }
    }

    #[test]
    fn status_round_trips_through_storage_name() -> Result<(), UnknownOrderStatus> {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>()?, status);
        }

        Ok(())
    }
}
