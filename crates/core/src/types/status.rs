//! Status enums for orders and payments.
//!
//! Order status is a strict forward chain:
//!
//! ```text
//! pending -> confirmed -> out_for_delivery -> delivered
//! ```
//!
//! Only the organization that owns an order may advance it, and only one step
//! at a time. `delivered` is terminal.

use serde::{Deserialize, Serialize};

/// Errors raised when moving an order through its lifecycle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderStatusError {
    /// The requested move is not the single next step.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
    /// The order is already delivered.
    #[error("order is already {0} and cannot advance")]
    Terminal(OrderStatus),
    /// The string does not name a known status.
    #[error("unknown order status: {0}")]
    Unknown(String),
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, not yet accepted by the farm.
    #[default]
    Pending,
    /// Accepted by the farm.
    Confirmed,
    /// Handed to delivery.
    OutForDelivery,
    /// Received by the customer.
    Delivered,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// The status that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether `to` is the single permitted next step from `self`.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Validate a requested move from `self` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderStatusError::Terminal`] when `self` is delivered and
    /// [`OrderStatusError::InvalidTransition`] for skips, repeats and
    /// backward moves.
    pub fn transition_to(self, to: Self) -> Result<Self, OrderStatusError> {
        if self.is_terminal() {
            return Err(OrderStatusError::Terminal(self));
        }
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(OrderStatusError::InvalidTransition { from: self, to })
        }
    }

    /// Advance one step.
    ///
    /// # Errors
    ///
    /// Returns [`OrderStatusError::Terminal`] when already delivered.
    pub fn advance(self) -> Result<Self, OrderStatusError> {
        self.next().ok_or(OrderStatusError::Terminal(self))
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Snake-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
        }
    }

    /// Human-readable label for the owner console.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderStatusError::Unknown(s.to_owned()))
    }
}

/// Payment status.
///
/// Payments are created alongside the order and settled on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_linear() {
        let mut status = OrderStatus::Pending;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            status = next;
            seen.push(status);
        }
        assert_eq!(seen, OrderStatus::ALL);
    }

    #[test]
    fn test_only_next_step_allowed() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(from.can_transition_to(to), from.next() == Some(to));
            }
        }
    }

    #[test]
    fn test_skip_is_rejected() {
        let err = OrderStatus::Pending
            .transition_to(OrderStatus::Delivered)
            .unwrap_err();
        assert_eq!(
            err,
            OrderStatusError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
            }
        );
    }

    #[test]
    fn test_backward_is_rejected() {
        assert!(
            OrderStatus::OutForDelivery
                .transition_to(OrderStatus::Confirmed)
                .is_err()
        );
    }

    #[test]
    fn test_delivered_is_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert_eq!(
            OrderStatus::Delivered.advance(),
            Err(OrderStatusError::Terminal(OrderStatus::Delivered))
        );
    }

    #[test]
    fn test_parse_and_display() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"out_for_delivery\""
        );
    }

    #[test]
    fn test_payment_status_default() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::Completed.to_string(), "completed");
    }
}
