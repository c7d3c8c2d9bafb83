// Copyright 2025 Cowboy AI, LLC.

//! Order lifecycle statuses and the transition table
//!
//! The adjacency table is the single source of truth for which status
//! changes are legal. It is static and deterministic: no self-loops, and
//! terminal statuses have no outgoing edges. The enum methods are thin
//! delegates so the table stays data-only and testable in isolation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle states of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order created, awaiting payment
    Created,
    /// Payment processed, ready for shipment
    Paid,
    /// Order has been shipped
    Shipped,
    /// Order delivered to customer
    Delivered,
    /// Order cancelled by customer or system
    Cancelled,
}

/// Every status, in declaration order
pub const ALL_STATUSES: [OrderStatus; 5] = [
    OrderStatus::Created,
    OrderStatus::Paid,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

/// The one-step adjacency table.
///
/// Any pair not listed here is an invalid transition, including a status
/// transitioning to itself.
pub fn transitions_from(status: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;

    match status {
        Created => &[Paid, Cancelled],
        Paid => &[Shipped, Cancelled],
        Shipped => &[Delivered],
        Delivered => &[],
        Cancelled => &[],
    }
}

impl OrderStatus {
    /// The status every new order starts in
    pub fn initial() -> Self {
        OrderStatus::Created
    }

    /// Check if a transition to the target status is valid
    pub fn can_transition_to(&self, target: &Self) -> bool {
        transitions_from(*self).contains(target)
    }

    /// Get all valid target statuses from this status
    pub fn valid_transitions(&self) -> Vec<Self> {
        transitions_from(*self).to_vec()
    }

    /// Check if this is a terminal status (no outgoing edges)
    pub fn is_terminal(&self) -> bool {
        transitions_from(*self).is_empty()
    }

    /// Get the name of this status for logging/debugging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Paid => "Paid",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Human-readable description of what the status means
    pub fn description(&self) -> &'static str {
        match self {
            Self::Created => "Order created, awaiting payment",
            Self::Paid => "Payment processed, ready for shipment",
            Self::Shipped => "Order has been shipped",
            Self::Delivered => "Order delivered to customer",
            Self::Cancelled => "Order cancelled by customer or system",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable record of a single status change
///
/// Appended to an order's history at creation and on every successful
/// transition. History is append-only and ordered by occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// The status the order held after this change
    pub status: OrderStatus,
    /// When the change occurred
    pub timestamp: DateTime<Utc>,
    /// Unique identifier for this record instance
    pub record_id: Uuid,
}

impl StatusRecord {
    /// Record a status as of now
    pub fn now(status: OrderStatus) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            record_id: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.status, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrderStatus::Created, OrderStatus::Paid, true)]
    #[test_case(OrderStatus::Created, OrderStatus::Cancelled, true)]
    #[test_case(OrderStatus::Created, OrderStatus::Shipped, false)]
    #[test_case(OrderStatus::Created, OrderStatus::Delivered, false)]
    #[test_case(OrderStatus::Paid, OrderStatus::Shipped, true)]
    #[test_case(OrderStatus::Paid, OrderStatus::Cancelled, true)]
    #[test_case(OrderStatus::Paid, OrderStatus::Delivered, false)]
    #[test_case(OrderStatus::Shipped, OrderStatus::Delivered, true)]
    #[test_case(OrderStatus::Shipped, OrderStatus::Cancelled, false)]
    #[test_case(OrderStatus::Delivered, OrderStatus::Created, false)]
    #[test_case(OrderStatus::Cancelled, OrderStatus::Paid, false)]
    fn test_adjacency_table(from: OrderStatus, to: OrderStatus, expected: bool) {
        assert_eq!(from.can_transition_to(&to), expected);
    }

    #[test]
    fn test_no_self_loops() {
        for status in ALL_STATUSES {
            assert!(
                !status.can_transition_to(&status),
                "{status} must not transition to itself"
            );
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_edges() {
        for status in ALL_STATUSES {
            if status.is_terminal() {
                assert!(status.valid_transitions().is_empty());
            } else {
                assert!(!status.valid_transitions().is_empty());
            }
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Created.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(OrderStatus::initial(), OrderStatus::Created);
        assert!(!OrderStatus::initial().is_terminal());
    }

    #[test]
    fn test_display_and_metadata() {
        assert_eq!(OrderStatus::Paid.to_string(), "Paid");
        assert_eq!(
            OrderStatus::Shipped.description(),
            "Order has been shipped"
        );
    }

    #[test]
    fn test_status_serde_round_trip() {
        for status in ALL_STATUSES {
            let json = serde_json::to_string(&status).unwrap();
            let back: OrderStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::Created).unwrap(),
            "\"Created\""
        );
    }

    #[test]
    fn test_status_record_display() {
        let record = StatusRecord::now(OrderStatus::Paid);
        assert!(record.to_string().starts_with("Paid at "));
    }
}
