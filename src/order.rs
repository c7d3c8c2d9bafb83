// Copyright 2025 Cowboy AI, LLC.

//! The order entity
//!
//! Orders are domain objects with identity that persists across time. The
//! identifier is assigned by storage at first persistence and never changes
//! afterwards; creation metadata is immutable while status and the
//! last-modified timestamp evolve through validated transitions.

use crate::status::{OrderStatus, StatusRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A customer order with lifecycle state
///
/// # Examples
///
/// ```rust
/// use order_domain::{Order, OrderStatus};
///
/// let mut order = Order::new("Alice", 99.99);
/// assert_eq!(order.status(), OrderStatus::Created);
/// assert!(order.id().is_none());
///
/// // Transitions are validated against the adjacency table
/// assert!(order.attempt_transition(OrderStatus::Paid));
/// assert!(!order.attempt_transition(OrderStatus::Delivered));
/// assert_eq!(order.status(), OrderStatus::Paid);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Absent until the order is first persisted
    id: Option<u64>,
    customer: String,
    /// Monetary total; non-negative by construction convention
    total: f64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Append-only audit trail, seeded with the initial status
    #[serde(default)]
    history: Vec<StatusRecord>,
}

impl Order {
    /// Create a new order in the initial status with current timestamps
    pub fn new(customer: impl Into<String>, total: f64) -> Self {
        Self::with_status(customer, total, OrderStatus::initial())
    }

    /// Create a new order starting in an explicit status
    pub fn with_status(customer: impl Into<String>, total: f64, status: OrderStatus) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            customer: customer.into(),
            total,
            status,
            created_at: now,
            updated_at: now,
            history: vec![StatusRecord::now(status)],
        }
    }

    /// Restore an order from persistent storage with its historical
    /// timestamps and audit trail intact.
    ///
    /// This is the only way to construct an order whose `created_at` differs
    /// from "now"; after construction the creation timestamp has no setter.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: u64,
        customer: impl Into<String>,
        total: f64,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        history: Vec<StatusRecord>,
    ) -> Self {
        Self {
            id: Some(id),
            customer: customer.into(),
            total,
            status,
            created_at,
            updated_at,
            history,
        }
    }

    /// The storage-assigned identifier, absent before first persistence
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Assign the identifier at first persistence.
    ///
    /// Called by repositories only; an already-assigned id is never replaced.
    pub(crate) fn assign_id(&mut self, id: u64) {
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    /// Customer label
    pub fn customer(&self) -> &str {
        &self.customer
    }

    /// Update the customer label, stamping the modification time
    pub fn set_customer(&mut self, customer: impl Into<String>) {
        self.customer = customer.into();
        self.updated_at = Utc::now();
    }

    /// Monetary total
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Update the total, stamping the modification time
    pub fn set_total(&mut self, total: f64) {
        self.total = total;
        self.updated_at = Utc::now();
    }

    /// Current lifecycle status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// When the order was created; set once, immutable
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the order was last modified
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The append-only status history, oldest first
    pub fn history(&self) -> &[StatusRecord] {
        &self.history
    }

    /// Attempt a status transition, consulting the adjacency table.
    ///
    /// On success the status and `updated_at` are mutated, the change is
    /// appended to the history, and `true` is returned. On failure the
    /// entity is left untouched and `false` is returned; raising a typed
    /// error is the caller's decision.
    ///
    /// This is the only sanctioned path to change an order's status.
    pub fn attempt_transition(&mut self, target: OrderStatus) -> bool {
        if !self.status.can_transition_to(&target) {
            return false;
        }

        let record = StatusRecord::now(target);
        self.status = target;
        self.updated_at = record.timestamp;
        self.history.push(record);
        true
    }

    /// Check whether the order can transition no further
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Identity is the storage-assigned id, not field values.
impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order{{id={:?}, customer='{}', total={:.2}, status={}, createdAt={}, updatedAt={}}}",
            self.id, self.customer, self.total, self.status, self.created_at, self.updated_at
        )
    }
}
