// Copyright 2025 Cowboy AI, LLC.

//! Order persistence contracts and implementations
//!
//! Two interchangeable backends: a volatile in-memory map and a JSON
//! snapshot file. Both assign sequential identifiers at first save and are
//! safe under concurrent access without external locking by callers.

mod file;
mod memory;

pub use file::FileOrderRepository;
pub use memory::InMemoryOrderRepository;

use crate::{errors::OrderResult, order::Order};
use async_trait::async_trait;

/// Repository contract for order persistence
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Upsert an order by identifier, assigning the next sequential id if
    /// the order has none yet. Returns the stored value.
    async fn save(&self, order: Order) -> OrderResult<Order>;

    /// Look up an order by identifier
    async fn find_by_id(&self, id: u64) -> OrderResult<Option<Order>>;

    /// Remove an order by identifier. Idempotent: removing an absent id is
    /// a no-op; "not found" semantics belong to the service layer.
    async fn delete_by_id(&self, id: u64) -> OrderResult<()>;

    /// A point-in-time snapshot of all orders, not a live view
    async fn find_all(&self) -> OrderResult<Vec<Order>>;
}
