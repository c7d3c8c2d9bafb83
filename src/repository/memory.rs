// Copyright 2025 Cowboy AI, LLC.

//! Volatile in-memory order repository

use crate::{errors::OrderResult, order::Order, repository::OrderRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Thread-safe in-memory implementation of [`OrderRepository`]
///
/// Orders live in a lock-guarded map keyed by identifier; identifiers come
/// from an atomic sequence starting at 1. No cross-process durability.
///
/// # Examples
///
/// ```rust
/// use order_domain::{InMemoryOrderRepository, Order, OrderRepository};
///
/// # tokio_test::block_on(async {
/// let repo = InMemoryOrderRepository::new();
/// let saved = repo.save(Order::new("Alice", 99.99)).await.unwrap();
/// assert_eq!(saved.id(), Some(1));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    store: RwLock<HashMap<u64, Order>>,
    id_seq: AtomicU64,
}

impl InMemoryOrderRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            id_seq: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, mut order: Order) -> OrderResult<Order> {
        let id = match order.id() {
            Some(id) => id,
            None => {
                let id = self.id_seq.fetch_add(1, Ordering::SeqCst);
                order.assign_id(id);
                id
            }
        };

        self.store.write().await.insert(id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: u64) -> OrderResult<Option<Order>> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: u64) -> OrderResult<()> {
        self.store.write().await.remove(&id);
        Ok(())
    }

    async fn find_all(&self) -> OrderResult<Vec<Order>> {
        Ok(self.store.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::OrderStatus;

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemoryOrderRepository::new();

        let first = repo.save(Order::new("Alice", 1.0)).await.unwrap();
        let second = repo.save(Order::new("Bob", 2.0)).await.unwrap();

        assert_eq!(first.id(), Some(1));
        assert_eq!(second.id(), Some(2));
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let repo = InMemoryOrderRepository::new();

        let mut order = repo.save(Order::new("Alice", 1.0)).await.unwrap();
        assert!(order.attempt_transition(OrderStatus::Paid));
        repo.save(order.clone()).await.unwrap();

        let found = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found.status(), OrderStatus::Paid);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.find_by_id(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = InMemoryOrderRepository::new();
        repo.save(Order::new("Alice", 1.0)).await.unwrap();

        repo.delete_by_id(1).await.unwrap();
        repo.delete_by_id(1).await.unwrap();

        assert!(repo.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_is_a_snapshot() {
        let repo = InMemoryOrderRepository::new();
        repo.save(Order::new("Alice", 1.0)).await.unwrap();

        let snapshot = repo.find_all().await.unwrap();
        repo.save(Order::new("Bob", 2.0)).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_unique_ids() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let repo = Arc::new(InMemoryOrderRepository::new());
        let mut handles = Vec::new();

        for i in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.save(Order::new(format!("customer-{i}"), 1.0))
                    .await
                    .unwrap()
                    .id()
                    .unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 50);
    }
}
