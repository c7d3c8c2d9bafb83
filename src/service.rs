// Copyright 2025 Cowboy AI, LLC.

//! The order transition service
//!
//! `OrderService` is the single sanctioned entry point for changing an
//! order's status. Concurrent transition attempts on the same order are
//! serialized through a per-identifier handle, while unrelated orders
//! never block each other; the validation inside the critical section
//! always sees the freshest committed state, so a contested transition has
//! exactly one winner and never a lost update.

use crate::{
    errors::{OrderError, OrderResult},
    order::Order,
    repository::OrderRepository,
    status::OrderStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Business service for order lifecycle operations
///
/// # Concurrency
///
/// Each order identifier gets its own mutual-exclusion handle, created
/// atomically on first use and retained for the service's lifetime (growth
/// is proportional to distinct ids ever touched, which is accepted for
/// this scope). Acquiring a handle waits indefinitely by design; callers
/// that need a deadline can wrap calls in `tokio::time::timeout`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use order_domain::{InMemoryOrderRepository, OrderService, OrderStatus};
///
/// # tokio_test::block_on(async {
/// let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()));
///
/// let order = service.create_order("Alice", 99.99).await.unwrap();
/// let id = order.id().unwrap();
///
/// let paid = service.transition(id, OrderStatus::Paid).await.unwrap();
/// assert_eq!(paid.status(), OrderStatus::Paid);
///
/// // Paid -> Created is not in the adjacency table
/// assert!(service.transition(id, OrderStatus::Created).await.is_err());
/// # });
/// ```
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    /// Per-order transition handles, keyed by identifier.
    ///
    /// Get-or-create happens under the outer lock in one indivisible step,
    /// never as a check-then-act pair.
    locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl OrderService {
    /// Create a service over the given repository
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self {
            repository,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The repository behind this service
    pub fn repository(&self) -> &Arc<dyn OrderRepository> {
        &self.repository
    }

    /// Atomically look up or create the mutual-exclusion handle for an id.
    ///
    /// The registry lock is held only for the lookup; the returned handle
    /// is what serializes the actual transition work.
    async fn lock_handle(&self, id: u64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create a new order in the initial status
    pub async fn create_order(
        &self,
        customer: impl Into<String>,
        total: f64,
    ) -> OrderResult<Order> {
        let order = self.repository.save(Order::new(customer, total)).await?;
        info!(
            order_id = order.id().unwrap_or_default(),
            customer = order.customer(),
            total = order.total(),
            "Order created"
        );
        Ok(order)
    }

    /// Retrieve an order by id
    pub async fn get_order(&self, id: u64) -> OrderResult<Order> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound { id })
    }

    /// Delete an order by id.
    ///
    /// Holds the same per-id handle as [`transition`](Self::transition), so
    /// a delete can never interleave with a concurrent transition's
    /// fetch-validate-save window.
    pub async fn delete_order(&self, id: u64) -> OrderResult<()> {
        let handle = self.lock_handle(id).await;
        let _guard = handle.lock().await;

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(OrderError::NotFound { id });
        }
        self.repository.delete_by_id(id).await?;
        info!(order_id = id, "Order deleted");
        Ok(())
    }

    /// Transition an order to a new status.
    ///
    /// Fetch, validation, and persistence execute as one indivisible unit
    /// with respect to any other call for the same id:
    ///
    /// 1. look up or create the per-id handle (atomic);
    /// 2. acquire it, waiting as long as it takes;
    /// 3. fetch the order — absent ids fail with [`OrderError::NotFound`];
    /// 4. validate against the *now-current* status — a competing caller
    ///    may have moved the order while we waited, which is exactly why
    ///    the check happens after acquisition;
    /// 5. mutate, persist, release.
    ///
    /// Failures leave storage unmodified and are never retried here.
    pub async fn transition(&self, id: u64, target: OrderStatus) -> OrderResult<Order> {
        let handle = self.lock_handle(id).await;
        let _guard = handle.lock().await;

        let mut order = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound { id })?;

        let from = order.status();
        if !order.attempt_transition(target) {
            debug!(
                order_id = id,
                from = %from,
                to = %target,
                "Rejected invalid transition"
            );
            return Err(OrderError::InvalidTransition {
                id,
                from,
                to: target,
            });
        }

        let stored = self.repository.save(order).await?;
        info!(order_id = id, from = %from, to = %target, "Order transitioned");
        Ok(stored)
    }

    /// Pay an order (transition to `Paid`)
    pub async fn pay(&self, id: u64) -> OrderResult<Order> {
        self.transition(id, OrderStatus::Paid).await
    }

    /// Ship an order (transition to `Shipped`)
    pub async fn ship(&self, id: u64) -> OrderResult<Order> {
        self.transition(id, OrderStatus::Shipped).await
    }

    /// Deliver an order (transition to `Delivered`)
    pub async fn deliver(&self, id: u64) -> OrderResult<Order> {
        self.transition(id, OrderStatus::Delivered).await
    }

    /// Cancel an order (transition to `Cancelled`)
    pub async fn cancel(&self, id: u64) -> OrderResult<Order> {
        self.transition(id, OrderStatus::Cancelled).await
    }

    /// All orders currently in the system
    pub async fn all_orders(&self) -> OrderResult<Vec<Order>> {
        self.repository.find_all().await
    }

    /// Orders currently holding the given status
    pub async fn orders_by_status(&self, status: OrderStatus) -> OrderResult<Vec<Order>> {
        Ok(self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|o| o.status() == status)
            .collect())
    }

    /// Orders in a terminal status
    pub async fn completed_orders(&self) -> OrderResult<Vec<Order>> {
        Ok(self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(Order::is_terminal)
            .collect())
    }

    /// Sum of totals over orders holding the given status
    pub async fn total_by_status(&self, status: OrderStatus) -> OrderResult<f64> {
        Ok(self
            .repository
            .find_all()
            .await?
            .iter()
            .filter(|o| o.status() == status)
            .map(Order::total)
            .sum())
    }

    /// Number of orders holding the given status
    pub async fn count_by_status(&self, status: OrderStatus) -> OrderResult<usize> {
        Ok(self
            .repository
            .find_all()
            .await?
            .iter()
            .filter(|o| o.status() == status)
            .count())
    }
}
