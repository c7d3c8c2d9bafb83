// Copyright 2025 Cowboy AI, LLC.

//! Background scheduler for automatic order transitions
//!
//! Periodically scans storage for orders sitting in a waiting status longer
//! than a configured delay and advances them through the transition
//! service. The scheduler is just another caller of
//! [`OrderService::transition`]; all atomicity comes from the service's
//! per-order handles, so it is safe to run alongside request-driven
//! callers.

use crate::{service::OrderService, status::OrderStatus};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long `stop` waits for the scan task before forcing it down
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Scheduler tuning knobs
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Status a scanned order must hold to be considered
    pub waiting_status: OrderStatus,
    /// Status the scheduler advances matching orders to
    pub target_status: OrderStatus,
    /// Minimum age of the order's last modification before it is advanced
    pub transition_delay: chrono::Duration,
    /// How often the scan runs
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            waiting_status: OrderStatus::Paid,
            target_status: OrderStatus::Shipped,
            transition_delay: chrono::Duration::minutes(5),
            poll_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    handle: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

/// Periodic auto-advance collaborator
///
/// Orders it has already advanced are remembered in a duplicate-suppression
/// set for the scheduler's lifetime, cleared only by
/// [`clear_processed`](Self::clear_processed) or a restart. A transition
/// that loses a race to another actor is expected and never aborts the
/// scan of remaining orders.
pub struct OrderScheduler {
    service: Arc<OrderService>,
    config: SchedulerConfig,
    processed: Arc<Mutex<HashSet<u64>>>,
    state: Mutex<SchedulerState>,
}

impl OrderScheduler {
    /// Create a scheduler with the default configuration
    pub fn new(service: Arc<OrderService>) -> Self {
        Self::with_config(service, SchedulerConfig::default())
    }

    /// Create a scheduler with explicit tuning
    pub fn with_config(service: Arc<OrderService>, config: SchedulerConfig) -> Self {
        Self {
            service,
            config,
            processed: Arc::new(Mutex::new(HashSet::new())),
            state: Mutex::new(SchedulerState::default()),
        }
    }

    /// Start the background scan task. Idempotent: a second start while
    /// running only logs a warning.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.handle.is_some() {
            warn!("OrderScheduler is already running");
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        let service = self.service.clone();
        let processed = self.processed.clone();
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scan(&service, &processed, &config).await;
                    }
                    _ = rx.changed() => {
                        debug!("OrderScheduler scan task shutting down");
                        break;
                    }
                }
            }
        });

        state.handle = Some(handle);
        state.shutdown = Some(tx);
        info!(
            waiting = %self.config.waiting_status,
            target = %self.config.target_status,
            delay_secs = self.config.transition_delay.num_seconds(),
            "OrderScheduler started"
        );
    }

    /// Stop the background task, waiting a bounded grace period before
    /// forcing it down. Idempotent: stopping a stopped scheduler only logs
    /// a warning.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let Some(handle) = state.handle.take() else {
            warn!("OrderScheduler is not running");
            return;
        };

        if let Some(tx) = state.shutdown.take() {
            let _ = tx.send(true);
        }

        let abort = handle.abort_handle();
        match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
            Ok(_) => info!("OrderScheduler stopped"),
            Err(_) => {
                warn!("OrderScheduler shutdown timeout, forcing stop");
                abort.abort();
            }
        }
    }

    /// Whether the scan task is currently running
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    /// Number of orders this scheduler has advanced
    pub async fn processed_count(&self) -> usize {
        self.processed.lock().await.len()
    }

    /// Whether this scheduler has already advanced the given order
    pub async fn is_processed(&self, id: u64) -> bool {
        self.processed.lock().await.contains(&id)
    }

    /// Forget every advanced order, forcing re-consideration on the next
    /// scan. Mainly a testing and manual-refresh hook.
    pub async fn clear_processed(&self) {
        self.processed.lock().await.clear();
        debug!("Cleared processed order tracking set");
    }

    /// Run one scan inline without the background task. Useful for tests
    /// and manual triggering.
    pub async fn run_once(&self) {
        scan(&self.service, &self.processed, &self.config).await;
    }
}

/// One pass over storage: advance every order in the waiting status whose
/// last modification is older than the configured delay.
///
/// A failure for one order never aborts the scan of the rest.
async fn scan(
    service: &OrderService,
    processed: &Mutex<HashSet<u64>>,
    config: &SchedulerConfig,
) {
    let orders = match service.all_orders().await {
        Ok(orders) => orders,
        Err(e) => {
            warn!(error = %e, "Scheduler scan could not list orders");
            return;
        }
    };

    let now = Utc::now();
    for order in orders {
        if order.status() != config.waiting_status {
            continue;
        }
        let Some(id) = order.id() else { continue };

        if processed.lock().await.contains(&id) {
            continue;
        }

        let age = now - order.updated_at();
        if age < config.transition_delay {
            debug!(
                order_id = id,
                age_secs = age.num_seconds(),
                needed_secs = config.transition_delay.num_seconds(),
                "Order not aged enough, skipping"
            );
            continue;
        }

        match service.transition(id, config.target_status).await {
            Ok(_) => {
                processed.lock().await.insert(id);
                info!(
                    order_id = id,
                    from = %config.waiting_status,
                    to = %config.target_status,
                    "Automatic transition"
                );
            }
            Err(e) if e.is_invalid_transition() => {
                // Another actor moved the order while we scanned
                debug!(order_id = id, error = %e, "Transition lost a race, skipping");
            }
            Err(e) => {
                warn!(order_id = id, error = %e, "Automatic transition failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryOrderRepository;

    fn scheduler(config: SchedulerConfig) -> OrderScheduler {
        let service = Arc::new(OrderService::new(Arc::new(InMemoryOrderRepository::new())));
        OrderScheduler::with_config(service, config)
    }

    #[tokio::test]
    async fn test_start_stop_idempotent() {
        let scheduler = scheduler(SchedulerConfig::default());

        assert!(!scheduler.is_running().await);
        scheduler.start().await;
        scheduler.start().await;
        assert!(scheduler.is_running().await);

        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.waiting_status, OrderStatus::Paid);
        assert_eq!(config.target_status, OrderStatus::Shipped);
        assert_eq!(config.transition_delay, chrono::Duration::minutes(5));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }
}
