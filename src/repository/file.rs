// Copyright 2025 Cowboy AI, LLC.

//! File-backed order repository
//!
//! Persists orders as a single JSON snapshot document:
//!
//! ```json
//! {
//!   "orders": [
//!     {
//!       "id": 1,
//!       "customer": "Alice",
//!       "total": 99.99,
//!       "status": "Created",
//!       "createdAt": "2025-12-28T09:00:00Z",
//!       "updatedAt": "2025-12-28T09:00:00Z",
//!       "history": []
//!     }
//!   ],
//!   "nextId": 2
//! }
//! ```
//!
//! The in-memory map acts as a cache, lazily hydrated from the file on
//! first access. Every mutation rewrites the whole snapshot through a
//! temporary file followed by an atomic rename, so a crash mid-write never
//! leaves a truncated document behind. The state lock serializes all
//! writers to the one file; it is distinct from the service's per-order
//! transition handles.

use crate::{
    errors::{OrderError, OrderResult},
    order::Order,
    repository::OrderRepository,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// On-disk snapshot document
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    orders: Vec<Order>,
    next_id: u64,
}

#[derive(Debug, Default)]
struct FileState {
    store: HashMap<u64, Order>,
    next_id: u64,
    loaded: bool,
}

/// JSON-file-backed implementation of [`OrderRepository`]
///
/// Restarting the process over the same file reproduces identical logical
/// state, including which identifier is assigned next.
#[derive(Debug)]
pub struct FileOrderRepository {
    path: PathBuf,
    state: RwLock<FileState>,
}

impl FileOrderRepository {
    /// Create a repository backed by the given data file.
    ///
    /// The file does not need to exist yet; it is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(FileState {
                store: HashMap::new(),
                next_id: 1,
                loaded: false,
            }),
        }
    }

    /// Path of the data file behind this repository
    pub fn data_path(&self) -> &Path {
        &self.path
    }

    /// Wipe the cache, reset the id sequence, and delete the data file.
    pub async fn clear_all(&self) -> OrderResult<()> {
        let mut state = self.state.write().await;
        state.store.clear();
        state.next_id = 1;
        state.loaded = true;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_loaded(&self, state: &mut FileState) -> OrderResult<()> {
        if state.loaded {
            return Ok(());
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content)?;
                let mut highest = 0;
                for order in snapshot.orders {
                    let id = order.id().ok_or_else(|| {
                        OrderError::Serialization(format!(
                            "order without id in {}",
                            self.path.display()
                        ))
                    })?;
                    highest = highest.max(id);
                    state.store.insert(id, order);
                }
                // The reloaded sequence must stay strictly above every id
                // ever assigned, even if the persisted counter lagged.
                state.next_id = snapshot.next_id.max(highest + 1);

                debug!(
                    path = %self.path.display(),
                    orders = state.store.len(),
                    next_id = state.next_id,
                    "Hydrated order snapshot"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        state.loaded = true;
        Ok(())
    }

    /// Rewrite the whole snapshot: temp file in the same directory, then
    /// atomic rename over the data file.
    async fn persist(&self, state: &FileState) -> OrderResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut orders: Vec<Order> = state.store.values().cloned().collect();
        orders.sort_by_key(|o| o.id());

        let snapshot = Snapshot {
            orders,
            next_id: state.next_id,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            path = %self.path.display(),
            orders = state.store.len(),
            "Persisted order snapshot"
        );
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for FileOrderRepository {
    async fn save(&self, mut order: Order) -> OrderResult<Order> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await?;

        let id = match order.id() {
            Some(id) => id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                order.assign_id(id);
                id
            }
        };

        state.store.insert(id, order.clone());
        self.persist(&state).await?;
        Ok(order)
    }

    async fn find_by_id(&self, id: u64) -> OrderResult<Option<Order>> {
        {
            let state = self.state.read().await;
            if state.loaded {
                return Ok(state.store.get(&id).cloned());
            }
        }

        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.store.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: u64) -> OrderResult<()> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await?;

        if state.store.remove(&id).is_some() {
            self.persist(&state).await?;
        }
        Ok(())
    }

    async fn find_all(&self) -> OrderResult<Vec<Order>> {
        {
            let state = self.state.read().await;
            if state.loaded {
                return Ok(state.store.values().cloned().collect());
            }
        }

        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.store.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::OrderStatus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_creates_file_and_assigns_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let repo = FileOrderRepository::new(&path);

        let saved = repo.save(Order::new("Alice", 99.99)).await.unwrap();

        assert_eq!(saved.id(), Some(1));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reload_reproduces_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");

        {
            let repo = FileOrderRepository::new(&path);
            let order = repo.save(Order::new("Alice", 99.99)).await.unwrap();
            let mut order = order;
            assert!(order.attempt_transition(OrderStatus::Paid));
            repo.save(order).await.unwrap();
            repo.save(Order::new("Bob", 10.0)).await.unwrap();
        }

        let reloaded = FileOrderRepository::new(&path);
        let all = reloaded.find_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let alice = reloaded.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(alice.customer(), "Alice");
        assert_eq!(alice.status(), OrderStatus::Paid);
        assert_eq!(alice.history().len(), 2);

        // Sequence resumes above everything previously assigned
        let next = reloaded.save(Order::new("Carol", 1.0)).await.unwrap();
        assert_eq!(next.id(), Some(3));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_repository() {
        let dir = tempdir().unwrap();
        let repo = FileOrderRepository::new(dir.path().join("absent.json"));

        assert!(repo.find_all().await.unwrap().is_empty());
        assert!(repo.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_reports_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        tokio::fs::write(&path, "{ this is not json").await.unwrap();

        let repo = FileOrderRepository::new(&path);
        let err = repo.find_all().await.unwrap_err();
        assert!(matches!(err, OrderError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_delete_rewrites_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let repo = FileOrderRepository::new(&path);

        repo.save(Order::new("Alice", 1.0)).await.unwrap();
        repo.save(Order::new("Bob", 2.0)).await.unwrap();
        repo.delete_by_id(1).await.unwrap();

        let reloaded = FileOrderRepository::new(&path);
        let all = reloaded.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].customer(), "Bob");
    }

    #[tokio::test]
    async fn test_delete_absent_id_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let repo = FileOrderRepository::new(&path);

        repo.delete_by_id(42).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_clear_all_resets_sequence_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let repo = FileOrderRepository::new(&path);

        repo.save(Order::new("Alice", 1.0)).await.unwrap();
        repo.clear_all().await.unwrap();

        assert!(!path.exists());
        assert!(repo.find_all().await.unwrap().is_empty());
        let fresh = repo.save(Order::new("Bob", 2.0)).await.unwrap();
        assert_eq!(fresh.id(), Some(1));
    }

    #[tokio::test]
    async fn test_customer_escaping_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let repo = FileOrderRepository::new(&path);

        let customer = "line\nbreak \"quotes\" \\slash\\ tab\t";
        repo.save(Order::new(customer, 3.5)).await.unwrap();

        let reloaded = FileOrderRepository::new(&path);
        let back = reloaded.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(back.customer(), customer);
    }
}
