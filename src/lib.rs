// Copyright 2025 Cowboy AI, LLC.

//! # Order Domain
//!
//! An order lifecycle domain: a status state machine, interchangeable
//! storage backends, and a concurrency-safe transition service.
//!
//! Building blocks:
//! - **OrderStatus**: closed lifecycle enumeration with a static,
//!   table-driven adjacency function and terminal-state predicate
//! - **Order**: entity with storage-assigned identity, immutable creation
//!   metadata, and an append-only status history
//! - **OrderRepository**: async persistence contract with volatile
//!   (in-memory map) and durable (JSON snapshot file) implementations
//! - **OrderService**: the single entry point for status changes;
//!   serializes concurrent attempts per order through lazily created
//!   mutual-exclusion handles while unrelated orders proceed independently
//! - **OrderScheduler**: periodic collaborator that auto-advances orders
//!   past a waiting status after a configured delay
//!
//! ## Design Principles
//!
//! 1. **Validated transitions only**: status changes exist solely as
//!    adjacency-table-checked transitions; direct assignment is not a
//!    supported path
//! 2. **Freshest-state validation**: validation happens after lock
//!    acquisition, never against a stale read
//! 3. **Typed failures**: `NotFound` and `InvalidTransition` carry the
//!    identifiers and statuses callers need to branch on
//! 4. **Atomic persistence**: the file backend rewrites its snapshot
//!    through a temp-file-and-rename so readers never observe a torn write

#![warn(missing_docs)]

mod errors;
mod order;
mod repository;
mod scheduler;
mod service;
mod status;

pub use errors::{OrderError, OrderResult};
pub use order::Order;
pub use repository::{FileOrderRepository, InMemoryOrderRepository, OrderRepository};
pub use scheduler::{OrderScheduler, SchedulerConfig};
pub use service::OrderService;
pub use status::{transitions_from, OrderStatus, StatusRecord, ALL_STATUSES};
