// Copyright 2025 Cowboy AI, LLC.

//! Error types for order operations

use crate::status::OrderStatus;
use thiserror::Error;

/// Errors that can occur while operating on orders
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// The referenced order does not exist in storage
    #[error("Order not found: {id}")]
    NotFound {
        /// ID that was searched for
        id: u64,
    },

    /// The requested status change is not in the adjacency table
    #[error("Invalid state transition for order {id}: cannot transition from {from} to {to}")]
    InvalidTransition {
        /// ID of the order
        id: u64,
        /// Status the order currently holds
        from: OrderStatus,
        /// Status that was requested
        to: OrderStatus,
    },

    /// Storage I/O failure (file-backed repository)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        OrderError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for OrderError {
    fn from(err: std::io::Error) -> Self {
        OrderError::Storage(err.to_string())
    }
}

impl OrderError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrderError::NotFound { .. })
    }

    /// Check if this is an invalid transition error
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, OrderError::InvalidTransition { .. })
    }
}
