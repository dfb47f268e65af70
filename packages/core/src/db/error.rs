//! Store Error Types
//!
//! This module defines error types for node store operations, providing
//! clear error handling for persistence failures. Higher-level invariant
//! errors are handled by service-layer error types.

use thiserror::Error;

/// Node store operation errors
///
/// Covers the failure modes of the abstract `NodeStore` contract. The engine
/// propagates these unchanged; it performs no retries.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert collided with an existing node ID
    #[error("Node already exists in store: {id}")]
    DuplicateId { id: String },

    /// Update referenced a node ID that does not exist
    #[error("Node not found in store: {id}")]
    MissingNode { id: String },

    /// More than one root detected; should be unreachable while this engine
    /// is the sole mutator
    #[error("Multiple root nodes found: {count}")]
    MultipleRoots { count: usize },

    /// Backend-specific failure with context
    #[error("Store operation failed: {context}")]
    Backend { context: String },
}

impl StoreError {
    /// Create a duplicate ID error
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Create a missing node error
    pub fn missing_node(id: impl Into<String>) -> Self {
        Self::MissingNode { id: id.into() }
    }

    /// Create a backend error with context
    pub fn backend(context: impl Into<String>) -> Self {
        Self::Backend {
            context: context.into(),
        }
    }
}
