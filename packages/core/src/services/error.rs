//! Service Layer Error Types
//!
//! This module defines error types for tree engine operations. Every error
//! bubbles to the caller of the lifecycle hook that produced it; nothing is
//! swallowed or retried at this layer.

use crate::db::StoreError;
use thiserror::Error;

/// Tree engine operation errors
///
/// Taxonomy:
/// - missing references are fatal precondition violations raised before any
///   partial write
/// - store errors propagate unchanged
/// - integrity violations signal a bug in the engine, not caller misuse
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// An operation referenced a parent that does not resolve
    #[error("Referenced parent node not found: {parent_id}")]
    ParentNotFound { parent_id: String },

    /// A reparent would place a node under itself or one of its descendants
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// The single-root invariant does not hold
    #[error("Root invariant violated: {0}")]
    RootViolation(String),

    /// A post-condition check found the tree in an inconsistent state
    #[error("Tree integrity violated: {0}")]
    IntegrityViolation(String),

    /// Store operation failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a parent not found error
    pub fn parent_not_found(parent_id: impl Into<String>) -> Self {
        Self::ParentNotFound {
            parent_id: parent_id.into(),
        }
    }

    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    /// Create a root invariant error
    pub fn root_violation(msg: impl Into<String>) -> Self {
        Self::RootViolation(msg.into())
    }

    /// Create an integrity violation error
    pub fn integrity_violation(msg: impl Into<String>) -> Self {
        Self::IntegrityViolation(msg.into())
    }
}
