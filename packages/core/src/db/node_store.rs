//! NodeStore Trait - Storage Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence for
//! tree nodes. The trait is the only boundary the engine talks through: it can
//! fetch a node by identifier, fetch direct children ordered by position,
//! persist structural fields and delete a node, without caring how those
//! operations are implemented.
//!
//! # Architecture
//!
//! - **Abstraction Point**: between `TreeService` (invariant maintenance) and
//!   the storage backend
//! - **Hook-Free Writes**: `update_fields` and `delete` never re-invoke the
//!   mutation lifecycle; that is what keeps the position manager and interval
//!   assigner from recursing through their own hooks
//! - **Serialization Contract**: the store must serialize mutations per tree
//!   (exclusive lock or serializable transaction); the engine itself holds no
//!   state between calls
//!
//! # Examples
//!
//! ```rust,no_run
//! use treespace_core::db::{MemoryStore, NodeStore};
//! use treespace_core::models::TreeNode;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
//!
//!     let node = TreeNode::new("chapter-1", None, json!({}));
//!     let created = store.insert(node).await?;
//!     assert!(store.get(&created.id).await?.is_some());
//!     Ok(())
//! }
//! ```

use crate::db::StoreError;
use crate::models::{TreeNode, TreeNodeUpdate};
use async_trait::async_trait;

/// Abstraction layer for tree node persistence.
///
/// All methods are async to support both embedded and networked backends.
/// Implementations must be `Send + Sync` so futures may move between threads.
///
/// # Ordering Guarantee
///
/// `children_of` always returns children ordered by `position` ascending with
/// a stable tie-break (store iteration order). Renumbering and interval
/// assignment rely on this to be deterministic for a fixed storage state.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get a node by ID.
    ///
    /// Returns `Ok(None)` when the node does not exist; absence is not an
    /// error at this layer.
    async fn get(&self, id: &str) -> Result<Option<TreeNode>, StoreError>;

    /// Get the direct children of a node, ordered by `position` ascending.
    ///
    /// Ties on `position` (e.g. a node inserted at an occupied slot before
    /// renumbering runs) are broken by stable store iteration order.
    async fn children_of(&self, parent_id: &str) -> Result<Vec<TreeNode>, StoreError>;

    /// Insert a new node.
    ///
    /// Takes ownership of the node and returns the persisted record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateId` if the ID is already present.
    async fn insert(&self, node: TreeNode) -> Result<TreeNode, StoreError>;

    /// Persist only the provided structural fields of a node.
    ///
    /// This write path never re-invokes lifecycle hooks. Returns the updated
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingNode` if the ID does not resolve.
    async fn update_fields(&self, id: &str, update: TreeNodeUpdate)
        -> Result<TreeNode, StoreError>;

    /// Delete a node without invoking lifecycle hooks.
    ///
    /// Deleting a non-existent node succeeds (idempotent delete); cascading
    /// removal of descendants is the engine's job, not the store's.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Find the unique synthetic root (`is_root = true`, `parent_id = NULL`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MultipleRoots` if more than one candidate exists;
    /// this is reported, not silently repaired.
    async fn find_root(&self) -> Result<Option<TreeNode>, StoreError>;

    /// All nodes whose `lft` lies within `[lft, rgt]`, ordered by `lft`
    /// ascending.
    ///
    /// With nested-set numbering this is a subtree scan when called with a
    /// node's own bounds, and a whole-tree scan when called with the root's.
    async fn nodes_in_interval(&self, lft: i64, rgt: i64) -> Result<Vec<TreeNode>, StoreError>;
}
