//! In-Memory Node Store
//!
//! Reference `NodeStore` implementation backed by a `tokio::sync::RwLock`.
//! Used as the embedded backend and by the whole test suite.
//!
//! Insertion order is tracked explicitly so that `children_of` has a stable
//! tie-break when two siblings transiently share a `position` (a node inserted
//! at an occupied slot before renumbering runs).
//!
//! A single lock per store gives the per-operation atomicity the engine
//! requires for single-writer use; it does not make concurrent structural
//! mutations of the same tree safe (see the crate-level concurrency notes).

use crate::db::{NodeStore, StoreError};
use crate::models::{TreeNode, TreeNodeUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, TreeNode>,
    /// Insertion order of IDs, the stable tie-break for `children_of`
    order: Vec<String>,
}

/// In-memory `NodeStore` backed by a `RwLock`-protected map.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently stored.
    pub async fn len(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    /// Whether the store holds no nodes.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.nodes.is_empty()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<TreeNode>, StoreError> {
        Ok(self.inner.read().await.nodes.get(id).cloned())
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<TreeNode>, StoreError> {
        let inner = self.inner.read().await;
        // Scan in insertion order, then a stable sort by position keeps that
        // order for ties.
        let mut children: Vec<TreeNode> = inner
            .order
            .iter()
            .filter_map(|id| inner.nodes.get(id))
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(|n| n.position);
        Ok(children)
    }

    async fn insert(&self, node: TreeNode) -> Result<TreeNode, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.nodes.contains_key(&node.id) {
            return Err(StoreError::duplicate_id(&node.id));
        }
        inner.order.push(node.id.clone());
        inner.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn update_fields(
        &self,
        id: &str,
        update: TreeNodeUpdate,
    ) -> Result<TreeNode, StoreError> {
        let mut inner = self.inner.write().await;
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::missing_node(id))?;
        update.apply(node);
        node.modified_at = Utc::now();
        Ok(node.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.nodes.remove(id).is_some() {
            inner.order.retain(|existing| existing != id);
        }
        Ok(())
    }

    async fn find_root(&self) -> Result<Option<TreeNode>, StoreError> {
        let inner = self.inner.read().await;
        let mut roots = inner
            .order
            .iter()
            .filter_map(|id| inner.nodes.get(id))
            .filter(|n| n.is_root && n.parent_id.is_none());

        let first = roots.next().cloned();
        let extra = roots.count();
        if extra > 0 {
            return Err(StoreError::MultipleRoots { count: extra + 1 });
        }
        Ok(first)
    }

    async fn nodes_in_interval(&self, lft: i64, rgt: i64) -> Result<Vec<TreeNode>, StoreError> {
        let inner = self.inner.read().await;
        let mut nodes: Vec<TreeNode> = inner
            .nodes
            .values()
            .filter(|n| n.lft >= lft && n.lft <= rgt)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.lft);
        Ok(nodes)
    }
}
