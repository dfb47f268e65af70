//! Tree Service - Nested-Set Invariant Maintenance
//!
//! This module provides the engine that keeps a hierarchical collection of
//! records consistent inside a flat, ordered store:
//!
//! - Root management (exactly one synthetic root per tree, created lazily)
//! - Position management (dense, 1-based, gap-free sibling ordering)
//! - Interval assignment (full nested-set renumbering of `lft`/`rgt`)
//! - Level propagation (depth recomputation across a moved subtree)
//! - Mutation lifecycle (the pre/post pipeline composing all of the above)
//!
//! # Numbering Scheme
//!
//! The rebuild walks the tree pre-order, incrementing a counter on every node
//! entry (`lft = counter`) and closing the node with `rgt = counter` after its
//! descendants. Leaves therefore end with `rgt == lft`, and for every node
//! `rgt - lft` equals its descendant count.
//!
//! # Interval Maintenance Policy
//!
//! Pre hooks seed `lft`/`rgt` with placeholders from the parent's bounds; only
//! a full rebuild makes them globally correct. Every end-to-end operation
//! (`create_node`, `update_node`, `delete_node`) therefore finishes with a
//! full O(n) rebuild. Callers driving the hooks directly (bulk loads) must
//! invoke `rebuild_intervals` themselves afterwards.
//!
//! # Concurrency
//!
//! Each mutation is a plain sequential read/write sequence with no engine
//! level locking. Concurrent structural mutations of the same tree are not
//! safe; the store must serialize them per tree.

use crate::db::NodeStore;
use crate::models::{TreeNode, TreeNodeUpdate, ROOT_LEVEL};
use crate::services::error::TreeServiceError;
use crate::services::lifecycle::TreeLifecycle;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;

/// Name given to the synthetic root of every tree.
pub const ROOT_NAME: &str = "_root_";

/// Explicit traversal frame for the iterative interval rebuild.
struct Frame {
    node: TreeNode,
    children: Vec<TreeNode>,
    next: usize,
}

/// Nested-set tree engine over an abstract [`NodeStore`].
///
/// The service holds no tree state of its own between calls; every operation
/// is stateless given the store's current contents.
///
/// # Examples
///
/// ```rust
/// use treespace_core::db::MemoryStore;
/// use treespace_core::models::TreeNode;
/// use treespace_core::services::TreeService;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = TreeService::new(Arc::new(MemoryStore::new()));
///
/// // Creating the first node lazily creates the synthetic root
/// let chapter = service
///     .create_node(TreeNode::new("chapter-1", None, json!({})))
///     .await?;
/// assert_eq!(chapter.level, 0);
/// assert_eq!(chapter.position, 1);
/// # Ok(())
/// # }
/// ```
pub struct TreeService<S: NodeStore> {
    store: Arc<S>,
}

impl<S: NodeStore> TreeService<S> {
    /// Create a new TreeService over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    ///
    /// Useful for reads that do not need lifecycle orchestration.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch a node or fail with `NodeNotFound`.
    async fn require(&self, id: &str) -> Result<TreeNode, TreeServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(id))
    }

    //
    // ROOT MANAGER
    //

    /// Read-only root lookup.
    ///
    /// Used by steps that must distinguish "root missing" from "root present"
    /// without triggering creation, notably the rebuild itself.
    pub async fn find_root_or_none(&self) -> Result<Option<TreeNode>, TreeServiceError> {
        Ok(self.store.find_root().await?)
    }

    /// Return the unique root node, creating it if absent.
    ///
    /// Creation persists the root with `level = -1`, `position = 0`, `lft = 0`
    /// and an unbounded `rgt`, then runs a full interval rebuild so the bounds
    /// are real before any other operation proceeds.
    pub async fn get_or_create_root(&self) -> Result<TreeNode, TreeServiceError> {
        if let Some(root) = self.find_root_or_none().await? {
            return Ok(root);
        }

        let root = self.store.insert(TreeNode::new_root(ROOT_NAME)).await?;
        tracing::info!(root_id = %root.id, "created synthetic tree root");
        self.rebuild_intervals().await?;

        self.require(&root.id).await
    }

    //
    // POSITION MANAGER
    //

    /// Reassign dense 1-based positions to `node`'s sibling group.
    ///
    /// Insert/update case (`removed = false`): siblings are scanned in
    /// position order; the first sibling whose position is greater than or
    /// equal to the node's desired position marks the insertion point, the
    /// node claims the running counter there and everything after shifts up
    /// by one. A desired position past the end appends.
    ///
    /// Removal case (`removed = true`): the node is skipped and the remaining
    /// siblings are compacted into `1..n`.
    ///
    /// Changed positions are persisted through `update_fields`, which never
    /// re-enters the lifecycle. A parent-less node (the root) is a no-op.
    pub async fn renumber_siblings(
        &self,
        node: &TreeNode,
        removed: bool,
    ) -> Result<(), TreeServiceError> {
        let Some(parent_id) = node.parent_id.as_deref() else {
            return Ok(());
        };

        let siblings = self.store.children_of(parent_id).await?;
        let desired = node.position;
        let mut next: i64 = 1;
        let mut placed = removed;

        for sibling in siblings {
            if sibling.id == node.id {
                continue;
            }
            if !placed && sibling.position >= desired {
                placed = true;
                self.store
                    .update_fields(&node.id, TreeNodeUpdate::position(next))
                    .await?;
                next += 1;
            }
            if sibling.position != next {
                self.store
                    .update_fields(&sibling.id, TreeNodeUpdate::position(next))
                    .await?;
            }
            next += 1;
        }

        if !placed {
            self.store
                .update_fields(&node.id, TreeNodeUpdate::position(next))
                .await?;
        }

        Ok(())
    }

    //
    // INTERVAL ASSIGNER
    //

    /// Full nested-set renumbering of the whole tree.
    ///
    /// Pre-order walk from the root, children in position order, implemented
    /// with an explicit frame stack so deep trees cannot exhaust the call
    /// stack. O(n) store reads (one children fetch per node) and writes.
    /// No-op when no root exists yet.
    pub async fn rebuild_intervals(&self) -> Result<(), TreeServiceError> {
        let Some(mut root) = self.store.find_root().await? else {
            return Ok(());
        };

        let mut counter: i64 = 1;
        root.lft = counter;
        let children = self.store.children_of(&root.id).await?;
        let mut stack = vec![Frame {
            node: root,
            children,
            next: 0,
        }];
        let mut visited: usize = 1;

        loop {
            let next_child = match stack.last_mut() {
                None => break,
                Some(frame) => {
                    if frame.next < frame.children.len() {
                        let child = frame.children[frame.next].clone();
                        frame.next += 1;
                        Some(child)
                    } else {
                        None
                    }
                }
            };

            match next_child {
                Some(mut child) => {
                    counter += 1;
                    child.lft = counter;
                    visited += 1;
                    let grandchildren = self.store.children_of(&child.id).await?;
                    stack.push(Frame {
                        node: child,
                        children: grandchildren,
                        next: 0,
                    });
                }
                None => {
                    // All descendants visited: close the interval at the
                    // current counter and persist both bounds.
                    if let Some(frame) = stack.pop() {
                        self.store
                            .update_fields(
                                &frame.node.id,
                                TreeNodeUpdate::bounds(frame.node.lft, counter),
                            )
                            .await?;
                    }
                }
            }
        }

        tracing::debug!(nodes = visited, "rebuilt nested-set intervals");
        Ok(())
    }

    //
    // LEVEL PROPAGATOR
    //

    /// Recompute `level` for every descendant of `node`.
    ///
    /// Breadth-first: each child gets `parent.level + 1` before its own
    /// children are enqueued, so one pass settles the whole subtree.
    pub async fn propagate_levels(&self, node: &TreeNode) -> Result<(), TreeServiceError> {
        let mut queue: VecDeque<(TreeNode, i64)> = VecDeque::new();
        for child in self.store.children_of(&node.id).await? {
            queue.push_back((child, node.level));
        }

        while let Some((child, parent_level)) = queue.pop_front() {
            let level = parent_level + 1;
            if child.level != level {
                self.store
                    .update_fields(&child.id, TreeNodeUpdate::level(level))
                    .await?;
            }
            for grandchild in self.store.children_of(&child.id).await? {
                queue.push_back((grandchild, level));
            }
        }

        Ok(())
    }

    //
    // SUBTREE QUERIES
    //

    /// All descendants of `node_id` in breadth-first order (shallow first).
    pub async fn descendants(&self, node_id: &str) -> Result<Vec<TreeNode>, TreeServiceError> {
        let mut collected = Vec::new();
        let mut queue: VecDeque<TreeNode> =
            self.store.children_of(node_id).await?.into();

        while let Some(node) = queue.pop_front() {
            for child in self.store.children_of(&node.id).await? {
                queue.push_back(child);
            }
            collected.push(node);
        }

        Ok(collected)
    }

    /// Direct children of `parent_id`, ordered by position.
    pub async fn children(&self, parent_id: &str) -> Result<Vec<TreeNode>, TreeServiceError> {
        self.require(parent_id).await?;
        Ok(self.store.children_of(parent_id).await?)
    }

    /// Ordered children of the synthetic root (the tree's top-level nodes).
    pub async fn children_of_root(&self) -> Result<Vec<TreeNode>, TreeServiceError> {
        let root = self.get_or_create_root().await?;
        Ok(self.store.children_of(&root.id).await?)
    }

    /// The whole subtree under `parent_id` via interval scan, ordered by
    /// `lft` (pre-order).
    pub async fn subtree(
        &self,
        parent_id: &str,
        include_parent: bool,
    ) -> Result<Vec<TreeNode>, TreeServiceError> {
        let parent = self.require(parent_id).await?;
        let mut nodes = self.store.nodes_in_interval(parent.lft, parent.rgt).await?;
        if !include_parent {
            nodes.retain(|n| n.id != parent.id);
        }
        Ok(nodes)
    }

    /// Every non-root node outside the subtree of `parent_id`, ordered by
    /// `lft`. The classic "valid reparent targets" query.
    pub async fn all_except_subtree(
        &self,
        parent_id: &str,
    ) -> Result<Vec<TreeNode>, TreeServiceError> {
        let parent = self.require(parent_id).await?;
        let root = self
            .find_root_or_none()
            .await?
            .ok_or_else(|| TreeServiceError::root_violation("tree has no root node"))?;

        let mut nodes = self.store.nodes_in_interval(root.lft, root.rgt).await?;
        nodes.retain(|n| !n.is_root && (n.lft < parent.lft || n.lft > parent.rgt));
        Ok(nodes)
    }

    //
    // END-TO-END MUTATIONS
    //

    /// Create a node through the full lifecycle.
    ///
    /// pre-create (placement) → insert → post-create (sibling renumbering) →
    /// full interval rebuild. Returns the node as finally persisted.
    pub async fn create_node(&self, mut node: TreeNode) -> Result<TreeNode, TreeServiceError> {
        self.on_pre_create(&mut node).await?;
        let created = self.store.insert(node).await?;
        self.on_post_create(&created).await?;
        self.rebuild_intervals().await?;

        self.require(&created.id).await
    }

    /// Re-persist a node's placement through the full lifecycle.
    ///
    /// The caller mutates `parent_id` (and optionally `position`) on a fetched
    /// node and passes it here. pre-update (cycle check, placement) → write →
    /// post-update (renumbering, level propagation) → compaction of the group
    /// the node left → full interval rebuild.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node is not in the store
    /// - `ParentNotFound` if an explicit parent does not resolve
    /// - `CircularReference` if the target parent is the node itself or one
    ///   of its descendants
    pub async fn update_node(&self, mut node: TreeNode) -> Result<TreeNode, TreeServiceError> {
        let previous = self.require(&node.id).await?;

        self.on_pre_update(&mut node).await?;
        self.store
            .update_fields(&node.id, TreeNodeUpdate::structural(&node))
            .await?;
        self.on_post_update(&node).await?;

        // The node left its old sibling group: compact it as a removal so
        // positions stay gap-free on both sides of the move.
        if previous.parent_id != node.parent_id && previous.parent_id.is_some() {
            self.renumber_siblings(&previous, true).await?;
        }

        self.rebuild_intervals().await?;
        self.require(&node.id).await
    }

    /// Remove a node and its entire subtree through the full lifecycle.
    ///
    /// pre-remove (cascade, sibling compaction) → delete → post-remove →
    /// full interval rebuild.
    pub async fn delete_node(&self, id: &str) -> Result<(), TreeServiceError> {
        let node = self.require(id).await?;

        self.on_pre_remove(&node).await?;
        self.store.delete(id).await?;
        self.on_post_remove(&node).await?;
        self.rebuild_intervals().await?;

        Ok(())
    }

    //
    // INTERNAL HELPERS
    //

    /// Fail with `CircularReference` when `parent_id` is `node` itself or any
    /// node on `parent_id`'s ancestor chain is `node`.
    async fn ensure_not_descendant(
        &self,
        node: &TreeNode,
        parent_id: &str,
    ) -> Result<(), TreeServiceError> {
        if parent_id == node.id {
            return Err(TreeServiceError::circular_reference(format!(
                "cannot make node {} its own parent",
                node.id
            )));
        }

        let mut current = parent_id.to_string();
        while let Some(ancestor) = self.store.get(&current).await? {
            match ancestor.parent_id {
                None => break,
                Some(next) => {
                    if next == node.id {
                        return Err(TreeServiceError::circular_reference(format!(
                            "cannot move node {} under its descendant {}",
                            node.id, parent_id
                        )));
                    }
                    current = next;
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<S: NodeStore> TreeLifecycle for TreeService<S> {
    async fn on_pre_create(&self, node: &mut TreeNode) -> Result<(), TreeServiceError> {
        // Root creation bypasses placement entirely
        if node.is_root {
            return Ok(());
        }

        let parent = match node.parent_id.as_deref() {
            None => self.get_or_create_root().await?,
            Some(parent_id) => self
                .store
                .get(parent_id)
                .await?
                .ok_or_else(|| TreeServiceError::parent_not_found(parent_id))?,
        };

        node.parent_id = Some(parent.id.clone());
        node.level = parent.level + 1;
        // Placeholder bounds; corrected by the rebuild that follows the write
        node.lft = parent.lft;
        node.rgt = parent.rgt;

        Ok(())
    }

    async fn on_post_create(&self, node: &TreeNode) -> Result<(), TreeServiceError> {
        self.renumber_siblings(node, false).await
    }

    async fn on_pre_update(&self, node: &mut TreeNode) -> Result<(), TreeServiceError> {
        // The synthetic root never moves
        if node.is_root {
            return Ok(());
        }

        match node.parent_id.clone().as_deref() {
            None => match self.find_root_or_none().await? {
                Some(root) => {
                    node.parent_id = Some(root.id.clone());
                    node.level = ROOT_LEVEL + 1;
                    node.lft = root.rgt;
                    node.rgt = root.rgt;
                }
                None => {
                    // No root yet: null-safe seeding, placement settles on
                    // the next rebuild
                    node.level = ROOT_LEVEL;
                    node.lft = 0;
                    node.rgt = 0;
                }
            },
            Some(parent_id) => {
                self.ensure_not_descendant(node, parent_id).await?;
                let parent = self
                    .store
                    .get(parent_id)
                    .await?
                    .ok_or_else(|| TreeServiceError::parent_not_found(parent_id))?;

                node.level = parent.level + 1;
                node.lft = parent.rgt;
                node.rgt = parent.rgt;
            }
        }

        Ok(())
    }

    async fn on_post_update(&self, node: &TreeNode) -> Result<(), TreeServiceError> {
        self.renumber_siblings(node, false).await?;
        self.propagate_levels(node).await
    }

    async fn on_pre_remove(&self, node: &TreeNode) -> Result<(), TreeServiceError> {
        let descendants = self.descendants(&node.id).await?;

        // Deepest first so no delete ever references a removed parent
        for doomed in descendants.iter().rev() {
            self.store.delete(&doomed.id).await?;
        }
        if !descendants.is_empty() {
            tracing::debug!(
                node_id = %node.id,
                cascaded = descendants.len(),
                "cascade-deleted subtree"
            );
        }

        self.renumber_siblings(node, true).await
    }

    async fn on_post_remove(&self, _node: &TreeNode) -> Result<(), TreeServiceError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
