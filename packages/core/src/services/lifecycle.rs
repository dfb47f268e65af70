//! Mutation Lifecycle Hooks
//!
//! The ordered pipeline invoked around every create/update/remove of a node:
//!
//! - **pre-create → insert → post-create**
//! - **pre-update → update → post-update**
//! - **pre-remove → delete → post-remove**
//!
//! The hooks are an explicit capability interface rather than an inheritance
//! chain: the orchestrator (`TreeService::create_node` and friends) calls each
//! stage in order, and any stage that cannot resolve a required node aborts
//! the mutation before a partial write happens.
//!
//! Pre hooks take `&mut TreeNode` because their whole job is to derive the
//! node's placement (parent, level, interval placeholders) before the write;
//! post hooks only observe the persisted record and repair its surroundings
//! (sibling positions, descendant levels, cascaded removals).

use crate::models::TreeNode;
use crate::services::TreeServiceError;
use async_trait::async_trait;

/// Capability interface for the six mutation lifecycle stages.
///
/// `TreeService` provides the canonical implementation; node-kind specific
/// layers can wrap it to add domain behavior around the same pipeline.
#[async_trait]
pub trait TreeLifecycle {
    /// Derive placement for a node about to be inserted.
    ///
    /// Defaults the parent to the tree root (creating the root if absent),
    /// sets `level = parent.level + 1` and seeds `lft`/`rgt` from the parent's
    /// current bounds. An explicit parent that does not resolve is fatal.
    async fn on_pre_create(&self, node: &mut TreeNode) -> Result<(), TreeServiceError>;

    /// Finalize the new node's sibling position and compact its group.
    async fn on_post_create(&self, node: &TreeNode) -> Result<(), TreeServiceError>;

    /// Derive placement for a node about to be re-persisted.
    ///
    /// Rejects cycle-introducing reparents, reassigns an unset parent to the
    /// current root (null-safe when no root exists yet) and reseeds
    /// `level`/`lft`/`rgt` placeholders from the (possibly new) parent.
    async fn on_pre_update(&self, node: &mut TreeNode) -> Result<(), TreeServiceError>;

    /// Renumber the node's (possibly new) sibling group and propagate the
    /// changed depth to every descendant.
    async fn on_post_update(&self, node: &TreeNode) -> Result<(), TreeServiceError>;

    /// Cascade-delete all descendants (deepest first) and compact the former
    /// sibling group.
    async fn on_pre_remove(&self, node: &TreeNode) -> Result<(), TreeServiceError>;

    /// Reserved for collaborators; the canonical implementation is a no-op.
    async fn on_post_remove(&self, node: &TreeNode) -> Result<(), TreeServiceError>;
}
