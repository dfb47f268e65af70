//! Tree Node Data Structures
//!
//! This module defines the core `TreeNode` struct and the sparse structural
//! update type used by the nested-set engine.
//!
//! # Architecture
//!
//! - **Universal Node**: a single struct represents every record in the tree,
//!   domain payload lives in the `properties` field
//! - **Nested Set**: every node carries `lft`/`rgt` interval bounds; a node's
//!   descendants are exactly the nodes whose bounds fall strictly inside its own
//! - **Synthetic Root**: each tree owns exactly one root with `level = -1` and
//!   `parent_id = None`; user nodes always hang below it
//!
//! # Examples
//!
//! ```rust
//! use treespace_core::models::{TreeNode, POSITION_LAST};
//! use serde_json::json;
//!
//! // A node appended to the end of its parent's children
//! let node = TreeNode::new("chapter-1", None, json!({}));
//! assert_eq!(node.position, POSITION_LAST);
//!
//! // A node requesting a specific sibling slot
//! let second = TreeNode::new("chapter-2", None, json!({})).with_position(2);
//! assert_eq!(second.position, 2);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel `position` value meaning "insert after the last sibling".
///
/// The position manager replaces the sentinel with a dense 1-based rank the
/// first time the node's sibling group is renumbered.
pub const POSITION_LAST: i64 = i64::MAX;

/// Depth assigned to the synthetic root node. Its direct children sit at 0.
pub const ROOT_LEVEL: i64 = -1;

/// Upper interval bound seeded on a freshly created root, before the first
/// full rebuild assigns the true bound.
pub const UNBOUNDED_RGT: i64 = i64::MAX;

/// A record in the nested-set tree.
///
/// # Fields
///
/// - `id`: unique identifier (UUID v4, generated at construction)
/// - `name`: human-readable label; the synthetic root uses a reserved name
/// - `parent_id`: owning node; `None` only for the synthetic root
/// - `is_root`: true for exactly one node per tree
/// - `level`: depth, root = -1, root's direct children = 0
/// - `position`: dense 1-based rank among siblings (root uses 0)
/// - `lft`/`rgt`: nested-set interval bounds, maintained by the engine
/// - `properties`: domain payload, opaque to the engine
///
/// # Interval Invariant
///
/// After every completed mutation, for any node N and descendant D:
/// `N.lft < D.lft <= D.rgt <= N.rgt`, and sibling intervals are disjoint and
/// ordered consistently with `position`. Leaves end up with `lft == rgt`
/// because the rebuild counter only advances on node entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Human-readable label
    pub name: String,

    /// Parent node ID; `None` only for the synthetic root
    pub parent_id: Option<String>,

    /// True for the single synthetic root of the tree
    pub is_root: bool,

    /// Depth in the tree (root = -1)
    pub level: i64,

    /// 1-based rank among siblings; `POSITION_LAST` until assigned
    pub position: i64,

    /// Left nested-set bound
    pub lft: i64,

    /// Right nested-set bound
    pub rgt: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,

    /// Domain payload (opaque to the tree engine)
    pub properties: serde_json::Value,
}

impl TreeNode {
    /// Create a new node with an auto-generated UUID.
    ///
    /// The node is not yet placed in the tree: `level`, `lft` and `rgt` are
    /// zeroed and `position` is the `POSITION_LAST` sentinel. The mutation
    /// lifecycle seeds the real values before and after the store write.
    ///
    /// # Arguments
    ///
    /// * `name` - Human-readable label
    /// * `parent_id` - Optional parent reference; `None` defaults to the tree
    ///   root at create time
    /// * `properties` - Domain payload as JSON
    pub fn new(
        name: impl Into<String>,
        parent_id: Option<String>,
        properties: serde_json::Value,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parent_id,
            is_root: false,
            level: 0,
            position: POSITION_LAST,
            lft: 0,
            rgt: 0,
            created_at: now,
            modified_at: now,
            properties,
        }
    }

    /// Create the synthetic root node for a tree.
    ///
    /// The root spans the whole tree: `lft = 0` and `rgt` is seeded with the
    /// maximum representable bound until the first full rebuild assigns the
    /// true value.
    pub fn new_root(name: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parent_id: None,
            is_root: true,
            level: ROOT_LEVEL,
            position: 0,
            lft: 0,
            rgt: UNBOUNDED_RGT,
            created_at: now,
            modified_at: now,
            properties: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Request a specific sibling slot instead of appending last.
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    /// Whether `other` lies strictly inside this node's interval.
    ///
    /// Holds for every descendant after a completed rebuild.
    pub fn contains(&self, other: &TreeNode) -> bool {
        self.lft < other.lft && other.rgt <= self.rgt
    }
}

/// Sparse structural update persisted without re-entering lifecycle hooks.
///
/// Only the provided fields are written; everything else is left untouched.
/// This is the write path used by the position manager, level propagator and
/// interval assigner, which must not trigger the pre/post mutation hooks they
/// are invoked from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNodeUpdate {
    /// New parent reference (`Some(None)` clears it)
    pub parent_id: Option<Option<String>>,
    /// New depth
    pub level: Option<i64>,
    /// New sibling rank
    pub position: Option<i64>,
    /// New left bound
    pub lft: Option<i64>,
    /// New right bound
    pub rgt: Option<i64>,
}

impl TreeNodeUpdate {
    /// Update only the sibling rank.
    pub fn position(position: i64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    /// Update only the depth.
    pub fn level(level: i64) -> Self {
        Self {
            level: Some(level),
            ..Default::default()
        }
    }

    /// Update only the interval bounds.
    pub fn bounds(lft: i64, rgt: i64) -> Self {
        Self {
            lft: Some(lft),
            rgt: Some(rgt),
            ..Default::default()
        }
    }

    /// Capture every structural field of `node`.
    ///
    /// Used by the update lifecycle, which persists the whole placement
    /// (parent, level, position, bounds) computed by the pre-update hook.
    pub fn structural(node: &TreeNode) -> Self {
        Self {
            parent_id: Some(node.parent_id.clone()),
            level: Some(node.level),
            position: Some(node.position),
            lft: Some(node.lft),
            rgt: Some(node.rgt),
        }
    }

    /// Apply the provided fields to `node` in place.
    pub fn apply(&self, node: &mut TreeNode) {
        if let Some(parent_id) = &self.parent_id {
            node.parent_id = parent_id.clone();
        }
        if let Some(level) = self.level {
            node.level = level;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(lft) = self.lft {
            node.lft = lft;
        }
        if let Some(rgt) = self.rgt {
            node.rgt = rgt;
        }
    }
}
