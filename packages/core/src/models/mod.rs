//! Data Models
//!
//! This module contains the core data structures used throughout Treespace:
//!
//! - `TreeNode` - the universal tree record with nested-set bookkeeping fields
//! - `TreeNodeUpdate` - sparse structural update applied without lifecycle hooks
//!
//! Domain payload lives in the `properties` field; the engine only interprets
//! the structural fields (`parent_id`, `level`, `position`, `lft`, `rgt`).

mod tree_node;

pub use tree_node::{TreeNode, TreeNodeUpdate, POSITION_LAST, ROOT_LEVEL, UNBOUNDED_RGT};
