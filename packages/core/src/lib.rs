//! Treespace Core - Nested-Set Tree Engine
//!
//! This crate maintains a hierarchical collection of records inside a flat,
//! ordered store using the nested-set (interval-labeling) technique: every
//! node carries `lft`/`rgt` bounds such that a node's descendants are exactly
//! the nodes whose bounds fall strictly inside its own, so ancestry and depth
//! queries reduce to interval comparisons instead of recursive traversal.
//!
//! # Architecture
//!
//! - **Stateless Engine**: the store exclusively owns all node records; every
//!   operation is stateless given the store's current contents
//! - **Hook Pipeline**: create/update/remove run through an explicit
//!   pre/write/post lifecycle that re-derives positions, levels and intervals
//! - **Abstract Store**: persistence is behind the `NodeStore` trait; the
//!   in-memory backend doubles as the test harness
//!
//! # Modules
//!
//! - [`models`] - `TreeNode` and the sparse structural update type
//! - [`db`] - `NodeStore` contract, `MemoryStore`, store errors
//! - [`services`] - `TreeService`, lifecycle hooks, integrity checker

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::*;
pub use models::*;
pub use services::*;
