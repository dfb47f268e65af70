//! Storage Layer
//!
//! This module defines the persistence boundary of the tree engine:
//!
//! - `NodeStore` - abstract store contract (get, ordered children, hook-free
//!   writes, interval query)
//! - `MemoryStore` - embedded in-memory reference implementation
//! - `StoreError` - persistence failure taxonomy
//!
//! The engine is stateless between calls; the store exclusively owns all node
//! records and must serialize mutations per tree.

mod error;
mod memory_store;
mod node_store;

pub use error::StoreError;
pub use memory_store::MemoryStore;
pub use node_store::NodeStore;
