//! Business Services
//!
//! This module contains the tree engine proper:
//!
//! - `TreeService` - root management, sibling positions, interval assignment,
//!   level propagation and the end-to-end mutation orchestration
//! - `TreeLifecycle` - the pre/post hook capability interface
//! - `TreeServiceError` - engine failure taxonomy
//!
//! The integrity checker (`TreeService::check_integrity`) lives in its own
//! module and verifies every structural invariant against the live store.

pub mod error;
mod integrity;
pub mod lifecycle;
pub mod tree_service;

pub use error::TreeServiceError;
pub use lifecycle::TreeLifecycle;
pub use tree_service::{TreeService, ROOT_NAME};
