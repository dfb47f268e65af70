//! Tree Integrity Checker
//!
//! Post-condition verification of the structural invariants the engine is
//! supposed to maintain. A failure here signals a bug in the engine, not
//! caller misuse, which is why it surfaces as `IntegrityViolation` rather
//! than one of the precondition errors.
//!
//! Meant to run after completed mutations (tests assert it after every
//! scenario step); interval checks assume the trailing rebuild has run.

use crate::db::NodeStore;
use crate::models::{TreeNode, ROOT_LEVEL};
use crate::services::{TreeService, TreeServiceError};
use std::collections::HashMap;

impl<S: NodeStore> TreeService<S> {
    /// Validate every structural invariant against the live store.
    ///
    /// Checked, in order:
    ///
    /// 1. exactly one root, with `parent_id = NULL` and `level = -1`
    /// 2. every non-root `parent_id` resolves, and following parents always
    ///    terminates at the root (no cycles)
    /// 3. `level = parent.level + 1` everywhere
    /// 4. child intervals nested strictly inside their parent's
    /// 5. per parent: positions form `1..n` and sibling intervals are
    ///    disjoint in position order
    ///
    /// Returns `IntegrityViolation` describing the first failure found. An
    /// empty store is trivially consistent.
    pub async fn check_integrity(&self) -> Result<(), TreeServiceError> {
        let nodes = self.store().nodes_in_interval(i64::MIN, i64::MAX).await?;
        if nodes.is_empty() {
            return Ok(());
        }

        let roots: Vec<&TreeNode> = nodes.iter().filter(|n| n.is_root).collect();
        if roots.len() != 1 {
            return Err(TreeServiceError::integrity_violation(format!(
                "expected exactly one root, found {}",
                roots.len()
            )));
        }
        let root = roots[0];
        if root.parent_id.is_some() {
            return Err(TreeServiceError::integrity_violation(format!(
                "root {} has a parent reference",
                root.id
            )));
        }
        if root.level != ROOT_LEVEL {
            return Err(TreeServiceError::integrity_violation(format!(
                "root {} has level {}, expected {}",
                root.id, root.level, ROOT_LEVEL
            )));
        }

        let by_id: HashMap<&str, &TreeNode> =
            nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        for node in &nodes {
            if node.is_root {
                continue;
            }

            let Some(parent_id) = node.parent_id.as_deref() else {
                return Err(TreeServiceError::integrity_violation(format!(
                    "non-root node {} has no parent reference",
                    node.id
                )));
            };
            let Some(parent) = by_id.get(parent_id) else {
                return Err(TreeServiceError::integrity_violation(format!(
                    "node {} references missing parent {}",
                    node.id, parent_id
                )));
            };

            if node.level != parent.level + 1 {
                return Err(TreeServiceError::integrity_violation(format!(
                    "node {} has level {}, parent {} has level {}",
                    node.id, node.level, parent.id, parent.level
                )));
            }
            if node.lft > node.rgt {
                return Err(TreeServiceError::integrity_violation(format!(
                    "node {} has inverted interval [{}, {}]",
                    node.id, node.lft, node.rgt
                )));
            }
            if !parent.contains(node) {
                return Err(TreeServiceError::integrity_violation(format!(
                    "node {} interval [{}, {}] not nested inside parent {} [{}, {}]",
                    node.id, node.lft, node.rgt, parent.id, parent.lft, parent.rgt
                )));
            }

            // Parent chain must terminate at the root within node-count hops
            let mut current = *parent;
            let mut hops = 0usize;
            while let Some(next_id) = current.parent_id.as_deref() {
                hops += 1;
                if hops > nodes.len() {
                    return Err(TreeServiceError::integrity_violation(format!(
                        "parent chain from node {} does not terminate",
                        node.id
                    )));
                }
                let Some(&next) = by_id.get(next_id) else {
                    return Err(TreeServiceError::integrity_violation(format!(
                        "node {} references missing ancestor {}",
                        current.id, next_id
                    )));
                };
                current = next;
            }
        }

        for parent in &nodes {
            let children = self.store().children_of(&parent.id).await?;
            for (index, child) in children.iter().enumerate() {
                let expected = (index + 1) as i64;
                if child.position != expected {
                    return Err(TreeServiceError::integrity_violation(format!(
                        "children of {} are not densely positioned: node {} has position {}, expected {}",
                        parent.id, child.id, child.position, expected
                    )));
                }
                if index > 0 {
                    let previous = &children[index - 1];
                    if previous.rgt >= child.lft {
                        return Err(TreeServiceError::integrity_violation(format!(
                            "sibling intervals of {} and {} overlap or contradict position order",
                            previous.id, child.id
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
