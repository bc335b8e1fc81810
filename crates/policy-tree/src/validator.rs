//! Structural checks a policy must pass before it is evaluated.
//!
//! Checks run in a fixed order and the first failure is reported:
//! 1. the start node is set and exists,
//! 2. every node reachable from it is a clean branch or a clean decision,
//! 3. every branch of those nodes points at an existing node,
//! 4. no path from the start node comes back to a node already on it.
//!
//! Nodes that cannot be reached from the start node are not checked. They are
//! reported at `warn` level and otherwise ignored.

use crate::error::{PolicyError, Result};
use crate::policy::Policy;
use crate::types::NodeId;
use tracing::{debug, warn};

/// Validates the policy's node graph.
pub fn validate(policy: &Policy) -> Result<()> {
    let result = check(policy);
    if let Err(err) = &result {
        debug!(policy_id = %policy.id, error = %err, "policy rejected");
    }
    result
}

fn check(policy: &Policy) -> Result<()> {
    let start = policy.start()?;
    let reachable = policy.reachable_nodes();

    for &id in &reachable {
        if let Some(node) = policy.node(id) {
            node.shape(id)?;
        }
    }

    for &id in &reachable {
        let Some(node) = policy.node(id) else {
            continue;
        };
        for (branch, target) in node.children() {
            if policy.node(target).is_none() {
                return Err(PolicyError::DanglingReference {
                    node: id,
                    branch,
                    target,
                });
            }
        }
    }

    check_acyclic(policy, start)?;

    let unreachable = policy.unreachable_nodes();
    if !unreachable.is_empty() {
        warn!(
            policy_id = %policy.id,
            nodes = ?unreachable,
            "policy has conditions unreachable from its start condition"
        );
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Iterative depth-first walk; a child already on the current path is a cycle.
///
/// Shared subtrees are walked once, so the pass is linear in nodes plus edges.
fn check_acyclic(policy: &Policy, start: NodeId) -> Result<()> {
    let mut marks = vec![Mark::Unvisited; policy.len()];
    let mut stack: Vec<(NodeId, Vec<NodeId>)> = Vec::new();

    let children_of = |id: NodeId| -> Vec<NodeId> {
        policy
            .node(id)
            .map(|node| node.children().map(|(_, child)| child).collect())
            .unwrap_or_default()
    };

    marks[start.index()] = Mark::OnPath;
    stack.push((start, children_of(start)));

    while let Some((id, pending)) = stack.last_mut() {
        let Some(child) = pending.pop() else {
            marks[id.index()] = Mark::Done;
            stack.pop();
            continue;
        };

        match marks.get(child.index()).copied() {
            Some(Mark::OnPath) => return Err(PolicyError::CyclicPolicy { node: child }),
            Some(Mark::Unvisited) => {
                marks[child.index()] = Mark::OnPath;
                let grandchildren = children_of(child);
                stack.push((child, grandchildren));
            }
            Some(Mark::Done) | None => {}
        }
    }

    Ok(())
}
