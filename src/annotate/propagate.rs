//! Annotation Propagator
//!
//! Attaches suppression rules to nodes a building block did not create
//! directly. A pattern miss is not an error: generated subtrees change shape
//! between framework versions and the annotations are advisory.

use super::node::{ResourceNode, SuppressionRule};
use super::pattern::PathPattern;

/// Attach `rules` to every node matched by `pattern` under `root`.
///
/// Returns the number of matched nodes, or 0 (with nothing mutated) if the
/// pattern does not match. Callers that need the suppression must check the
/// count themselves.
pub fn apply_suppressions(
    root: &mut ResourceNode,
    pattern: &PathPattern,
    rules: &[SuppressionRule],
) -> usize {
    let targets = pattern.locate(root);
    if targets.is_empty() {
        tracing::debug!("pattern '{}' did not match under '{}'", pattern, root.id);
        return 0;
    }

    let mut touched = 0;
    for path in &targets {
        let Some(node) = root.node_at_mut(path) else {
            continue;
        };
        for rule in rules {
            if node.add_suppression(rule) {
                tracing::debug!("suppressed {} on '{}'", rule.code, node.id);
            }
        }
        touched += 1;
    }
    touched
}
