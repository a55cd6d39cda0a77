//! Known hidden-subtree shapes
//!
//! A shape pairs patterns with the rules to attach under them. Shapes live in
//! the embedded catalogue, so a change in how a helper subtree is generated
//! only needs a catalogue edit.

use super::node::ResourceNode;
use super::pattern::PathPattern;
use super::propagate::apply_suppressions;
use crate::defaults::{get_kind, get_shape};
use anyhow::{Context, Result};

/// Apply every entry of the named shape under `root`.
///
/// Returns the summed touched count across entries.
pub fn apply_shape(root: &mut ResourceNode, name: &str) -> Result<usize> {
    let shape = get_shape(name).ok_or_else(|| anyhow::anyhow!("Unknown shape: {}", name))?;

    let mut touched = 0;
    for entry in &shape.entries {
        let pattern: PathPattern = entry
            .pattern
            .parse()
            .with_context(|| format!("Invalid pattern '{}' in shape '{}'", entry.pattern, name))?;
        touched += apply_suppressions(root, &pattern, &entry.rules);
    }

    tracing::info!("shape '{}' touched {} node(s) under '{}'", name, touched, root.id);
    Ok(touched)
}

/// Apply every shape the catalogue associates with `kind`
pub fn apply_kind_shapes(root: &mut ResourceNode, kind: &str) -> Result<usize> {
    let def = get_kind(kind).ok_or_else(|| anyhow::anyhow!("Unknown resource kind: {}", kind))?;

    let mut touched = 0;
    for shape in &def.shapes {
        touched += apply_shape(root, shape)?;
    }
    Ok(touched)
}
