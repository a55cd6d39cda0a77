//! Path patterns locating nodes inside generated subtrees
//!
//! Textual form, steps joined by `/`:
//!
//! | step       | matches                                              |
//! |------------|------------------------------------------------------|
//! | `N`        | child at index `N`                                   |
//! | `N:role`   | child at index `N`, only if its role is `role`       |
//! | `#id`      | first child whose id is `id`                         |
//! | `~role`    | first descendant with `role` (pre-order, depth first)|
//! | `*`        | every child (final step only)                        |
//! | `*:role`   | every child with `role` (final step only)            |
//!
//! The empty pattern targets the root itself.

use super::node::ResourceNode;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Child { index: usize, role: Option<String> },
    ChildId(String),
    FirstWithRole(String),
    EveryChild { role: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty step at position {0}")]
    EmptyStep(usize),
    #[error("invalid child index '{0}'")]
    BadIndex(String),
    #[error("missing name after '{0}'")]
    MissingName(char),
    #[error("'*' must be the last step")]
    FanOutNotLast,
}

/// Declarative locator for one node or a set of sibling nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPattern {
    steps: Vec<Step>,
}

impl PathPattern {
    pub fn new(steps: Vec<Step>) -> Result<Self, PatternError> {
        let last = steps.len().saturating_sub(1);
        if steps
            .iter()
            .enumerate()
            .any(|(i, s)| i != last && matches!(s, Step::EveryChild { .. }))
        {
            return Err(PatternError::FanOutNotLast);
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Index paths of every matched node, siblings in child order.
    /// Empty if any step misses.
    pub fn locate(&self, root: &ResourceNode) -> Vec<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = root;

        for step in &self.steps {
            match step {
                Step::Child { index, role } => {
                    let Some(child) = current.child(*index) else {
                        return Vec::new();
                    };
                    if role.as_ref().is_some_and(|r| *r != child.role) {
                        return Vec::new();
                    }
                    path.push(*index);
                    current = child;
                }
                Step::ChildId(id) => {
                    let Some(index) = current.find_child(id) else {
                        return Vec::new();
                    };
                    path.push(index);
                    current = &current.children[index];
                }
                Step::FirstWithRole(role) => {
                    let Some(rel) = current.find_descendant_with_role(role) else {
                        return Vec::new();
                    };
                    let Some(found) = current.node_at(&rel) else {
                        return Vec::new();
                    };
                    path.extend(rel);
                    current = found;
                }
                Step::EveryChild { role } => {
                    return current
                        .children
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| role.as_ref().map_or(true, |r| *r == c.role))
                        .map(|(i, _)| {
                            let mut p = path.clone();
                            p.push(i);
                            p
                        })
                        .collect();
                }
            }
        }

        vec![path]
    }
}

fn parse_step(raw: &str, position: usize) -> Result<Step, PatternError> {
    if raw.is_empty() {
        return Err(PatternError::EmptyStep(position));
    }

    if let Some(id) = raw.strip_prefix('#') {
        return non_empty(id, '#').map(|id| Step::ChildId(id.to_string()));
    }
    if let Some(role) = raw.strip_prefix('~') {
        return non_empty(role, '~').map(|r| Step::FirstWithRole(r.to_string()));
    }

    let (head, role) = match raw.split_once(':') {
        Some((head, role)) => (head, Some(non_empty(role, ':')?.to_string())),
        None => (raw, None),
    };

    if head == "*" {
        return Ok(Step::EveryChild { role });
    }

    let index = head
        .parse::<usize>()
        .map_err(|_| PatternError::BadIndex(head.to_string()))?;
    Ok(Step::Child { index, role })
}

fn non_empty(s: &str, after: char) -> Result<&str, PatternError> {
    if s.is_empty() {
        Err(PatternError::MissingName(after))
    } else {
        Ok(s)
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let steps = s
            .split('/')
            .enumerate()
            .map(|(i, raw)| parse_step(raw.trim(), i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(steps)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Child { index, role: None } => write!(f, "{}", index),
            Step::Child { index, role: Some(r) } => write!(f, "{}:{}", index, r),
            Step::ChildId(id) => write!(f, "#{}", id),
            Step::FirstWithRole(r) => write!(f, "~{}", r),
            Step::EveryChild { role: None } => f.write_str("*"),
            Step::EveryChild { role: Some(r) } => write!(f, "*:{}", r),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join("/"))
    }
}
