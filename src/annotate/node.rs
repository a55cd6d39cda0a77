//! Resource tree nodes and suppression rules

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Advisory annotation silencing one static-analysis finding on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRule {
    #[serde(alias = "id")]
    pub code: String,
    pub reason: String,
}

impl SuppressionRule {
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

/// A node in a constructed resource tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: String,
    #[serde(default)]
    pub role: String,
    /// Provisioned resource type, if this node maps to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub children: Vec<ResourceNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<SuppressionRule>,
}

impl ResourceNode {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            kind: None,
            children: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_child(mut self, child: ResourceNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn annotations(&self) -> &[SuppressionRule] {
        &self.annotations
    }

    /// Attach a rule. Returns false if the code was already present.
    pub fn add_suppression(&mut self, rule: &SuppressionRule) -> bool {
        if self.annotations.iter().any(|r| r.code == rule.code) {
            return false;
        }
        self.annotations.push(rule.clone());
        true
    }

    pub fn child(&self, index: usize) -> Option<&ResourceNode> {
        self.children.get(index)
    }

    /// Position of the first child with the given id
    pub fn find_child(&self, id: &str) -> Option<usize> {
        self.children.iter().position(|c| c.id == id)
    }

    /// Index path (relative to `self`) of the first node strictly below
    /// `self` with the given role, in pre-order depth-first order.
    pub fn find_descendant_with_role(&self, role: &str) -> Option<Vec<usize>> {
        for (i, child) in self.children.iter().enumerate() {
            if child.role == role {
                return Some(vec![i]);
            }
            if let Some(mut rest) = child.find_descendant_with_role(role) {
                rest.insert(0, i);
                return Some(rest);
            }
        }
        None
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&ResourceNode> {
        path.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut ResourceNode> {
        path.iter().try_fold(self, |node, &i| node.children.get_mut(i))
    }

    /// Pre-order iterator over this node and all descendants
    pub fn walk(&self) -> impl Iterator<Item = &ResourceNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Annotation set in the `cfn_nag` metadata layout
    pub fn suppression_metadata(&self) -> Option<Value> {
        if self.annotations.is_empty() {
            return None;
        }
        let rules: Vec<Value> = self
            .annotations
            .iter()
            .map(|r| json!({"id": r.code, "reason": r.reason}))
            .collect();
        Some(json!({"cfn_nag": {"rules_to_suppress": rules}}))
    }
}
