//! Dependency specifications
//!
//! A [`DependencySpec`] captures everything a building block knows about one
//! optional sub-resource: what the caller handed in, what the library would
//! build by default, and which fields must end up populated.

use crate::defaults;
use crate::property::PropertyBag;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Pure, parameterless provider of a baseline property bag
pub type DefaultsProvider = Arc<dyn Fn() -> PropertyBag + Send + Sync>;

/// Identifier of a spec within its group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecId(pub String);

impl SpecId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpecId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Handle to an already-existing resource the caller wants reused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// One optional sub-resource a building block depends on
#[derive(Clone)]
pub struct DependencySpec {
    pub id: SpecId,
    /// Logical slot this spec governs. Exclusivity only applies within a slot.
    pub slot: String,
    pub kind: Option<String>,
    pub existing: Option<ResourceRef>,
    pub overrides: Option<PropertyBag>,
    /// Properties the building block mandates; applied after caller overrides
    pub enforced: Option<PropertyBag>,
    pub defaults: DefaultsProvider,
    pub required: BTreeSet<String>,
    pub exclusive_with: BTreeSet<SpecId>,
    /// Fields that must carry the same value as in the named peer's build
    pub must_match: BTreeMap<String, SpecId>,
    /// `Some(false)` disables an optional dependency entirely
    pub deploy: Option<bool>,
}

impl DependencySpec {
    /// Create a spec with the given defaults provider and no caller intent
    pub fn new<F>(id: impl Into<String>, defaults: F) -> Self
    where
        F: Fn() -> PropertyBag + Send + Sync + 'static,
    {
        let id = id.into();
        Self {
            slot: id.clone(),
            id: SpecId(id),
            kind: None,
            existing: None,
            overrides: None,
            enforced: None,
            defaults: Arc::new(defaults),
            required: BTreeSet::new(),
            exclusive_with: BTreeSet::new(),
            must_match: BTreeMap::new(),
            deploy: None,
        }
    }

    /// Create a spec backed by the embedded defaults table for `kind`
    pub fn for_kind(id: impl Into<String>, kind: &str) -> Result<Self> {
        let def = defaults::get_kind(kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown resource kind: {}", kind))?;
        let mut spec = Self::new(id, defaults::provider(def));
        spec.kind = Some(kind.to_string());
        spec.required = def.required.iter().cloned().collect();
        Ok(spec)
    }

    pub fn with_existing(mut self, existing: ResourceRef) -> Self {
        self.existing = Some(existing);
        self
    }

    pub fn with_overrides(mut self, overrides: PropertyBag) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_enforced(mut self, enforced: PropertyBag) -> Self {
        self.enforced = Some(enforced);
        self
    }

    pub fn in_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.insert(field.into());
        self
    }

    pub fn exclusive_with(mut self, other: impl Into<SpecId>) -> Self {
        self.exclusive_with.insert(other.into());
        self
    }

    pub fn must_match(mut self, field: impl Into<String>, peer: impl Into<SpecId>) -> Self {
        self.must_match.insert(field.into(), peer.into());
        self
    }

    pub fn deploy(mut self, deploy: bool) -> Self {
        self.deploy = Some(deploy);
        self
    }
}

impl From<String> for SpecId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencySpec")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("kind", &self.kind)
            .field("existing", &self.existing)
            .field("overrides", &self.overrides)
            .field("enforced", &self.enforced)
            .field("required", &self.required)
            .field("exclusive_with", &self.exclusive_with)
            .field("must_match", &self.must_match)
            .field("deploy", &self.deploy)
            .finish_non_exhaustive()
    }
}
