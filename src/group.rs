//! Dependency group files
//!
//! A group file lists the dependency specs of one building block in YAML or
//! JSON (YAML is a superset, so one parser handles both):
//!
//! ```yaml
//! specs:
//!   - id: queue
//!     kind: sqs-queue
//!     overrides: { visibilityTimeout: 300 }
//!   - id: dlq
//!     kind: dead-letter-queue
//!     must_match: { fifo: queue }
//! ```

use crate::defaults;
use crate::property::PropertyBag;
use crate::resolve::{DependencySpec, ResourceRef};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupFile {
    pub specs: Vec<SpecEntry>,
}

/// One spec as written in a group file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecEntry {
    pub id: String,
    #[serde(default)]
    pub kind: Option<String>,
    /// Inline defaults, for specs without a catalogue kind
    #[serde(default)]
    pub defaults: Option<PropertyBag>,
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub existing: Option<ResourceRef>,
    #[serde(default)]
    pub overrides: Option<PropertyBag>,
    #[serde(default)]
    pub enforced: Option<PropertyBag>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub exclusive_with: Vec<String>,
    /// Field name to the id of the peer whose value it must equal
    #[serde(default)]
    pub must_match: BTreeMap<String, String>,
    #[serde(default)]
    pub deploy: Option<bool>,
}

impl SpecEntry {
    pub fn into_spec(self) -> Result<DependencySpec> {
        let mut spec = match (self.kind.as_deref(), self.defaults) {
            (Some(_), Some(_)) => bail!("Spec '{}' sets both kind and inline defaults", self.id),
            (Some(kind), None) => DependencySpec::for_kind(self.id.clone(), kind)
                .with_context(|| format!("Spec '{}'", self.id))?,
            (None, Some(inline)) => DependencySpec::new(self.id.clone(), move || inline.clone()),
            (None, None) => DependencySpec::new(self.id.clone(), PropertyBag::new),
        };

        if let Some(slot) = self.slot {
            spec = spec.in_slot(slot);
        }
        spec.existing = self.existing;
        spec.overrides = self.overrides;
        spec.enforced = self.enforced;
        spec.deploy = self.deploy;
        spec.required.extend(self.required);
        spec.exclusive_with
            .extend(self.exclusive_with.into_iter().map(Into::into));
        spec.must_match
            .extend(self.must_match.into_iter().map(|(field, peer)| (field, peer.into())));
        Ok(spec)
    }
}

impl GroupFile {
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse dependency group")
    }

    pub fn into_specs(self) -> Result<Vec<DependencySpec>> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.specs {
            if !seen.insert(entry.id.as_str()) {
                bail!("Duplicate spec id '{}'", entry.id);
            }
        }
        self.specs.into_iter().map(SpecEntry::into_spec).collect()
    }
}

/// Load the specs of a group file
pub fn load_group(path: &Path) -> Result<Vec<DependencySpec>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    GroupFile::parse(&content)
        .with_context(|| format!("In {:?}", path))?
        .into_specs()
}

/// Human-readable listing of the catalogue
pub fn describe_catalogue() -> Vec<String> {
    let mut lines = Vec::new();
    for key in defaults::get_all_kinds() {
        if let Some(def) = defaults::get_kind(key) {
            lines.push(format!("{:<20} {} ({})", key, def.display_name, def.service));
        }
    }
    for name in defaults::get_all_shapes() {
        if let Some(shape) = defaults::get_shape(name) {
            lines.push(format!("shape:{:<14} {}", name, shape.description));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_group() {
        let group = GroupFile::parse(
            r#"
specs:
  - id: queue
    kind: sqs-queue
    overrides: { visibilityTimeout: 300 }
  - id: dlq
    kind: dead-letter-queue
    deploy: false
  - id: custom
    defaults: { name: "x" }
    required: [name]
"#,
        )
        .unwrap();

        let specs = group.into_specs().unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].kind.as_deref(), Some("sqs-queue"));
        assert_eq!(specs[0].overrides.as_ref().unwrap()["visibilityTimeout"], 300);
        assert_eq!(specs[1].deploy, Some(false));
        assert_eq!((specs[2].defaults)()["name"], "x");
        assert!(specs[2].required.contains("name"));
    }

    #[test]
    fn test_parse_json_group() {
        let group = GroupFile::parse(r#"{"specs": [{"id": "t", "kind": "sns-topic", "slot": "alerts"}]}"#)
            .unwrap();
        let specs = group.into_specs().unwrap();
        assert_eq!(specs[0].slot, "alerts");
    }

    #[test]
    fn test_must_match_entries() {
        let group = GroupFile::parse(
            "specs:\n  - id: queue\n  - id: dlq\n    must_match: { fifo: queue }\n",
        )
        .unwrap();
        let specs = group.into_specs().unwrap();
        assert_eq!(specs[1].must_match.get("fifo").map(|p| p.as_str()), Some("queue"));
        assert!(specs[0].must_match.is_empty());
    }

    #[test]
    fn test_kind_and_inline_defaults_rejected() {
        let group = GroupFile::parse(
            "specs:\n  - id: q\n    kind: sqs-queue\n    defaults: {a: 1}\n",
        )
        .unwrap();
        assert!(group.into_specs().is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let group = GroupFile::parse("specs:\n  - id: q\n  - id: q\n").unwrap();
        let err = group.into_specs().unwrap_err();
        assert!(err.to_string().contains("Duplicate spec id 'q'"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(GroupFile::parse("specs:\n  - id: q\n    overide: {}\n").is_err());
    }

    #[test]
    fn test_load_group_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group.yaml");
        std::fs::write(&path, "specs:\n  - id: logs\n    kind: log-group\n").unwrap();

        let specs = load_group(&path).unwrap();
        assert_eq!(specs[0].id.as_str(), "logs");
    }

    #[test]
    fn test_catalogue_listing_mentions_kinds_and_shapes() {
        let lines = describe_catalogue();
        assert!(lines.iter().any(|l| l.starts_with("sqs-queue")));
        assert!(lines.iter().any(|l| l.starts_with("shape:framework-provider")));
    }
}
