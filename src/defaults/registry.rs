//! Defaults Registry - Load per-kind default tables from JSON
//!
//! This module loads the prescriptive defaults for every supported resource
//! kind, plus the known hidden-subtree shapes, from embedded JSON files and
//! provides lookup functions for the rest of the crate.

use crate::annotate::SuppressionRule;
use crate::property::PropertyBag;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded catalogue files (compiled into the binary)
const CATALOGUE_FILES: &[&str] = &[
    include_str!("../resources/messaging.json"),
    include_str!("../resources/storage.json"),
    include_str!("../resources/compute.json"),
    include_str!("../resources/shapes.json"),
];

/// Default table for one resource kind
#[derive(Debug, Clone, Deserialize)]
pub struct KindDef {
    pub display_name: String,
    pub service: String,
    #[serde(default)]
    pub defaults: PropertyBag,
    /// Fields that must be populated when building this kind
    #[serde(default)]
    pub required: Vec<String>,
    /// Shapes usually applied after this kind is constructed
    #[serde(default)]
    pub shapes: Vec<String>,
}

/// One pattern of a shape and the rules attached under it
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeEntry {
    pub pattern: String,
    pub rules: Vec<SuppressionRule>,
}

/// Named hidden-subtree shape
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeDef {
    pub description: String,
    pub entries: Vec<ShapeEntry>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Catalogue {
    #[serde(default)]
    pub kinds: HashMap<String, KindDef>,
    #[serde(default)]
    pub shapes: HashMap<String, ShapeDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<Catalogue> = OnceLock::new();

/// Get the catalogue (loads from embedded JSON on first access)
pub fn get_registry() -> &'static Catalogue {
    REGISTRY.get_or_init(|| {
        let mut catalogue = Catalogue::default();

        for content in CATALOGUE_FILES {
            let partial: Catalogue = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded catalogue JSON: {}", e));
            catalogue.kinds.extend(partial.kinds);
            catalogue.shapes.extend(partial.shapes);
        }

        catalogue
    })
}

/// Get a kind definition by key
pub fn get_kind(key: &str) -> Option<&'static KindDef> {
    get_registry().kinds.get(key)
}

/// Get all kind keys, sorted
pub fn get_all_kinds() -> Vec<&'static str> {
    let mut keys: Vec<_> = get_registry().kinds.keys().map(|s| s.as_str()).collect();
    keys.sort_unstable();
    keys
}

/// Get a shape by name
pub fn get_shape(name: &str) -> Option<&'static ShapeDef> {
    get_registry().shapes.get(name)
}

/// Get all shape names, sorted
pub fn get_all_shapes() -> Vec<&'static str> {
    let mut names: Vec<_> = get_registry().shapes.keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names
}

/// Defaults provider handing out a fresh copy of the kind's table
pub fn provider(def: &'static KindDef) -> impl Fn() -> PropertyBag + Send + Sync + 'static {
    move || def.defaults.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::PathPattern;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(!registry.kinds.is_empty(), "Registry should have kinds");
        assert!(!registry.shapes.is_empty(), "Registry should have shapes");
    }

    #[test]
    fn test_queue_kind_exists() {
        let kind = get_kind("sqs-queue");
        assert!(kind.is_some(), "sqs-queue kind should exist");

        let kind = kind.unwrap();
        assert_eq!(kind.display_name, "SQS Queue");
        assert_eq!(kind.service, "sqs");
        assert_eq!(kind.defaults["encryption"], "KMS_MANAGED");
    }

    #[test]
    fn test_get_all_kinds_sorted() {
        let keys = get_all_kinds();
        assert!(keys.contains(&"log-group"));
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_every_shape_pattern_parses() {
        for name in get_all_shapes() {
            let shape = get_shape(name).unwrap();
            assert!(!shape.entries.is_empty(), "shape {} has no entries", name);
            for entry in &shape.entries {
                assert!(
                    entry.pattern.parse::<PathPattern>().is_ok(),
                    "shape {} has bad pattern {}",
                    name,
                    entry.pattern
                );
            }
        }
    }

    #[test]
    fn test_kind_shapes_reference_known_shapes() {
        for key in get_all_kinds() {
            for shape in &get_kind(key).unwrap().shapes {
                assert!(get_shape(shape).is_some(), "{} references unknown shape {}", key, shape);
            }
        }
    }

    #[test]
    fn test_provider_returns_fresh_copies() {
        let make = provider(get_kind("s3-bucket").unwrap());
        let mut first = make();
        first.insert("versioned".into(), serde_json::Value::Bool(false));
        assert_eq!(make()["versioned"], true);
    }
}
