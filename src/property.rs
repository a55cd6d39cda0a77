//! Property bags and override merging
//!
//! A [`PropertyBag`] is the ordered field map a building block hands to the
//! provisioning layer. Merging is shallow: a key supplied by the override bag
//! replaces the default value wholesale, nested objects included.

use serde_json::{Map, Value};

/// Ordered mapping from field name to value
pub type PropertyBag = Map<String, Value>;

/// Merge `overrides` on top of `defaults`.
///
/// Keys of `defaults` keep their position (with the override value when one
/// exists), override-only keys follow in override order.
pub fn merge(defaults: &PropertyBag, overrides: &PropertyBag) -> PropertyBag {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Returns true if `field` is present and not null
pub fn is_populated(bag: &PropertyBag, field: &str) -> bool {
    bag.get(field).is_some_and(|v| !v.is_null())
}

/// Build a bag from a JSON value, ignoring anything that is not an object.
pub fn from_value(value: Value) -> Option<PropertyBag> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
