//! Resolution Engine
//!
//! Turns a [`DependencySpec`] into exactly one [`ResolutionResult`]. The
//! engine performs no I/O and never constructs anything; the only side effect
//! is optional override-warning logging.

use super::result::{GroupResolution, InvalidReason, ResolutionResult};
use super::spec::{DependencySpec, ResourceRef, SpecId};
use crate::config::Config;
use crate::overrides;
use crate::property::{self, PropertyBag};
use serde_json::Value;
use std::collections::HashSet;

/// Choice a spec makes on its own, before looking at its peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tentative<'a> {
    Reuse(&'a ResourceRef),
    Skip,
    BuildNew,
}

fn tentative(spec: &DependencySpec) -> Result<Tentative<'_>, InvalidReason> {
    if let Some(existing) = &spec.existing {
        if spec.overrides.is_some() || spec.deploy == Some(true) {
            return Err(InvalidReason::ConflictingIntent);
        }
        return Ok(Tentative::Reuse(existing));
    }

    if spec.deploy == Some(false) {
        if spec.overrides.is_some() {
            return Err(InvalidReason::ConflictingIntent);
        }
        return Ok(Tentative::Skip);
    }

    Ok(Tentative::BuildNew)
}

fn builds_new(spec: &DependencySpec) -> bool {
    matches!(tentative(spec), Ok(Tentative::BuildNew))
}

/// First peer listed in `exclusive_with` that shares the slot and builds new
fn exclusive_conflict<'a, F>(
    spec: &DependencySpec,
    group: &'a [DependencySpec],
    peer_builds: F,
) -> Option<&'a SpecId>
where
    F: Fn(&DependencySpec) -> bool,
{
    group
        .iter()
        .filter(|other| other.id != spec.id && spec.exclusive_with.contains(&other.id))
        .find(|other| other.slot == spec.slot && peer_builds(other))
        .map(|other| &other.id)
}

/// Resolves dependency specs
#[derive(Debug, Clone)]
pub struct Resolver {
    override_warnings: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            override_warnings: true,
        }
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            override_warnings: config.effective_override_warnings(),
        }
    }

    pub fn with_override_warnings(mut self, enabled: bool) -> Self {
        self.override_warnings = enabled;
        self
    }

    /// Resolve one spec against the other specs of its group
    pub fn resolve(&self, spec: &DependencySpec, group: &[DependencySpec]) -> ResolutionResult {
        let result = self.settle(spec, group, self.override_warnings);
        let ResolutionResult::Build(bag) = &result else {
            return result;
        };

        let peer_bag = |id: &SpecId| {
            group
                .iter()
                .find(|other| other.id == *id)
                .and_then(|other| self.settle(other, group, false).as_build().cloned())
        };
        match field_mismatch(spec, bag, peer_bag) {
            Some(reason) => self.invalid(spec, reason),
            None => result,
        }
    }

    /// Everything but the cross-spec field checks
    fn settle(&self, spec: &DependencySpec, group: &[DependencySpec], warn: bool) -> ResolutionResult {
        match tentative(spec) {
            Err(reason) => self.invalid(spec, reason),
            Ok(Tentative::Reuse(existing)) => {
                tracing::debug!("{}: reusing existing instance {}", spec.id, existing.id);
                ResolutionResult::Reuse(existing.clone())
            }
            Ok(Tentative::Skip) => {
                tracing::debug!("{}: deployment disabled, skipping", spec.id);
                ResolutionResult::Skip
            }
            Ok(Tentative::BuildNew) => {
                if let Some(with) = exclusive_conflict(spec, group, builds_new) {
                    let reason = InvalidReason::AmbiguousConstruction { with: with.clone() };
                    return self.invalid(spec, reason);
                }
                self.build(spec, warn)
            }
        }
    }

    /// Resolve a whole group in two phases.
    ///
    /// Tentative choices are computed for every spec first; exclusivity is then
    /// checked against that snapshot before any spec is built. Field
    /// agreement between built specs is checked last, against the built bags.
    pub fn resolve_group(&self, specs: &[DependencySpec]) -> GroupResolution {
        let choices: Vec<_> = specs.iter().map(tentative).collect();

        let building: HashSet<&SpecId> = specs
            .iter()
            .zip(&choices)
            .filter(|(_, choice)| matches!(choice, Ok(Tentative::BuildNew)))
            .map(|(spec, _)| &spec.id)
            .collect();

        let mut results: Vec<(SpecId, ResolutionResult)> = specs
            .iter()
            .zip(choices)
            .map(|(spec, choice)| {
                let result = match choice {
                    Err(reason) => self.invalid(spec, reason),
                    Ok(Tentative::Reuse(existing)) => ResolutionResult::Reuse(existing.clone()),
                    Ok(Tentative::Skip) => ResolutionResult::Skip,
                    Ok(Tentative::BuildNew) => {
                        match exclusive_conflict(spec, specs, |o| building.contains(&o.id)) {
                            Some(with) => self.invalid(
                                spec,
                                InvalidReason::AmbiguousConstruction { with: with.clone() },
                            ),
                            None => self.build(spec, self.override_warnings),
                        }
                    }
                };
                (spec.id.clone(), result)
            })
            .collect();

        let mismatches: Vec<(usize, InvalidReason)> = specs
            .iter()
            .zip(&results)
            .enumerate()
            .filter_map(|(i, (spec, (_, result)))| {
                let bag = result.as_build()?;
                let peer_bag = |id: &SpecId| {
                    results
                        .iter()
                        .find(|(peer, _)| peer == id)
                        .and_then(|(_, r)| r.as_build().cloned())
                };
                field_mismatch(spec, bag, peer_bag).map(|reason| (i, reason))
            })
            .collect();

        for (i, reason) in mismatches {
            results[i].1 = self.invalid(&specs[i], reason);
        }

        GroupResolution { results }
    }

    fn build(&self, spec: &DependencySpec, warn: bool) -> ResolutionResult {
        let defaults = (spec.defaults)();

        let mut merged = match &spec.overrides {
            None => defaults,
            Some(overrides) => {
                if warn {
                    overrides::flag_overridden_defaults(&defaults, overrides);
                }
                property::merge(&defaults, overrides)
            }
        };

        if let Some(enforced) = &spec.enforced {
            merged = property::merge(&merged, enforced);
        }

        if let Some(missing) = first_missing(&merged, spec) {
            return self.invalid(spec, InvalidReason::MissingRequiredField(missing.to_string()));
        }

        tracing::debug!("{}: building with {} properties", spec.id, merged.len());
        ResolutionResult::Build(merged)
    }

    fn invalid(&self, spec: &DependencySpec, reason: InvalidReason) -> ResolutionResult {
        tracing::debug!("{}: {} ({})", spec.id, reason, reason.describe());
        ResolutionResult::Invalid(reason)
    }
}

fn first_missing<'a>(bag: &PropertyBag, spec: &'a DependencySpec) -> Option<&'a str> {
    spec.required
        .iter()
        .find(|field| !property::is_populated(bag, field))
        .map(|field| field.as_str())
}

/// First `must_match` field whose value differs from the built peer's.
///
/// Peers that do not build (reuse, skip, invalid) are not compared. An absent
/// field and a null field are the same value.
fn field_mismatch<F>(spec: &DependencySpec, bag: &PropertyBag, peer_bag: F) -> Option<InvalidReason>
where
    F: Fn(&SpecId) -> Option<PropertyBag>,
{
    spec.must_match
        .iter()
        .filter(|(_, peer)| **peer != spec.id)
        .find_map(|(field, peer)| {
            let theirs = peer_bag(peer)?;
            (field_value(bag, field) != field_value(&theirs, field)).then(|| {
                InvalidReason::FieldMismatch {
                    field: field.clone(),
                    with: peer.clone(),
                }
            })
        })
}

fn field_value<'a>(bag: &'a PropertyBag, field: &str) -> Option<&'a Value> {
    bag.get(field).filter(|v| !v.is_null())
}

/// Resolve with default settings
pub fn resolve(spec: &DependencySpec, group: &[DependencySpec]) -> ResolutionResult {
    Resolver::default().resolve(spec, group)
}

/// Resolve a group with default settings
pub fn resolve_group(specs: &[DependencySpec]) -> GroupResolution {
    Resolver::default().resolve_group(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::from_value;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn bag(value: Value) -> PropertyBag {
        from_value(value).unwrap()
    }

    fn queue_defaults() -> PropertyBag {
        bag(json!({"encryption": "KMS_MANAGED", "visibilityTimeout": 30}))
    }

    #[test]
    fn test_reuse_existing_untouched() {
        let existing = ResourceRef::new("arn:aws:sqs:us-east-1:123:queue").with_kind("sqs-queue");
        let spec = DependencySpec::new("queue", queue_defaults).with_existing(existing.clone());

        assert_eq!(resolve(&spec, &[]), ResolutionResult::Reuse(existing));
    }

    #[test]
    fn test_existing_with_overrides_conflicts() {
        let spec = DependencySpec::new("queue", queue_defaults)
            .with_existing(ResourceRef::new("q"))
            .with_overrides(bag(json!({"visibilityTimeout": 60})));

        assert_eq!(
            resolve(&spec, &[]),
            ResolutionResult::Invalid(InvalidReason::ConflictingIntent)
        );
    }

    #[test]
    fn test_existing_with_deploy_true_conflicts() {
        let spec = DependencySpec::new("vpc", PropertyBag::new)
            .with_existing(ResourceRef::new("vpc-123"))
            .deploy(true);

        assert_eq!(
            resolve(&spec, &[]),
            ResolutionResult::Invalid(InvalidReason::ConflictingIntent)
        );
    }

    #[test]
    fn test_defaults_verbatim_without_overrides() {
        let spec = DependencySpec::new("queue", queue_defaults);
        assert_eq!(resolve(&spec, &[]), ResolutionResult::Build(queue_defaults()));
    }

    #[test]
    fn test_overrides_merged_over_defaults() {
        let spec = DependencySpec::new("queue", queue_defaults)
            .with_overrides(bag(json!({"visibilityTimeout": 300, "fifo": true})));

        assert_eq!(
            resolve(&spec, &[]),
            ResolutionResult::Build(bag(json!({
                "encryption": "KMS_MANAGED",
                "visibilityTimeout": 300,
                "fifo": true
            })))
        );
    }

    #[test]
    fn test_enforced_props_win_over_overrides() {
        let spec = DependencySpec::new("bucket", || bag(json!({"versioned": true})))
            .with_overrides(bag(json!({"publicRead": true})))
            .with_enforced(bag(json!({"publicRead": false})));

        let result = resolve(&spec, &[]);
        assert_eq!(
            result.as_build(),
            Some(&bag(json!({"versioned": true, "publicRead": false})))
        );
    }

    #[test]
    fn test_missing_required_field() {
        let spec = DependencySpec::new("topic", PropertyBag::new)
            .with_overrides(bag(json!({"displayName": "alerts"})))
            .require("name");

        let result = resolve(&spec, &[]);
        assert_eq!(result.invalid_reason().unwrap().to_string(), "missing-required-field:name");
    }

    #[test]
    fn test_required_field_satisfied_by_defaults() {
        let spec = DependencySpec::new("fn", || bag(json!({"runtime": "nodejs20.x"})))
            .require("runtime");
        assert!(resolve(&spec, &[]).as_build().is_some());
    }

    #[test]
    fn test_defaults_provider_not_called_on_reuse_or_skip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let provider = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            PropertyBag::new()
        };

        let reuse = DependencySpec::new("a", provider.clone()).with_existing(ResourceRef::new("x"));
        let skip = DependencySpec::new("b", provider.clone()).deploy(false);
        resolve(&reuse, &[]);
        resolve(&skip, &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        resolve(&DependencySpec::new("c", provider), &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deploy_false_skips() {
        let spec = DependencySpec::new("dlq", queue_defaults).deploy(false);
        assert_eq!(resolve(&spec, &[]), ResolutionResult::Skip);
    }

    #[test]
    fn test_deploy_false_with_overrides_conflicts() {
        let spec = DependencySpec::new("dlq", queue_defaults)
            .deploy(false)
            .with_overrides(bag(json!({"fifo": true})));
        assert_eq!(
            resolve(&spec, &[]),
            ResolutionResult::Invalid(InvalidReason::ConflictingIntent)
        );
    }

    fn exclusive_pair() -> Vec<DependencySpec> {
        vec![
            DependencySpec::new("shared-logs", PropertyBag::new)
                .in_slot("logging")
                .with_overrides(bag(json!({"retention": 7})))
                .exclusive_with("per-stage-logs"),
            DependencySpec::new("per-stage-logs", PropertyBag::new)
                .in_slot("logging")
                .with_overrides(bag(json!({"retention": 30})))
                .exclusive_with("shared-logs"),
        ]
    }

    #[test]
    fn test_mutually_exclusive_specs_are_ambiguous() {
        let group = exclusive_pair();
        let first = resolve(&group[0], &group);
        assert_eq!(
            first,
            ResolutionResult::Invalid(InvalidReason::AmbiguousConstruction {
                with: "per-stage-logs".into()
            })
        );
    }

    #[test]
    fn test_exclusivity_ignored_when_peer_reuses() {
        let mut group = exclusive_pair();
        group[1].overrides = None;
        group[1].existing = Some(ResourceRef::new("log-group-1"));

        assert!(resolve(&group[0], &group).as_build().is_some());
        assert!(resolve(&group[1], &group).as_reuse().is_some());
    }

    #[test]
    fn test_exclusivity_requires_same_slot() {
        let mut group = exclusive_pair();
        group[1].slot = "access-logging".to_string();
        assert!(resolve(&group[0], &group).as_build().is_some());
    }

    #[test]
    fn test_group_resolution_flags_both_peers() {
        let group = exclusive_pair();
        let resolution = resolve_group(&group);

        assert!(resolution.get("shared-logs").unwrap().is_invalid());
        assert!(resolution.get("per-stage-logs").unwrap().is_invalid());
        assert_eq!(resolution.into_result().unwrap_err().failures.len(), 2);
    }

    #[test]
    fn test_group_resolution_keeps_input_order() {
        let group = vec![
            DependencySpec::new("b", queue_defaults),
            DependencySpec::new("a", queue_defaults).deploy(false),
        ];
        let ids: Vec<String> = resolve_group(&group)
            .results
            .into_iter()
            .map(|(id, _)| id.0)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_override_warnings_do_not_change_result() {
        let spec = DependencySpec::new("queue", queue_defaults)
            .with_overrides(bag(json!({"encryption": "UNENCRYPTED"})));

        let quiet = Resolver::new().with_override_warnings(false).resolve(&spec, &[]);
        let loud = Resolver::new().resolve(&spec, &[]);
        assert_eq!(quiet, loud);
    }

    fn fifo_pair(dlq_fifo: Option<bool>) -> Vec<DependencySpec> {
        let dlq_overrides = match dlq_fifo {
            Some(fifo) => bag(json!({"fifo": fifo})),
            None => bag(json!({"maxReceiveCount": 5})),
        };
        vec![
            DependencySpec::new("queue", queue_defaults).with_overrides(bag(json!({"fifo": true}))),
            DependencySpec::new("dlq", queue_defaults)
                .with_overrides(dlq_overrides)
                .must_match("fifo", "queue"),
        ]
    }

    #[test]
    fn test_must_match_field_disagreement() {
        let group = fifo_pair(None);
        let expected = ResolutionResult::Invalid(InvalidReason::FieldMismatch {
            field: "fifo".into(),
            with: "queue".into(),
        });

        assert_eq!(resolve(&group[1], &group), expected);
        let resolution = resolve_group(&group);
        assert!(resolution.get("queue").unwrap().as_build().is_some());
        assert_eq!(resolution.get("dlq"), Some(&expected));
    }

    #[test]
    fn test_must_match_field_agreement() {
        let group = fifo_pair(Some(true));
        assert!(resolve(&group[1], &group).as_build().is_some());
        assert!(resolve_group(&group).into_result().is_ok());
    }

    #[test]
    fn test_must_match_ignored_when_either_side_does_not_build() {
        let mut group = fifo_pair(None);
        group[0].overrides = None;
        group[0].existing = Some(ResourceRef::new("orders"));
        assert!(resolve(&group[1], &group).as_build().is_some());

        let mut group = fifo_pair(None);
        group[1].overrides = None;
        group[1].deploy = Some(false);
        assert_eq!(resolve_group(&group).get("dlq"), Some(&ResolutionResult::Skip));
    }
}
