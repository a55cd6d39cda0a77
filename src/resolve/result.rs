//! Resolution outcomes and the failure taxonomy

use super::spec::{ResourceRef, SpecId};
use crate::property::PropertyBag;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Why a spec could not be resolved. `Display` yields the stable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    /// Both an existing instance and construction intent were supplied
    #[error("conflicting-intent")]
    ConflictingIntent,
    /// A mutually exclusive peer in the same slot also builds a new resource
    #[error("ambiguous-construction")]
    AmbiguousConstruction { with: SpecId },
    #[error("missing-required-field:{0}")]
    MissingRequiredField(String),
    /// A field disagrees with the same field of a peer it must match
    #[error("field-mismatch:{field}")]
    FieldMismatch { field: String, with: SpecId },
}

impl InvalidReason {
    /// Human-readable explanation for error reports
    pub fn describe(&self) -> String {
        match self {
            Self::ConflictingIntent => {
                "either provide an existing instance or construction properties, but not both"
                    .to_string()
            }
            Self::AmbiguousConstruction { with } => {
                format!("'{}' also builds a new resource for the same slot", with)
            }
            Self::MissingRequiredField(name) => {
                format!("field '{}' is not set by the defaults or the overrides", name)
            }
            Self::FieldMismatch { field, with } => {
                format!("field '{}' must have the same value as in '{}'", field, with)
            }
        }
    }
}

impl Serialize for InvalidReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// The single decision reached for one dependency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", content = "value", rename_all = "snake_case")]
pub enum ResolutionResult {
    Reuse(ResourceRef),
    Build(PropertyBag),
    /// The caller disabled this optional dependency
    Skip,
    Invalid(InvalidReason),
}

impl ResolutionResult {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    pub fn invalid_reason(&self) -> Option<&InvalidReason> {
        match self {
            Self::Invalid(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn as_build(&self) -> Option<&PropertyBag> {
        match self {
            Self::Build(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn as_reuse(&self) -> Option<&ResourceRef> {
        match self {
            Self::Reuse(existing) => Some(existing),
            _ => None,
        }
    }
}

/// Every failure found while resolving a group
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} invalid dependency spec(s):\n{}", .failures.len(), describe_failures(.failures))]
pub struct GroupError {
    pub failures: Vec<(SpecId, InvalidReason)>,
}

fn describe_failures(failures: &[(SpecId, InvalidReason)]) -> String {
    failures
        .iter()
        .map(|(id, reason)| format!("  {}: {} ({})", id, reason, reason.describe()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ordered outcome of resolving a whole group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResolution {
    pub results: Vec<(SpecId, ResolutionResult)>,
}

impl GroupResolution {
    pub fn get(&self, id: &str) -> Option<&ResolutionResult> {
        self.results
            .iter()
            .find(|(spec_id, _)| spec_id.as_str() == id)
            .map(|(_, result)| result)
    }

    /// Collect all failures into one error, or hand back the results
    pub fn into_result(self) -> Result<Vec<(SpecId, ResolutionResult)>, GroupError> {
        let failures: Vec<_> = self
            .results
            .iter()
            .filter_map(|(id, result)| result.invalid_reason().map(|r| (id.clone(), r.clone())))
            .collect();

        if failures.is_empty() {
            Ok(self.results)
        } else {
            Err(GroupError { failures })
        }
    }
}
