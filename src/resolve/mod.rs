//! Dependency resolution
//!
//! Every optional sub-resource of a building block is described by a
//! [`DependencySpec`]. Resolving it yields one of:
//!
//! - [`ResolutionResult::Reuse`] - the caller supplied an existing instance
//! - [`ResolutionResult::Build`] - defaults merged with caller overrides
//! - [`ResolutionResult::Skip`] - the caller disabled the dependency
//! - [`ResolutionResult::Invalid`] - contradictory or incomplete intent
//!
//! # Example
//!
//! ```
//! use constructs_resolve::resolve::{resolve, DependencySpec, ResolutionResult};
//! use serde_json::json;
//!
//! let overrides = json!({"retention": "ONE_MONTH"}).as_object().cloned().unwrap();
//! let spec = DependencySpec::for_kind("logs", "log-group")
//!     .unwrap()
//!     .with_overrides(overrides);
//!
//! let ResolutionResult::Build(props) = resolve(&spec, &[]) else {
//!     panic!("expected a build decision");
//! };
//! assert_eq!(props["retention"], "ONE_MONTH");
//! ```

mod engine;
mod result;
mod spec;

pub use engine::{resolve, resolve_group, Resolver};
pub use result::{GroupError, GroupResolution, InvalidReason, ResolutionResult};
pub use spec::{DefaultsProvider, DependencySpec, ResourceRef, SpecId};
