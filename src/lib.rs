//! constructs-resolve - dependency resolution for infrastructure building blocks
//!
//! Building blocks depend on optional sub-resources. For each one the caller
//! may hand in an existing instance, supply construction properties, or leave
//! it to the library's defaults. This crate reconciles that intent into one
//! unambiguous decision per dependency, and afterwards annotates the
//! resources that construction spawned implicitly.
//!
//! ## Module Structure
//!
//! - `resolve`: Resolution Engine (reuse / build / skip / invalid)
//! - `annotate`: Annotation Propagator over constructed resource trees
//! - `property`: property bags and shallow override merging
//! - `overrides`: warnings when overrides replace prescriptive defaults
//! - `defaults`: embedded per-kind default tables and suppression shapes
//! - `group`: YAML/JSON dependency group files
//! - `config`: persisted settings

pub mod annotate;
pub mod config;
pub mod defaults;
pub mod group;
pub mod overrides;
pub mod property;
pub mod resolve;

pub use annotate::{apply_kind_shapes, apply_shape, apply_suppressions, PathPattern, ResourceNode, SuppressionRule};
pub use property::{merge, PropertyBag};
pub use resolve::{resolve, resolve_group, DependencySpec, ResolutionResult, Resolver};
