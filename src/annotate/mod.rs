//! Suppression annotation of generated subtrees
//!
//! Building a higher-level resource often spawns children the caller never
//! sees (service roles, framework provider functions, default policies).
//! This module walks such subtrees with declarative [`PathPattern`]s and
//! attaches [`SuppressionRule`]s to the nodes they locate.
//!
//! - [`node`] - the resource tree and its annotation set
//! - [`pattern`] - textual and typed path patterns
//! - `propagate` - [`apply_suppressions`]
//! - `shapes` - [`apply_shape`] for named patterns from the embedded catalogue,
//!   [`apply_kind_shapes`] for the shapes a resource kind usually needs

pub mod node;
pub mod pattern;
mod propagate;
mod shapes;

pub use node::{ResourceNode, SuppressionRule};
pub use pattern::{PathPattern, PatternError, Step};
pub use propagate::apply_suppressions;
pub use shapes::{apply_kind_shapes, apply_shape};
