//! Per-kind default tables
//!
//! This module provides the data-driven defaults the Resolution Engine falls
//! back on. Definitions are loaded from JSON files at compile time, so a new
//! resource kind or a new hidden-subtree shape needs no code changes.
//!
//! # Catalogue Files
//!
//! Definitions live in JSON files under `src/resources/`:
//! - `messaging.json` - queues, topics, streams
//! - `storage.json` - buckets, tables, log groups, keys, secrets
//! - `compute.json` - functions, networks, cache clusters
//! - `shapes.json` - suppression shapes for generated subtrees
//!
//! # Example
//!
//! ```
//! use constructs_resolve::defaults::{get_kind, provider};
//!
//! let queue = get_kind("sqs-queue").unwrap();
//! let defaults = provider(queue)();
//! assert_eq!(defaults["enforceSSL"], true);
//! ```

mod registry;

pub use registry::*;
