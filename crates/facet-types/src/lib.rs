//! Foundation types for Facet filtered repository views.
//!
//! This crate provides the identifier and path types shared by every other
//! Facet crate:
//!
//! - [`ObjectId`] — opaque, variable-length content-store identifier
//! - [`RootId`] — opaque root (commit-ish) identifier at the system boundary
//! - [`FilterId`] — opaque name of a filter configuration
//! - [`ManifestId`] — fixed-size manifest hash for manifest imports
//! - [`RepoPath`] / [`PathComponent`] — canonical repo-relative paths

pub mod error;
pub mod id;
pub mod path;

pub use error::TypeError;
pub use id::{FilterId, ManifestId, ObjectId, RootId};
pub use path::{PathComponent, RepoPath};
