//! Path visibility filters for Facet views.
//!
//! A filter decides, path by path, what a view may see. The contract is a
//! single async predicate: [`PathFilter::is_path_filtered`] answers whether a
//! path is hidden under a given filter id, as a [`LazyFuture`] so that pure
//! rule-match filters can answer synchronously while effectful filters may
//! defer.
//!
//! [`RuleSetFilter`] is the bundled rule-set implementation: each filter id
//! names a list of paths hidden together with their subtrees.
//!
//! [`LazyFuture`]: facet_future::LazyFuture

pub mod error;
pub mod rules;
pub mod traits;

pub use error::{FilterError, FilterResult};
pub use rules::RuleSetFilter;
pub use traits::PathFilter;
