//! # ap-updates
//!
//! Hyperparameter search-space updates for AutoPipe.
//!
//! A [`SearchSpaceUpdate`] overrides the range, default and sampling scale of
//! one hyperparameter of a named pipeline stage. [`SearchSpaceUpdates`] holds
//! an ordered set of them, applies them to any stages implementing
//! [`AcceptsSearchSpaceUpdate`], and persists them as a flat text file that
//! [`parse_search_space_updates`] reads back.

mod collection;
mod parser;
mod update;

pub use collection::SearchSpaceUpdates;
pub use parser::{parse_search_space_updates, DISABLED_PATH_SENTINEL};
pub use update::{AcceptsSearchSpaceUpdate, SearchSpaceUpdate};
