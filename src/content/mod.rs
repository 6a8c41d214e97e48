//! Content catalog and random selection.

mod catalog;
mod models;
mod selector;

pub use catalog::Catalog;
pub use models::{CatalogEntry, ContentItem};
pub use selector::{Clock, ContentSelector, FixedClock, LocalClock, CAPTURED_AT_FORMAT};
