//! # CMDB Namespace
//!
//! Bulk operations on category entries (`cmdb.category.*`) and category metadata
//! (`cmdb.category_info`).
//!
//! * [`builder`]: expands a bulk request into individual calls.
//! * [`category`]: `save`, `delete`, `read`, `quickpurge`, `purge`, `recycle`, `archive`.
//! * [`category_info`]: reads the field metadata of categories.
pub mod builder;
pub mod category;
pub mod category_info;

pub use category::{CategoryRequest, SavedEntry};
pub use category_info::CategoryInfoRequest;
