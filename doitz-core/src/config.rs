//! # Category Configuration
//!
//! The client knows every category under two layers:
//!
//! 1. **Cache**: machine generated from the server's category metadata. It lists the API
//!    field names of each category together with a `param` (the user-facing key), a help
//!    text and a type.
//! 2. **User**: hand written overrides. They rename categories (`cli_name`), rename or
//!    document fields, and may add categories or fields the cache does not know.
//!
//! [`CategoryConfigStore`] merges both once and is read-only afterwards. The request
//! builder uses it to translate user-facing keys into API field names.
mod category;
mod store;

pub use category::{CategoryConfigEntry, CategoryRecord, FieldDescriptor, UserFieldPolicy};
pub use store::{CategoryConfigStore, ConfigError, ConfigSource};
