//! # Doitz Core
//!
//! `doitz-core` is a client-side translation layer for the i-doit CMDB JSON-RPC API.
//! It turns bulk category operations ("save these attributes on these objects") into
//! batched JSON-RPC calls and correlates the answers back to their callers.
//!
//! ## Key Components
//!
//! * **[`DoitzClient`]:** The main entry point. It owns the transport, the category
//!   configuration and the client-wide request id counter, and exposes the
//!   `category`, `category_info` and `idoit` namespaces.
//! * **[`CategoryConfigStore`]:** The merged category schema (cached server metadata plus
//!   user overrides) used to remap user-facing field names to API field names.
//! * **[`RequestBuilder`]:** Expands `objects × categories × entries × attributes` into
//!   individual [`RpcCall`]s.
//! * **[`BatchResponse`]:** Wraps a batch reply, classifies each error with the
//!   [`ErrorKind`] taxonomy and pairs responses with calls by request id.
//!
//! ## Transport
//!
//! HTTP and authentication are not handled here. Anything implementing
//! [`Transport`] can carry the JSON-RPC payloads.
//!
//! ```rust,no_run
//! use doitz_core::{BoxError, CategoryConfigStore, ClientOptions, ConfigSource, DoitzClient, Transport};
//!
//! struct Http;
//!
//! impl Transport for Http {
//!     async fn execute(&mut self, payload: serde_json::Value) -> Result<serde_json::Value, BoxError> {
//!         # let _ = payload;
//!         unimplemented!()
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CategoryConfigStore::load(ConfigSource::Absent, ConfigSource::Absent)?;
//! let mut client = DoitzClient::new(Http, ClientOptions::from_env(), store);
//!
//! let version = client.idoit().version().await?;
//! println!("{version}");
//! # Ok(())
//! # }
//! ```
pub mod client;
pub mod cmdb;
pub mod config;
pub mod idoit;
pub mod rpc;

pub use client::{ClientError, ClientOptions, DoitzClient};
pub use cmdb::{
    CategoryInfoRequest, CategoryRequest, SavedEntry,
    builder::{BulkRequest, CallShape, EntrySelector, Operation, RequestBuilder},
};
pub use config::{
    CategoryConfigEntry, CategoryConfigStore, CategoryRecord, ConfigError, ConfigSource,
    FieldDescriptor, UserFieldPolicy,
};
pub use rpc::{
    ApiError, BatchResponse, CheckMode, CorrelationError, ErrorKind, RequestIds, RpcCall,
    RpcResponse, Transport,
};

/// Type alias for the standard boxed error used by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
