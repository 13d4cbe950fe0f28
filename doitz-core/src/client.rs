//! # Doitz Client
//!
//! This module implements the dispatch side of the library.
//!
//! [`DoitzClient`] owns three things for its whole lifetime:
//!
//! 1. **The transport**: whatever carries JSON-RPC payloads to the server.
//! 2. **The category configuration**: loaded once, shared read-only with every builder.
//! 3. **The request id counter**: ids are unique for the lifetime of the client and of
//!    all its clones.
//!
//! The API methods live in namespaces borrowed from the client:
//!
//! ```rust,no_run
//! # use doitz_core::{DoitzClient, Transport, EntrySelector};
//! # async fn run<T: Transport>(mut client: DoitzClient<T>) -> Result<(), doitz_core::ClientError> {
//! let entries = client
//!     .category()
//!     .save(&[42], "C__CATG__MODEL", vec![serde_json::Map::new()], None)
//!     .await?;
//!
//! client
//!     .category()
//!     .archive(&[42], &["C__CATG__IP"], EntrySelector::All)
//!     .await?;
//! # Ok(())
//! # }
//! ```
mod options;

pub use options::{API_KEY_ENV, ClientOptions, DEFAULT_LANGUAGE, LANGUAGE_ENV};

use crate::{
    BoxError,
    cmdb::{CategoryInfoRequest, CategoryRequest, builder::RequestBuilder},
    config::CategoryConfigStore,
    idoit::IdoitRequest,
    rpc::{ApiError, BatchResponse, CorrelationError, RequestIds, RpcCall, RpcResponse, Transport},
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Errors that can occur while executing API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport failed: '{0}'")]
    Transport(#[source] BoxError),
    #[error("Malformed JSON-RPC response: '{0}'")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("Response correlation failed: '{0}'")]
    Correlation(#[from] CorrelationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Unexpected result for request {request_id}: {reason}")]
    UnexpectedResult { request_id: u64, reason: String },
}

/// The main client for the i-doit JSON-RPC API.
#[derive(Debug, Clone)]
pub struct DoitzClient<T> {
    transport: T,
    options: ClientOptions,
    config: Arc<CategoryConfigStore>,
    ids: RequestIds,
}

impl<T> DoitzClient<T> {
    pub fn new(transport: T, options: ClientOptions, config: CategoryConfigStore) -> Self {
        Self {
            transport,
            options,
            config: Arc::new(config),
            ids: RequestIds::new(),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The merged category configuration.
    pub fn config(&self) -> &CategoryConfigStore {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Reserves the next request id.
    pub fn next_request_id(&self) -> u64 {
        self.ids.next_id()
    }

    /// Number of request ids issued so far.
    pub fn request_count(&self) -> u64 {
        self.ids.issued()
    }

    /// A request builder bound to this client's configuration and id counter.
    pub fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.config, &self.ids)
    }
}

impl<T: Transport> DoitzClient<T> {
    /// `cmdb.category.*` operations.
    pub fn category(&mut self) -> CategoryRequest<'_, T> {
        CategoryRequest::new(self)
    }

    /// `cmdb.category_info` reads.
    pub fn category_info(&mut self) -> CategoryInfoRequest<'_, T> {
        CategoryInfoRequest::new(self)
    }

    /// `idoit.*` methods.
    pub fn idoit(&mut self) -> IdoitRequest<'_, T> {
        IdoitRequest::new(self)
    }

    /// Executes a single call.
    ///
    /// # Returns
    ///
    /// * `Ok(RpcResponse)` - The reply, which may carry a server reported error.
    /// * `Err(ClientError)` - No usable reply: transport failure, undecodable reply, or a
    ///   reply to a different request.
    pub async fn request(
        &mut self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<RpcResponse, ClientError> {
        let call = RpcCall::new(method, params, self.next_request_id());
        let payload = call.to_envelope(&self.options.common_params());

        tracing::debug!(method, request_id = call.request_id, "sending request");

        let reply = self
            .transport
            .execute(payload)
            .await
            .map_err(ClientError::Transport)?;

        let batch = BatchResponse::from_value(reply)?;
        batch.verify(std::slice::from_ref(&call))?;

        let mut responses = batch.iter().cloned();
        match (responses.next(), responses.next()) {
            (Some(response), None) => Ok(response),
            _ => Err(ClientError::UnexpectedResult {
                request_id: call.request_id,
                reason: format!("expected a single response, got {}", batch.len()),
            }),
        }
    }

    /// Executes `calls` as one batch.
    ///
    /// An empty batch is answered locally without touching the transport.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchResponse)` - The replies, each with its own (possibly absent) error.
    /// * `Err(ClientError)` - No usable reply: transport failure, undecodable reply, or a
    ///   reply carrying ids that were not sent.
    pub async fn batch_request(&mut self, calls: &[RpcCall]) -> Result<BatchResponse, ClientError> {
        if calls.is_empty() {
            tracing::debug!("empty batch, nothing to send");
            return Ok(BatchResponse::default());
        }

        let common = self.options.common_params();
        let payload = Value::Array(calls.iter().map(|call| call.to_envelope(&common)).collect());

        tracing::debug!(calls = calls.len(), "sending batch");

        let reply = self
            .transport
            .execute(payload)
            .await
            .map_err(ClientError::Transport)?;

        let batch = BatchResponse::from_value(reply)?;
        batch.verify(calls)?;

        if let Some(error) = batch.batch_error() {
            tracing::warn!(code = error.code, "batch rejected by the server: {}", error.message);
        }

        Ok(batch)
    }
}
