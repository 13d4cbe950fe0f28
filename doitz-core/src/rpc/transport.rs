//! # Transport
//!
//! The client never talks HTTP itself. It hands fully built JSON-RPC payloads (a single
//! envelope or an array of envelopes) to a [`Transport`] and decodes whatever JSON comes
//! back. Authentication headers, sessions and connection handling live in the
//! implementation.
use crate::BoxError;
use serde_json::Value;
use std::future::Future;

/// Executes one JSON-RPC payload and returns the server's reply.
///
/// Implementations should return the reply untouched: a JSON object for a single call
/// and (usually) a JSON array for a batch. Server reported errors are part of the
/// reply, `Err` is reserved for failures to get a reply at all.
pub trait Transport {
    fn execute(&mut self, payload: Value) -> impl Future<Output = Result<Value, BoxError>> + Send;
}
