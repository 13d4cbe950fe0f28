//! # Batch Responses
//!
//! A JSON-RPC server answers a batch with an array of envelopes in no guaranteed order.
//! [`BatchResponse`] keeps each envelope as its own [`RpcResponse`] (with its own
//! classified error) so callers can tell a single failed call apart from a batch the
//! server rejected as a whole.
//!
//! Pairing a response with the call that produced it always goes through the request id,
//! never through the position in the array.
use super::{
    error::ApiError,
    types::{RpcCall, RpcResponse},
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// How [`BatchResponse::check_error`] treats failed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Fail with the first error found, in response order.
    #[default]
    Strict,
    /// Drop failed items and keep the rest. Used when reading every known category,
    /// where the server rejects the categories that do not apply to an object. A batch
    /// the server rejected as a whole still fails.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("Response id {0} does not match any request of the batch")]
    UnknownId(u64),
    #[error("Response id {0} appears more than once in the batch")]
    DuplicateId(u64),
    #[error("Response without an id cannot be correlated to a request")]
    MissingId,
    #[error("Request {0} got no response")]
    MissingResponse(u64),
}

/// The decoded reply to a batch of JSON-RPC calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    responses: Vec<RpcResponse>,
    /// The server answered with a bare envelope instead of an array.
    bare: bool,
}

impl From<Vec<RpcResponse>> for BatchResponse {
    fn from(responses: Vec<RpcResponse>) -> Self {
        Self {
            responses,
            bare: false,
        }
    }
}

impl BatchResponse {
    /// Decodes a batch reply.
    ///
    /// Servers answer with a single envelope instead of an array when the batch held a
    /// single call or was rejected as a whole, both shapes are accepted.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(items) => Ok(Self {
                responses: items
                    .into_iter()
                    .map(RpcResponse::from_value)
                    .collect::<Result<Vec<_>, _>>()?,
                bare: false,
            }),
            single => Ok(Self {
                responses: vec![RpcResponse::from_value(single)?],
                bare: true,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Iterates the responses in the order the server sent them.
    pub fn iter(&self) -> std::slice::Iter<'_, RpcResponse> {
        self.responses.iter()
    }

    /// Iterates the result payloads in response order. Failed items yield `Value::Null`.
    ///
    /// The iterator borrows the batch, so it can be requested as many times as needed.
    pub fn results(&self) -> impl Iterator<Item = &Value> + '_ {
        self.responses.iter().map(RpcResponse::result)
    }

    /// Finds the response to `request_id`.
    pub fn get(&self, request_id: u64) -> Option<&RpcResponse> {
        self.responses
            .iter()
            .find(|response| response.request_id() == Some(request_id))
    }

    /// The error of a batch the server rejected as a whole.
    ///
    /// Such failures come back as a bare error envelope with a `null` id instead of an
    /// array. Inside an array, an error without id belongs to a single invalid call and
    /// is a per-item failure.
    pub fn batch_error(&self) -> Option<&ApiError> {
        if !self.bare {
            return None;
        }

        self.responses
            .first()
            .filter(|response| response.request_id().is_none())
            .and_then(RpcResponse::error)
    }

    /// Checks the batch for server reported errors.
    ///
    /// # Returns
    ///
    /// * `Ok(responses)` - In `Strict` mode every response, in `Lenient` mode only the
    ///   responses without error. Response order is kept.
    /// * `Err(ApiError)` - In `Strict` mode the first error by response order, in
    ///   `Lenient` mode only the error of a batch rejected as a whole.
    pub fn check_error(&self, mode: CheckMode) -> Result<Vec<&RpcResponse>, ApiError> {
        match mode {
            CheckMode::Strict => {
                if let Some(error) = self.responses.iter().find_map(RpcResponse::error) {
                    return Err(error.clone());
                }
                Ok(self.responses.iter().collect())
            }
            CheckMode::Lenient => {
                if let Some(error) = self.batch_error() {
                    return Err(error.clone());
                }
                Ok(self
                    .responses
                    .iter()
                    .filter(|response| match response.error() {
                        Some(error) => {
                            tracing::debug!(
                                request_id = ?response.request_id(),
                                code = error.code,
                                "skipping failed batch item: {}",
                                error.message
                            );
                            false
                        }
                        None => true,
                    })
                    .collect())
            }
        }
    }

    /// Pairs every response with the call that produced it, in response order.
    ///
    /// Every response must carry the id of one of `calls`, no id may be answered twice
    /// and every call must be answered.
    pub fn correlate<'a>(
        &'a self,
        calls: &'a [RpcCall],
    ) -> Result<Vec<(&'a RpcCall, &'a RpcResponse)>, CorrelationError> {
        let by_id: HashMap<u64, &RpcCall> =
            calls.iter().map(|call| (call.request_id, call)).collect();
        let mut seen = HashSet::new();

        let pairs = self
            .responses
            .iter()
            .map(|response| {
                let id = response.request_id().ok_or(CorrelationError::MissingId)?;
                let call = by_id.get(&id).ok_or(CorrelationError::UnknownId(id))?;
                if !seen.insert(id) {
                    return Err(CorrelationError::DuplicateId(id));
                }
                Ok((*call, response))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match unanswered(calls, &seen).first() {
            Some(&id) => Err(CorrelationError::MissingResponse(id)),
            None => Ok(pairs),
        }
    }

    /// Validates the ids of a freshly received batch against the calls that were sent.
    ///
    /// Unlike [`BatchResponse::correlate`], error envelopes without id are accepted. A
    /// bare one is a batch rejected as a whole and needs no further answers. Inside an
    /// array each one stands in for one call the server could not identify, so at most
    /// that many calls may go unanswered.
    pub fn verify(&self, calls: &[RpcCall]) -> Result<(), CorrelationError> {
        let sent: HashSet<u64> = calls.iter().map(|call| call.request_id).collect();
        let mut seen = HashSet::new();
        let mut anonymous_errors = 0;

        for response in &self.responses {
            match response.request_id() {
                Some(id) if !sent.contains(&id) => return Err(CorrelationError::UnknownId(id)),
                Some(id) if !seen.insert(id) => return Err(CorrelationError::DuplicateId(id)),
                Some(_) => {}
                None if response.is_ok() => return Err(CorrelationError::MissingId),
                None => anonymous_errors += 1,
            }
        }

        if self.batch_error().is_some() {
            return Ok(());
        }

        let unanswered = unanswered(calls, &seen);
        if unanswered.len() > anonymous_errors {
            tracing::debug!(
                unanswered = unanswered.len(),
                anonymous_errors,
                "batch reply is missing responses"
            );
            return Err(CorrelationError::MissingResponse(unanswered[0]));
        }

        Ok(())
    }
}

/// Ids of `calls` without a response, in call order.
fn unanswered(calls: &[RpcCall], seen: &HashSet<u64>) -> Vec<u64> {
    calls
        .iter()
        .map(|call| call.request_id)
        .filter(|id| !seen.contains(id))
        .collect()
}

impl<'a> IntoIterator for &'a BatchResponse {
    type Item = &'a RpcResponse;
    type IntoIter = std::slice::Iter<'a, RpcResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
