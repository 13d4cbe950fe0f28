use super::error::{ApiError, RawError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

pub const JSONRPC_VERSION: &str = "2.0";

/// Client-wide source of request ids.
///
/// Ids start at 1 and are never reused for the lifetime of the counter. Clones share
/// the same counter, so cloned clients keep issuing unique ids.
#[derive(Debug, Clone, Default)]
pub struct RequestIds(Arc<AtomicU64>);

impl RequestIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused id.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of ids issued so far (also the last issued id).
    pub fn issued(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// One outbound JSON-RPC call, before the client adds authentication and protocol members.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    /// The fully qualified API method (e.g. `cmdb.category.save`).
    pub method: String,
    /// API shaped parameters.
    pub params: Map<String, Value>,
    pub request_id: u64,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: Map<String, Value>, request_id: u64) -> Self {
        Self {
            method: method.into(),
            params,
            request_id,
        }
    }

    /// Reads a parameter of the call.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Wraps the call into a JSON-RPC 2.0 envelope.
    ///
    /// `common` holds the parameters every call carries (`apikey`, `language`). Call
    /// parameters win on key collisions.
    pub fn to_envelope(&self, common: &Map<String, Value>) -> Value {
        let mut params = common.clone();
        params.extend(self.params.clone());

        serde_json::json!({
            "method": self.method,
            "params": params,
            "jsonrpc": JSONRPC_VERSION,
            "id": self.request_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RawError>,
}

/// One inbound JSON-RPC response with its error already classified.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    request_id: Option<u64>,
    version: Option<String>,
    result: Value,
    error: Option<ApiError>,
}

impl RpcResponse {
    /// Decodes a single response envelope.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawEnvelope = serde_json::from_value(value)?;

        Ok(Self {
            request_id: raw.id,
            version: raw.jsonrpc,
            result: raw.result.unwrap_or(Value::Null),
            error: raw.error.map(ApiError::from),
        })
    }

    /// The id of the request this answers. `None` for failures the server could not
    /// attribute to a request (e.g. an unparsable batch).
    pub fn request_id(&self) -> Option<u64> {
        self.request_id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The result payload, `Value::Null` when the server sent none.
    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Fails with the classified error if the server reported one.
    pub fn check_error(&self) -> Result<&Self, ApiError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self),
        }
    }

    pub fn into_result(self) -> Result<Value, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_request_ids_are_monotonic_and_shared_between_clones() {
        let ids = RequestIds::new();
        let clone = ids.clone();

        assert_eq!(ids.next_id(), 1);
        assert_eq!(clone.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
        assert_eq!(clone.issued(), 3);
    }

    #[test]
    fn test_envelope_merges_common_params() {
        let mut params = Map::new();
        params.insert("objID".into(), json!(12));
        params.insert("category".into(), json!("C__CATG__MODEL"));
        let call = RpcCall::new("cmdb.category.read", params, 4);

        let mut common = Map::new();
        common.insert("apikey".into(), json!("secret"));
        common.insert("language".into(), json!("en"));

        assert_eq!(
            call.to_envelope(&common),
            json!({
                "method": "cmdb.category.read",
                "params": {
                    "apikey": "secret",
                    "language": "en",
                    "objID": 12,
                    "category": "C__CATG__MODEL"
                },
                "jsonrpc": "2.0",
                "id": 4
            })
        );
    }

    #[test]
    fn test_response_decoding() {
        let ok = RpcResponse::from_value(json!({
            "jsonrpc": "2.0", "id": 9, "result": { "entry": 31 }
        }))
        .unwrap();

        assert_eq!(ok.request_id(), Some(9));
        assert_eq!(ok.version(), Some("2.0"));
        assert_eq!(ok.result()["entry"], 31);
        assert!(ok.is_ok());
        assert!(ok.check_error().is_ok());

        let failed = RpcResponse::from_value(json!({
            "jsonrpc": "2.0", "id": null, "error": { "code": -32700, "message": "Parse error" }
        }))
        .unwrap();

        assert_eq!(failed.request_id(), None);
        assert_eq!(failed.result(), &Value::Null);
        assert_eq!(failed.check_error().unwrap_err().kind, ErrorKind::ParseError);
        assert_eq!(failed.into_result().unwrap_err().code, -32700);
    }

    #[test]
    fn test_response_decoding_rejects_non_objects() {
        assert!(RpcResponse::from_value(json!("nope")).is_err());
        assert!(RpcResponse::from_value(json!({ "id": "abc" })).is_err());
    }
}
