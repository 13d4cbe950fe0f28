//! # Error Taxonomy
//!
//! Maps the numeric `code` of a JSON-RPC error object to a fixed set of kinds. The
//! codes follow the JSON-RPC 2.0 convention plus the vendor specific `-32099`.
use serde::Deserialize;
use std::fmt;

/// The classified kind of a server reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// Vendor defined system error (`-32099`).
    SystemError,
    /// Any code that is not part of the table above.
    GenericApiError,
}

impl ErrorKind {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const SYSTEM_ERROR: i64 = -32099;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::PARSE_ERROR => ErrorKind::ParseError,
            Self::INVALID_REQUEST => ErrorKind::InvalidRequest,
            Self::METHOD_NOT_FOUND => ErrorKind::MethodNotFound,
            Self::INVALID_PARAMS => ErrorKind::InvalidParams,
            Self::INTERNAL_ERROR => ErrorKind::InternalError,
            Self::SYSTEM_ERROR => ErrorKind::SystemError,
            _ => ErrorKind::GenericApiError,
        }
    }

    /// Whether a failure of this kind may go away when the same request is sent again.
    ///
    /// Retrying is left to the caller, this only tells the server side failures
    /// (`InternalError`, `SystemError`) apart from requests that are wrong.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::InternalError | ErrorKind::SystemError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ParseError => "Parse error",
            ErrorKind::InvalidRequest => "Invalid request",
            ErrorKind::MethodNotFound => "Method not found",
            ErrorKind::InvalidParams => "Invalid params",
            ErrorKind::InternalError => "Internal error",
            ErrorKind::SystemError => "System error",
            ErrorKind::GenericApiError => "API error",
        };
        f.write_str(name)
    }
}

/// A failure reported by the server for a single JSON-RPC call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} ({code}): {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: i64,
    pub message: String,
    /// Optional `data` member of the error object, passed through untouched.
    pub data: Option<serde_json::Value>,
}

/// Wire shape of the `error` member of a response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl From<RawError> for ApiError {
    fn from(raw: RawError) -> Self {
        ApiError::new(raw.code, raw.message).with_data(raw.data)
    }
}

impl ApiError {
    /// Classifies `code` and builds the error.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_code(code),
            code,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    /// Classifies the `error` member of a raw response envelope.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The envelope has no `error` member (or it is `null`).
    /// * `Ok(Some(ApiError))` - The classified error.
    /// * `Err(serde_json::Error)` - `error` is present but is not `{code, message}`.
    pub fn from_envelope(envelope: &serde_json::Value) -> Result<Option<Self>, serde_json::Error> {
        match envelope.get("error") {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(error) => {
                let raw = RawError::deserialize(error)?;
                Ok(Some(raw.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_codes_are_classified() {
        let table = [
            (-32700, ErrorKind::ParseError),
            (-32600, ErrorKind::InvalidRequest),
            (-32601, ErrorKind::MethodNotFound),
            (-32602, ErrorKind::InvalidParams),
            (-32603, ErrorKind::InternalError),
            (-32099, ErrorKind::SystemError),
        ];

        for (code, kind) in table {
            assert_eq!(ErrorKind::from_code(code), kind, "code {code}");
        }
    }

    #[test]
    fn test_unmapped_codes_are_generic() {
        assert_eq!(ErrorKind::from_code(-1), ErrorKind::GenericApiError);
        assert_eq!(ErrorKind::from_code(-32000), ErrorKind::GenericApiError);
        assert_eq!(ErrorKind::from_code(7), ErrorKind::GenericApiError);
    }

    #[test]
    fn test_from_envelope() {
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": { "code": -32602, "message": "Invalid parameters", "data": ["object"] }
        });

        let error = ApiError::from_envelope(&envelope).unwrap().unwrap();

        assert_eq!(error.kind, ErrorKind::InvalidParams);
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Invalid parameters");
        assert_eq!(error.data, Some(json!(["object"])));
        assert_eq!(error.to_string(), "Invalid params (-32602): Invalid parameters");
    }

    #[test]
    fn test_from_envelope_without_error_is_none() {
        let ok = json!({ "jsonrpc": "2.0", "id": 1, "result": { "success": true } });
        let null_error = json!({ "jsonrpc": "2.0", "id": 1, "result": [], "error": null });

        assert_eq!(ApiError::from_envelope(&ok).unwrap(), None);
        assert_eq!(ApiError::from_envelope(&null_error).unwrap(), None);
    }

    #[test]
    fn test_from_envelope_rejects_malformed_error() {
        let envelope = json!({ "id": 1, "error": "boom" });
        assert!(ApiError::from_envelope(&envelope).is_err());
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::InternalError.is_transient());
        assert!(ErrorKind::SystemError.is_transient());
        assert!(!ErrorKind::InvalidParams.is_transient());
        assert!(!ErrorKind::MethodNotFound.is_transient());
    }
}
