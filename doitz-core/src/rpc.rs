//! # JSON-RPC Layer
//!
//! This module contains the building blocks shared by every request the client sends:
//!
//! * [`error`]: the code → kind taxonomy for server reported failures.
//! * [`types`]: outbound call descriptors, inbound responses and the request id counter.
//! * [`batch`]: the batch wrapper that checks errors and correlates responses by id.
//! * [`transport`]: the seam where HTTP (or anything else) plugs in.
pub mod batch;
pub mod error;
pub mod transport;
pub mod types;

pub use batch::{BatchResponse, CheckMode, CorrelationError};
pub use error::{ApiError, ErrorKind};
pub use transport::Transport;
pub use types::{RequestIds, RpcCall, RpcResponse};
