//! # Installation Namespace
//!
//! `idoit.*` methods that describe the installation itself.
use crate::{DoitzClient, client::ClientError, rpc::Transport};
use serde_json::{Map, Value};

/// The `idoit.*` namespace of a [`DoitzClient`].
pub struct IdoitRequest<'a, T> {
    client: &'a mut DoitzClient<T>,
}

impl<'a, T: Transport> IdoitRequest<'a, T> {
    pub(crate) fn new(client: &'a mut DoitzClient<T>) -> Self {
        Self { client }
    }

    /// `idoit.version`: version, edition and login information.
    pub async fn version(&mut self) -> Result<Value, ClientError> {
        self.call("idoit.version").await
    }

    /// `idoit.constants`: object type, category and record status constants.
    pub async fn constants(&mut self) -> Result<Value, ClientError> {
        self.call("idoit.constants").await
    }

    async fn call(&mut self, method: &str) -> Result<Value, ClientError> {
        let response = self.client.request(method, Map::new()).await?;
        Ok(response.into_result()?)
    }
}
