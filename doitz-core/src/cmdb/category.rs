//! # Category Entries
//!
//! Bulk operations on category entries. Each operation builds one batch through the
//! [`RequestBuilder`](super::builder::RequestBuilder), sends it and checks it strictly:
//! the first failed call fails the whole operation.
use super::builder::{BulkRequest, EntrySelector, Operation};
use crate::{
    DoitzClient,
    client::ClientError,
    rpc::{BatchResponse, CheckMode, RpcCall, RpcResponse, Transport},
};
use serde_json::{Map, Value};

/// An entry written by [`CategoryRequest::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEntry {
    pub object_id: u64,
    pub category: String,
    pub entry_id: u64,
}

impl SavedEntry {
    fn from_reply(call: &RpcCall, response: &RpcResponse) -> Result<Self, ClientError> {
        let unexpected = |reason: &str| ClientError::UnexpectedResult {
            request_id: call.request_id,
            reason: reason.to_string(),
        };

        let object_id = call
            .param(Operation::Save.shape().object_key)
            .and_then(Value::as_u64)
            .ok_or_else(|| unexpected("call without object id"))?;
        let category = call
            .param("category")
            .and_then(Value::as_str)
            .ok_or_else(|| unexpected("call without category"))?;
        let entry_id = match response.result().get("entry") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(|| unexpected("result has no entry id"))?;

        Ok(Self {
            object_id,
            category: category.to_string(),
            entry_id,
        })
    }
}

/// The `cmdb.category.*` namespace of a [`DoitzClient`].
pub struct CategoryRequest<'a, T> {
    client: &'a mut DoitzClient<T>,
}

impl<'a, T: Transport> CategoryRequest<'a, T> {
    pub(crate) fn new(client: &'a mut DoitzClient<T>) -> Self {
        Self { client }
    }

    /// Creates or updates entries of `category` on every object.
    ///
    /// Without `entry_id` each attribute set creates a new entry (or updates the only
    /// entry of a single-value category). With `entry_id` every attribute set updates
    /// that entry.
    ///
    /// # Returns
    ///
    /// * `Ok(entries)` - One [`SavedEntry`] per call, in request order.
    /// * `Err(ClientError)` - The first failure of the batch.
    pub async fn save(
        &mut self,
        object_ids: &[u64],
        category: &str,
        attributes: Vec<Map<String, Value>>,
        entry_id: Option<u64>,
    ) -> Result<Vec<SavedEntry>, ClientError> {
        let request = BulkRequest::new(object_ids, &[category])
            .with_entries(entry_id)
            .with_attributes(attributes);

        let (calls, batch) = self.execute(Operation::Save, &request).await?;

        let mut pairs = batch.correlate(&calls)?;
        pairs.sort_by_key(|(call, _)| call.request_id);

        pairs
            .into_iter()
            .map(|(call, response)| SavedEntry::from_reply(call, response))
            .collect()
    }

    /// Alias of [`CategoryRequest::save`] without entry id. The API deprecated `create`.
    pub async fn create(
        &mut self,
        object_ids: &[u64],
        category: &str,
        attributes: Vec<Map<String, Value>>,
    ) -> Result<Vec<SavedEntry>, ClientError> {
        self.save(object_ids, category, attributes, None).await
    }

    /// Alias of [`CategoryRequest::save`]. The API deprecated `update`.
    pub async fn update(
        &mut self,
        object_ids: &[u64],
        category: &str,
        attributes: Vec<Map<String, Value>>,
        entry_id: Option<u64>,
    ) -> Result<Vec<SavedEntry>, ClientError> {
        self.save(object_ids, category, attributes, entry_id).await
    }

    /// Reads the entries of `categories` on every object.
    ///
    /// The batch is returned as is (already checked), one response per
    /// `object × category`. Use [`BatchResponse::correlate`] to pair them with calls.
    pub async fn read<S: AsRef<str>>(
        &mut self,
        object_ids: &[u64],
        categories: &[S],
    ) -> Result<BatchResponse, ClientError> {
        let request = BulkRequest::new(object_ids, categories);
        let (_, batch) = self.execute(Operation::Read, &request).await?;
        Ok(batch)
    }

    /// Marks entries as deleted.
    pub async fn delete<S: AsRef<str>>(
        &mut self,
        object_ids: &[u64],
        categories: &[S],
        entries: EntrySelector,
    ) -> Result<(), ClientError> {
        self.run(Operation::Delete, object_ids, categories, entries)
            .await
    }

    /// Removes entries from the database, skipping the archive/delete states.
    pub async fn quickpurge<S: AsRef<str>>(
        &mut self,
        object_ids: &[u64],
        categories: &[S],
        entries: EntrySelector,
    ) -> Result<(), ClientError> {
        self.run(Operation::QuickPurge, object_ids, categories, entries)
            .await
    }

    pub async fn purge<S: AsRef<str>>(
        &mut self,
        object_ids: &[u64],
        categories: &[S],
        entries: EntrySelector,
    ) -> Result<(), ClientError> {
        self.run(Operation::Purge, object_ids, categories, entries)
            .await
    }

    /// Restores archived or deleted entries to the normal state.
    pub async fn recycle<S: AsRef<str>>(
        &mut self,
        object_ids: &[u64],
        categories: &[S],
        entries: EntrySelector,
    ) -> Result<(), ClientError> {
        self.run(Operation::Recycle, object_ids, categories, entries)
            .await
    }

    pub async fn archive<S: AsRef<str>>(
        &mut self,
        object_ids: &[u64],
        categories: &[S],
        entries: EntrySelector,
    ) -> Result<(), ClientError> {
        self.run(Operation::Archive, object_ids, categories, entries)
            .await
    }

    async fn run<S: AsRef<str>>(
        &mut self,
        operation: Operation,
        object_ids: &[u64],
        categories: &[S],
        entries: EntrySelector,
    ) -> Result<(), ClientError> {
        let request = BulkRequest::new(object_ids, categories).with_entries(entries);
        self.execute(operation, &request).await?;
        Ok(())
    }

    async fn execute(
        &mut self,
        operation: Operation,
        request: &BulkRequest,
    ) -> Result<(Vec<RpcCall>, BatchResponse), ClientError> {
        let calls = self.client.builder().build(operation, request);
        let batch = self.client.batch_request(&calls).await?;
        batch.check_error(CheckMode::Strict)?;
        Ok((calls, batch))
    }
}
