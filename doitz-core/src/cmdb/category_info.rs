//! # Category Metadata
//!
//! `cmdb.category_info` returns the field definitions of a category. Reading a named
//! list of categories is strict. Reading every category the server knows is lenient,
//! because the server refuses categories that cannot be described on their own.
use crate::{
    DoitzClient,
    client::ClientError,
    rpc::{CheckMode, RpcCall, Transport},
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

const CATEGORY_INFO_METHOD: &str = "cmdb.category_info";

/// The `cmdb.category_info` namespace of a [`DoitzClient`].
pub struct CategoryInfoRequest<'a, T> {
    client: &'a mut DoitzClient<T>,
}

impl<'a, T: Transport> CategoryInfoRequest<'a, T> {
    pub(crate) fn new(client: &'a mut DoitzClient<T>) -> Self {
        Self { client }
    }

    /// Reads the metadata of `categories`. Any failed category fails the read.
    pub async fn read<S: AsRef<str>>(
        &mut self,
        categories: &[S],
    ) -> Result<BTreeMap<String, Value>, ClientError> {
        let categories = categories.iter().map(|c| c.as_ref().to_string()).collect();
        self.read_with(categories, CheckMode::Strict).await
    }

    /// Reads the metadata of every category listed by `idoit.constants`.
    ///
    /// Categories the server refuses are left out of the result.
    pub async fn read_all(&mut self) -> Result<BTreeMap<String, Value>, ClientError> {
        let constants = self.client.idoit().constants().await?;
        let categories = category_constants(&constants);

        tracing::debug!(categories = categories.len(), "reading every known category");

        self.read_with(categories, CheckMode::Lenient).await
    }

    async fn read_with(
        &mut self,
        categories: Vec<String>,
        mode: CheckMode,
    ) -> Result<BTreeMap<String, Value>, ClientError> {
        let calls: Vec<RpcCall> = categories
            .iter()
            .map(|category| {
                let mut params = Map::new();
                params.insert("category".to_string(), Value::from(category.as_str()));
                RpcCall::new(CATEGORY_INFO_METHOD, params, self.client.next_request_id())
            })
            .collect();

        let by_id: HashMap<u64, &str> = calls
            .iter()
            .zip(&categories)
            .map(|(call, category)| (call.request_id, category.as_str()))
            .collect();

        let batch = self.client.batch_request(&calls).await?;

        Ok(batch
            .check_error(mode)?
            .into_iter()
            .filter_map(|response| {
                let category = by_id.get(&response.request_id()?)?;
                Some((category.to_string(), response.result().clone()))
            })
            .collect())
    }
}

/// Collects the category constants of every group (`g`, `s`, `g_custom`, ...) of an
/// `idoit.constants` result.
fn category_constants(constants: &Value) -> Vec<String> {
    constants
        .get("categories")
        .and_then(Value::as_object)
        .map(|groups| {
            groups
                .values()
                .filter_map(Value::as_object)
                .flat_map(|group| group.keys().cloned())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_constants() {
        let constants = json!({
            "objectTypes": { "C__OBJTYPE__SERVER": "Server" },
            "categories": {
                "g": { "C__CATG__GLOBAL": "General", "C__CATG__MODEL": "Model" },
                "s": { "C__CATS__ROOM": "Room" },
                "g_custom": []
            }
        });

        let mut categories = category_constants(&constants);
        categories.sort();

        assert_eq!(
            categories,
            vec!["C__CATG__GLOBAL", "C__CATG__MODEL", "C__CATS__ROOM"]
        );
    }

    #[test]
    fn test_category_constants_without_categories() {
        assert!(category_constants(&json!({ "objectTypes": {} })).is_empty());
        assert!(category_constants(&Value::Null).is_empty());
    }
}
