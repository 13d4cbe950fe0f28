//! # Request Builder
//!
//! Every `cmdb.category.*` method takes the same ingredients (object id, category, entry
//! id, attribute payload) under slightly different parameter names. [`Operation::shape`]
//! records those names once per operation and [`RequestBuilder::build`] expands a
//! [`BulkRequest`] into one [`RpcCall`] per `object × category × entry/attribute-set`.
//!
//! Calls come out object-major, then category, then entry/attribute order. The server
//! may answer in any order, so responses are matched back by request id.
use crate::{
    config::CategoryConfigStore,
    rpc::{RequestIds, RpcCall},
};
use serde_json::{Map, Value};

const DATA_KEY: &str = "data";
const CATEGORY_KEY: &str = "category";

/// Parameter names and payload expectations of one API method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShape {
    /// Suffix appended to `cmdb.category.`.
    pub method_suffix: &'static str,
    /// Name of the object id parameter (`object` or `objID`).
    pub object_key: &'static str,
    /// Name of the entry id parameter (`entry` or `cateID`).
    pub entry_key: &'static str,
    /// Whether the method accepts a `data` payload.
    pub takes_attributes: bool,
}

/// The bulk category operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Save,
    Delete,
    Read,
    QuickPurge,
    Purge,
    Recycle,
    Archive,
}

impl Operation {
    pub const fn shape(self) -> CallShape {
        match self {
            Operation::Save => CallShape {
                method_suffix: "save",
                object_key: "object",
                entry_key: "entry",
                takes_attributes: true,
            },
            Operation::Delete => CallShape {
                method_suffix: "delete",
                object_key: "objID",
                entry_key: "cateID",
                takes_attributes: false,
            },
            Operation::Read => CallShape {
                method_suffix: "read",
                object_key: "objID",
                entry_key: "entry",
                takes_attributes: false,
            },
            Operation::QuickPurge => CallShape {
                method_suffix: "quickpurge",
                object_key: "objID",
                entry_key: "cateID",
                takes_attributes: false,
            },
            Operation::Purge => CallShape {
                method_suffix: "purge",
                object_key: "object",
                entry_key: "entry",
                takes_attributes: false,
            },
            Operation::Recycle => CallShape {
                method_suffix: "recycle",
                object_key: "object",
                entry_key: "entry",
                takes_attributes: false,
            },
            Operation::Archive => CallShape {
                method_suffix: "archive",
                object_key: "object",
                entry_key: "entry",
                takes_attributes: false,
            },
        }
    }

    /// The full API method name, e.g. `cmdb.category.quickpurge`.
    pub fn method(self) -> String {
        format!("cmdb.category.{}", self.shape().method_suffix)
    }
}

/// Which entries of a category an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySelector {
    /// Explicit entry ids. Empty means "no entry filter".
    Ids(Vec<u64>),
    /// Every entry. Not resolved into ids yet, so it behaves like an empty id list.
    All,
}

impl Default for EntrySelector {
    fn default() -> Self {
        EntrySelector::Ids(Vec::new())
    }
}

impl From<Vec<u64>> for EntrySelector {
    fn from(ids: Vec<u64>) -> Self {
        EntrySelector::Ids(ids)
    }
}

impl From<Option<u64>> for EntrySelector {
    fn from(id: Option<u64>) -> Self {
        EntrySelector::Ids(id.into_iter().collect())
    }
}

impl std::str::FromStr for EntrySelector {
    type Err = std::num::ParseIntError;

    /// Parses `all` or a comma separated list of entry ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "all" {
            return Ok(EntrySelector::All);
        }

        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .map(EntrySelector::Ids)
    }
}

impl EntrySelector {
    fn ids(&self) -> &[u64] {
        match self {
            EntrySelector::Ids(ids) => ids,
            EntrySelector::All => &[],
        }
    }
}

/// The caller-visible inputs of a bulk category operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRequest {
    pub object_ids: Vec<u64>,
    pub categories: Vec<String>,
    pub entries: EntrySelector,
    pub attributes: Vec<Map<String, Value>>,
}

impl BulkRequest {
    pub fn new<S: AsRef<str>>(object_ids: &[u64], categories: &[S]) -> Self {
        Self {
            object_ids: object_ids.to_vec(),
            categories: categories.iter().map(|c| c.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_entries(mut self, entries: impl Into<EntrySelector>) -> Self {
        self.entries = entries.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Map<String, Value>>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Expands bulk requests into calls, remapping attribute payloads on the way.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a CategoryConfigStore,
    ids: &'a RequestIds,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a CategoryConfigStore, ids: &'a RequestIds) -> Self {
        Self { config, ids }
    }

    /// Expands `request` into the calls of `operation`.
    ///
    /// Never fails: empty object or category lists simply produce no calls.
    pub fn build(&self, operation: Operation, request: &BulkRequest) -> Vec<RpcCall> {
        let shape = operation.shape();
        let method = operation.method();
        let entries = request.entries.ids();

        let attributes: &[Map<String, Value>] = if shape.takes_attributes {
            &request.attributes
        } else {
            if !request.attributes.is_empty() {
                tracing::debug!(%method, "ignoring attributes for a method without payload");
            }
            &[]
        };

        let mut calls = Vec::new();

        for &object_id in &request.object_ids {
            for category in &request.categories {
                for mut params in extra_params(entries, shape.entry_key, attributes) {
                    if let Some(Value::Object(data)) = params.get(DATA_KEY) {
                        let remapped = self.config.remap(category, data);
                        params.insert(DATA_KEY.to_string(), Value::Object(remapped));
                    }

                    let mut call_params = Map::new();
                    call_params.insert(shape.object_key.to_string(), Value::from(object_id));
                    call_params.insert(CATEGORY_KEY.to_string(), Value::from(category.as_str()));
                    call_params.extend(params);

                    calls.push(RpcCall::new(method.clone(), call_params, self.ids.next_id()));
                }
            }
        }

        tracing::debug!(%method, calls = calls.len(), "expanded bulk request");

        calls
    }
}

/// The entry/payload part of every call for one `(object, category)` pair.
///
/// When there are as many entry ids as attribute sets they are paired by position.
/// Otherwise every attribute set is combined with every entry id (a single id is
/// broadcast to all sets).
fn extra_params(
    entries: &[u64],
    entry_key: &str,
    attributes: &[Map<String, Value>],
) -> Vec<Map<String, Value>> {
    if !attributes.is_empty() {
        if entries.len() == attributes.len() {
            return entries
                .iter()
                .zip(attributes)
                .flat_map(|(entry, attrs)| expand(std::slice::from_ref(entry), entry_key, attrs))
                .collect();
        }

        return attributes
            .iter()
            .flat_map(|attrs| expand(entries, entry_key, attrs))
            .collect();
    }

    if !entries.is_empty() {
        return expand(entries, entry_key, &Map::new());
    }

    vec![Map::new()]
}

fn expand(entries: &[u64], entry_key: &str, attrs: &Map<String, Value>) -> Vec<Map<String, Value>> {
    let data = (!attrs.is_empty()).then(|| Value::Object(attrs.clone()));

    if entries.is_empty() {
        let mut params = Map::new();
        if let Some(data) = data {
            params.insert(DATA_KEY.to_string(), data);
        }
        return vec![params];
    }

    entries
        .iter()
        .map(|&entry| {
            let mut params = Map::new();
            params.insert(entry_key.to_string(), Value::from(entry));
            if let Some(data) = &data {
                params.insert(DATA_KEY.to_string(), data.clone());
            }
            params
        })
        .collect()
}
