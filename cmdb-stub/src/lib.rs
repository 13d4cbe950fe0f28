//! # CMDB Stub
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-memory i-doit style
//! JSON-RPC server for integration testing `doitz-core`.
//! It is not intended for production use.
//!
//! The stub understands the `idoit.version`, `idoit.constants`, `cmdb.category_info` and
//! `cmdb.category.*` methods on a tiny object/category/entry model, and can be told to
//! misbehave (fail given requests, drop, reorder or renumber batch replies, reject batches).
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const SYSTEM_ERROR: i64 = -32099;

type Fault = (i64, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Normal,
    Archived,
    Deleted,
}

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    status: EntryStatus,
    data: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct Category {
    fields: Vec<String>,
    describable: bool,
}

/// An in-memory CMDB answering JSON-RPC payloads.
#[derive(Debug, Clone, Default)]
pub struct StubCmdb {
    api_key: Option<String>,
    categories: BTreeMap<String, Category>,
    objects: BTreeMap<u64, Vec<String>>,
    entries: BTreeMap<(u64, String), Vec<Entry>>,
    next_entry_id: u64,
    reverse_batches: bool,
    id_offset: u64,
    faults: HashMap<u64, Fault>,
    dropped: HashSet<u64>,
    batch_fault: Option<Fault>,
    received: Vec<Value>,
}

impl StubCmdb {
    pub fn new() -> Self {
        Self {
            next_entry_id: 1,
            ..Self::default()
        }
    }

    /// Requires every call to carry this `apikey`.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// Registers a category and its API field names.
    pub fn with_category(mut self, name: &str, fields: &[&str]) -> Self {
        self.categories.insert(
            name.to_string(),
            Category {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                describable: true,
            },
        );
        self
    }

    /// Registers a category that is listed by `idoit.constants` but refused by
    /// `cmdb.category_info`.
    pub fn with_undescribable_category(mut self, name: &str) -> Self {
        self.categories.insert(
            name.to_string(),
            Category {
                fields: Vec::new(),
                describable: false,
            },
        );
        self
    }

    /// Registers an object and the categories assigned to its type.
    pub fn with_object(mut self, id: u64, categories: &[&str]) -> Self {
        self.objects
            .insert(id, categories.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Answers batches in reverse order.
    pub fn reverse_batches(mut self) -> Self {
        self.reverse_batches = true;
        self
    }

    /// Adds `offset` to every id in replies.
    pub fn with_id_offset(mut self, offset: u64) -> Self {
        self.id_offset = offset;
        self
    }

    /// Makes the call with `request_id` fail with the given error.
    pub fn fail_request(&mut self, request_id: u64, code: i64, message: &str) {
        self.faults.insert(request_id, (code, message.to_string()));
    }

    /// Executes the call with `request_id` inside a batch but leaves its reply out.
    pub fn drop_reply(&mut self, request_id: u64) {
        self.dropped.insert(request_id);
    }

    /// Rejects every batch payload as a whole with an id-less error. Single calls are
    /// still answered.
    pub fn reject_batches(&mut self, code: i64, message: &str) {
        self.batch_fault = Some((code, message.to_string()));
    }

    /// Every payload handled so far, as received.
    pub fn received(&self) -> &[Value] {
        &self.received
    }

    /// The data of the entries of `category` on `object` in the given status, with the
    /// entry id under `id`.
    pub fn entries(&self, object: u64, category: &str, status: EntryStatus) -> Vec<Value> {
        self.entries
            .get(&(object, category.to_string()))
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.status == status)
                    .map(|e| {
                        let mut data = e.data.clone();
                        data.insert("id".to_string(), json!(e.id));
                        Value::Object(data)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Answers a JSON-RPC payload (a single envelope or a batch).
    pub fn handle(&mut self, payload: Value) -> Value {
        self.received.push(payload.clone());

        if payload.is_array()
            && let Some((code, message)) = &self.batch_fault
        {
            return error_envelope(Value::Null, *code, message);
        }

        match payload {
            Value::Array(calls) if calls.is_empty() => {
                error_envelope(Value::Null, INVALID_REQUEST, "Invalid request: empty batch")
            }
            Value::Array(calls) => {
                let mut replies: Vec<Value> = calls
                    .into_iter()
                    .filter_map(|call| {
                        let dropped = call
                            .get("id")
                            .and_then(Value::as_u64)
                            .is_some_and(|id| self.dropped.contains(&id));
                        let reply = self.handle_call(call);
                        (!dropped).then_some(reply)
                    })
                    .collect();
                if self.reverse_batches {
                    replies.reverse();
                }
                Value::Array(replies)
            }
            call @ Value::Object(_) => self.handle_call(call),
            _ => error_envelope(Value::Null, PARSE_ERROR, "Parse error"),
        }
    }

    fn handle_call(&mut self, call: Value) -> Value {
        let id = match call.get("id") {
            Some(Value::Number(n)) => n.as_u64().map(|id| id + self.id_offset),
            _ => None,
        };
        let reply_id = id.map(Value::from).unwrap_or(Value::Null);

        if call.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return error_envelope(reply_id, INVALID_REQUEST, "Invalid request");
        }

        let Some(method) = call.get("method").and_then(Value::as_str) else {
            return error_envelope(reply_id, INVALID_REQUEST, "Invalid request: method missing");
        };

        let empty = Map::new();
        let params = call.get("params").and_then(Value::as_object).unwrap_or(&empty);

        if let Some(key) = &self.api_key
            && params.get("apikey").and_then(Value::as_str) != Some(key.as_str())
        {
            return error_envelope(reply_id, SYSTEM_ERROR, "System error: invalid apikey");
        }

        let original_id = id.map(|id| id - self.id_offset);
        if let Some((code, message)) = original_id.and_then(|id| self.faults.get(&id)) {
            return error_envelope(reply_id, *code, message);
        }

        let result = match method {
            "idoit.version" => Ok(json!({ "version": "1.19", "type": "PRO", "step": "" })),
            "idoit.constants" => Ok(self.constants()),
            "cmdb.category_info" => self.category_info(params),
            "cmdb.category.save" => self.save(params),
            "cmdb.category.read" => self.read(params),
            "cmdb.category.delete" => {
                self.transition(params, "objID", "cateID", Some(EntryStatus::Deleted))
            }
            "cmdb.category.archive" => {
                self.transition(params, "object", "entry", Some(EntryStatus::Archived))
            }
            "cmdb.category.recycle" => {
                self.transition(params, "object", "entry", Some(EntryStatus::Normal))
            }
            "cmdb.category.purge" => self.transition(params, "object", "entry", None),
            "cmdb.category.quickpurge" => self.transition(params, "objID", "cateID", None),
            _ => Err((METHOD_NOT_FOUND, format!("Method not found: {method}"))),
        };

        match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": reply_id, "result": result }),
            Err((code, message)) => error_envelope(reply_id, code, &message),
        }
    }

    fn constants(&self) -> Value {
        let mut groups: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();

        for name in self.categories.keys() {
            let group = if name.contains("CUSTOM") {
                "g_custom"
            } else if name.starts_with("C__CATS") {
                "s"
            } else {
                "g"
            };
            groups
                .entry(group)
                .or_default()
                .insert(name.clone(), json!(name));
        }

        json!({ "objectTypes": {}, "categories": groups })
    }

    fn category_info(&self, params: &Map<String, Value>) -> Result<Value, Fault> {
        let name = str_param(params, "category")?;

        match self.categories.get(name) {
            Some(category) if category.describable => {
                let fields: Map<String, Value> = category
                    .fields
                    .iter()
                    .map(|field| {
                        let info = json!({
                            "title": field,
                            "info": { "description": format!("{field} of {name}") },
                            "data": { "type": "text" }
                        });
                        (field.clone(), info)
                    })
                    .collect();
                Ok(Value::Object(fields))
            }
            Some(_) => Err((
                SYSTEM_ERROR,
                format!("Category {name} cannot be described on its own"),
            )),
            None => Err((INVALID_PARAMS, format!("Category {name} not found"))),
        }
    }

    /// Checks that `object` exists and carries `category`.
    fn assigned(&self, object: u64, category: &str) -> Result<(), Fault> {
        if !self.categories.contains_key(category) {
            return Err((INVALID_PARAMS, format!("Category {category} not found")));
        }

        match self.objects.get(&object) {
            None => Err((INVALID_PARAMS, format!("Object {object} not found"))),
            Some(categories) if !categories.iter().any(|c| c == category) => Err((
                SYSTEM_ERROR,
                format!("Category {category} is not assigned to object {object}"),
            )),
            Some(_) => Ok(()),
        }
    }

    fn save(&mut self, params: &Map<String, Value>) -> Result<Value, Fault> {
        let object = u64_param(params, "object")?;
        let category = str_param(params, "category")?.to_string();
        self.assigned(object, &category)?;

        let data = params
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let known = &self.categories[&category].fields;
        if let Some(unknown) = data.keys().find(|key| !known.contains(key)) {
            return Err((INVALID_PARAMS, format!("Unknown attribute {unknown}")));
        }

        let entries = self.entries.entry((object, category)).or_default();

        let entry_id = match params.get("entry") {
            Some(entry) => {
                let id = entry
                    .as_u64()
                    .ok_or((INVALID_PARAMS, "Parameter entry must be an integer".to_string()))?;
                let existing = entries
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or((SYSTEM_ERROR, format!("Entry {id} not found")))?;
                existing.data.extend(data);
                id
            }
            None => {
                let id = self.next_entry_id;
                self.next_entry_id += 1;
                entries.push(Entry {
                    id,
                    status: EntryStatus::Normal,
                    data,
                });
                id
            }
        };

        Ok(json!({
            "success": true,
            "message": "Category entry successfully saved",
            "entry": entry_id
        }))
    }

    fn read(&self, params: &Map<String, Value>) -> Result<Value, Fault> {
        let object = u64_param(params, "objID")?;
        let category = str_param(params, "category")?;
        self.assigned(object, category)?;

        let rows = self
            .entries(object, category, EntryStatus::Normal)
            .into_iter()
            .map(|mut row| {
                // The API reports ids as strings.
                if let Some(id) = row.get("id").and_then(Value::as_u64) {
                    row["id"] = json!(id.to_string());
                }
                row["objID"] = json!(object.to_string());
                row
            })
            .collect();

        Ok(Value::Array(rows))
    }

    /// Moves entries to `status`, or removes them when `status` is `None`. Without an
    /// entry id every entry of the category is affected.
    fn transition(
        &mut self,
        params: &Map<String, Value>,
        object_key: &str,
        entry_key: &str,
        status: Option<EntryStatus>,
    ) -> Result<Value, Fault> {
        let object = u64_param(params, object_key)?;
        let category = str_param(params, "category")?.to_string();
        self.assigned(object, &category)?;

        let entry = match params.get(entry_key) {
            Some(value) => Some(value.as_u64().ok_or((
                INVALID_PARAMS,
                format!("Parameter {entry_key} must be an integer"),
            ))?),
            None => None,
        };

        let entries = self.entries.entry((object, category)).or_default();

        if let Some(id) = entry
            && !entries.iter().any(|e| e.id == id)
        {
            return Err((SYSTEM_ERROR, format!("Entry {id} not found")));
        }

        let selected = |e: &Entry| entry.is_none_or(|id| e.id == id);

        match status {
            Some(status) => entries
                .iter_mut()
                .filter(|e| selected(&**e))
                .for_each(|e| e.status = status),
            None => entries.retain(|e| !selected(e)),
        }

        Ok(json!({ "success": true, "message": "Category entry successfully updated" }))
    }
}

fn error_envelope(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn str_param<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, Fault> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or((INVALID_PARAMS, format!("Parameter {key} missing")))
}

fn u64_param(params: &Map<String, Value>, key: &str) -> Result<u64, Fault> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .ok_or((INVALID_PARAMS, format!("Parameter {key} missing")))
}
