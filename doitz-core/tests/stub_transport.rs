#![allow(dead_code)]

use cmdb_stub::StubCmdb;
use doitz_core::{BoxError, CategoryConfigStore, ClientOptions, ConfigSource, DoitzClient, Transport};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

pub const API_KEY: &str = "c3VwZXJzZWNyZXQ";

// Hands every payload to a shared in-memory CMDB.
#[derive(Clone)]
pub struct StubTransport {
    cmdb: Arc<Mutex<StubCmdb>>,
    unreachable: bool,
}

impl StubTransport {
    pub fn new(cmdb: StubCmdb) -> Self {
        Self {
            cmdb: Arc::new(Mutex::new(cmdb)),
            unreachable: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(StubCmdb::new())
        }
    }

    pub fn cmdb(&self) -> MutexGuard<'_, StubCmdb> {
        self.cmdb.lock().unwrap()
    }
}

impl Transport for StubTransport {
    async fn execute(&mut self, payload: Value) -> Result<Value, BoxError> {
        if self.unreachable {
            return Err("connection refused".into());
        }
        Ok(self.cmdb().handle(payload))
    }
}

/// Two servers with model and IP categories, one room.
pub fn inventory() -> StubCmdb {
    StubCmdb::new()
        .with_api_key(API_KEY)
        .with_category("C__CATG__MODEL", &["manufacturer", "serial", "firmware"])
        .with_category("C__CATG__IP", &["hostname", "ipv4_address"])
        .with_category("C__CATS__ROOM", &["floor"])
        .with_object(10, &["C__CATG__MODEL", "C__CATG__IP"])
        .with_object(11, &["C__CATG__MODEL", "C__CATG__IP"])
        .with_object(20, &["C__CATS__ROOM"])
}

pub fn client(cmdb: StubCmdb) -> DoitzClient<StubTransport> {
    client_with_config(cmdb, CategoryConfigStore::default())
}

pub fn client_with_config(
    cmdb: StubCmdb,
    config: CategoryConfigStore,
) -> DoitzClient<StubTransport> {
    DoitzClient::new(StubTransport::new(cmdb), ClientOptions::new(API_KEY), config)
}

pub fn user_config(json: &str) -> CategoryConfigStore {
    CategoryConfigStore::load(ConfigSource::Absent, ConfigSource::json(json)).unwrap()
}
