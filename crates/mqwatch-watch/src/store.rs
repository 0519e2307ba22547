//! The cross-watcher store: `(watcherId, subject) → last observed value`.
//!
//! This is the only channel through which one watcher's rules can see
//! another watcher's observations, either via a dependency gate or a
//! `${store.<id>.<subject>}` placeholder. Read-heavy; writers hold the
//! lock only for the upsert. Entries live for the process lifetime.

use mqwatch_expr::StoreRead;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct GlobalStore {
    inner: Arc<RwLock<HashMap<(String, String), Value>>>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, watcher_id: &str, subject: &str, value: Value) {
        let mut map = self.inner.write().unwrap();
        map.insert((watcher_id.to_string(), subject.to_string()), value);
    }

    pub fn get(&self, watcher_id: &str, subject: &str) -> Option<Value> {
        let map = self.inner.read().unwrap();
        map.get(&(watcher_id.to_string(), subject.to_string()))
            .cloned()
    }
}

impl StoreRead for GlobalStore {
    fn get(&self, watcher_id: &str, subject: &str) -> Option<Value> {
        GlobalStore::get(self, watcher_id, subject)
    }
}
