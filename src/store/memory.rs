// src/store/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::CallRecord;
use crate::store::CallStore;

/// In-memory store keyed by `call_id`, used by tests and by local runs
/// without a database. Enforces the same uniqueness contract as the
/// Postgres store: a second insert with an existing key is reported as
/// `DuplicateKey`, never as a silent overwrite.
#[derive(Default)]
pub struct MemoryCallStore {
    calls: Mutex<HashMap<String, CallRecord>>,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.calls.lock().await.is_empty()
    }
}

#[async_trait]
impl CallStore for MemoryCallStore {
    async fn find_by_call_id(&self, call_id: &str) -> Result<Option<CallRecord>, StoreError> {
        Ok(self.calls.lock().await.get(call_id).cloned())
    }

    async fn insert(&self, record: CallRecord) -> Result<(), StoreError> {
        let mut calls = self.calls.lock().await;
        if calls.contains_key(&record.call_id) {
            return Err(StoreError::DuplicateKey(record.call_id));
        }
        calls.insert(record.call_id.clone(), record);
        Ok(())
    }
}
