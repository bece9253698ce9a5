// src/store/mod.rs
pub mod memory;
pub mod postgres;

pub use memory::MemoryCallStore;
pub use postgres::PostgresCallStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::CallRecord;

/// Lookup/insert contract of the persistence collaborator. The store is
/// the single shared resource across connection flows; `call_id` is
/// unique-constrained and that constraint is the authoritative dedup
/// mechanism under racing inserts.
#[async_trait]
pub trait CallStore: Send + Sync {
    async fn find_by_call_id(&self, call_id: &str) -> Result<Option<CallRecord>, StoreError>;

    /// Inserts a new record. Returns `StoreError::DuplicateKey` when a
    /// record with the same `call_id` already exists, including when it
    /// appeared between a caller's lookup and this insert.
    async fn insert(&self, record: CallRecord) -> Result<(), StoreError>;
}
