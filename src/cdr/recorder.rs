// src/cdr/recorder.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::cdr::parser::ParsedCdr;
use crate::error::StoreError;
use crate::store::CallStore;

/// What happened to a record handed to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    /// A record with this `call_id` was already stored; the delivery was
    /// a PBX retry and nothing was written.
    Duplicate,
}

/// Deduplicating gateway in front of the store. Exactly-once is owned by
/// the store's unique constraint on `call_id`: the pre-insert lookup is
/// an optimization, and losing the lookup/insert race to another
/// connection still resolves as `Duplicate`.
pub struct CdrRecorder {
    store: Arc<dyn CallStore>,
}

impl CdrRecorder {
    pub fn new(store: Arc<dyn CallStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, cdr: ParsedCdr) -> Result<PersistOutcome, StoreError> {
        if self.store.find_by_call_id(&cdr.call_id).await?.is_some() {
            debug!("CDR record already exists, skipping: {}", cdr.call_id);
            return Ok(PersistOutcome::Duplicate);
        }

        let record = cdr.into_record(Utc::now());
        let call_id = record.call_id.clone();
        let direction = record.direction;
        let from = record.from_number.clone();
        let to = record.to_number.clone();
        let duration = record.duration_sec;

        match self.store.insert(record).await {
            Ok(()) => {
                info!(
                    "✅ CDR record saved: id={}, direction={}, from={}, to={}, duration={}s",
                    call_id, direction, from, to, duration
                );
                Ok(PersistOutcome::Persisted)
            }
            Err(StoreError::DuplicateKey(_)) => {
                debug!(
                    "Concurrent insert won the race for {}, treating as duplicate",
                    call_id
                );
                Ok(PersistOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::parser::parse_cdr_line;
    use crate::store::MemoryCallStore;

    fn sample_line(call_id: &str) -> String {
        let mut fields = vec![""; 19];
        fields[0] = call_id;
        fields[1] = "50";
        fields[2] = "2024-03-01T09:00:00Z";
        fields[3] = "2024-03-01T09:00:05Z";
        fields[4] = "2024-03-01T09:00:55Z";
        fields[6] = "Ext100";
        fields[8] = "4155551234";
        fields[17] = "0.10";
        fields.join("\t")
    }

    #[tokio::test]
    async fn test_first_delivery_is_persisted() {
        let store = Arc::new(MemoryCallStore::new());
        let recorder = CdrRecorder::new(store.clone());

        let cdr = parse_cdr_line(&sample_line("CALL-100")).unwrap();
        let outcome = recorder.record(cdr).await.unwrap();

        assert_eq!(outcome, PersistOutcome::Persisted);
        assert_eq!(store.len().await, 1);

        let stored = store.find_by_call_id("CALL-100").await.unwrap().unwrap();
        assert_eq!(stored.day, "2024-03-01");
    }

    #[tokio::test]
    async fn test_second_delivery_is_duplicate() {
        let store = Arc::new(MemoryCallStore::new());
        let recorder = CdrRecorder::new(store.clone());

        let cdr = parse_cdr_line(&sample_line("CALL-101")).unwrap();
        assert_eq!(
            recorder.record(cdr.clone()).await.unwrap(),
            PersistOutcome::Persisted
        );
        assert_eq!(
            recorder.record(cdr).await.unwrap(),
            PersistOutcome::Duplicate
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_racing_deliveries_store_exactly_one() {
        let store = Arc::new(MemoryCallStore::new());
        let recorder = Arc::new(CdrRecorder::new(store.clone()));

        let cdr = parse_cdr_line(&sample_line("CALL-102")).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let recorder = recorder.clone();
            let cdr = cdr.clone();
            handles.push(tokio::spawn(async move { recorder.record(cdr).await }));
        }

        let mut persisted = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                PersistOutcome::Persisted => persisted += 1,
                PersistOutcome::Duplicate => {}
            }
        }

        assert_eq!(persisted, 1);
        assert_eq!(store.len().await, 1);
    }
}
