//! Queue-payload ingestion with at-most-once, best-effort semantics.
//!
//! The transport loop (broker connection, delivery, acknowledgment) lives
//! outside this crate; this handler owns the payload contract. A message that
//! is the sender's fault — malformed JSON, no usable entries, a descriptor
//! that fails validation — is dropped with a warning rather than retried.
//! Only store unavailability propagates to the caller.

use serde::Deserialize;
use tracing::{info, warn};

use scriptwatch_registry::Registry;
use scriptwatch_shared::{FileDescriptor, FileRecord, Result, ScriptwatchError};

/// Wire shape of a queue message: `{"files": [{url, priority, company_id}]}`.
#[derive(Debug, Deserialize)]
struct QueuePayload {
    #[serde(default)]
    files: Vec<QueueEntry>,
}

/// One entry of a queue message; every field is optional on the wire so a
/// partially-formed entry can be skipped instead of failing the whole parse.
#[derive(Debug, Deserialize)]
struct QueueEntry {
    url: Option<String>,
    priority: Option<i64>,
    company_id: Option<String>,
}

/// What became of one queue message.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Records created from the payload's well-formed entries.
    Added(Vec<FileRecord>),
    /// The message was dropped without creating further records.
    Dropped { reason: String },
}

/// Process one raw queue message body.
///
/// Returns `Ok(Dropped { .. })` for every caller-fault condition — the
/// message is acknowledged and never retried. `Err` is reserved for store
/// failures, which the consumer loop may surface without crashing.
pub async fn ingest_payload(registry: &Registry, body: &[u8]) -> Result<IngestOutcome> {
    let payload: QueuePayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "dropping message: body is not valid JSON");
            return Ok(IngestOutcome::Dropped {
                reason: format!("invalid JSON: {e}"),
            });
        }
    };

    let descriptors: Vec<FileDescriptor> = payload
        .files
        .into_iter()
        .filter_map(|entry| match (entry.url, entry.priority, entry.company_id) {
            (Some(url), Some(priority), Some(company_id)) => Some(FileDescriptor {
                url,
                priority,
                company_id,
            }),
            _ => {
                warn!("skipping entry with missing fields");
                None
            }
        })
        .collect();

    if descriptors.is_empty() {
        warn!("dropping message: no well-formed entries");
        return Ok(IngestOutcome::Dropped {
            reason: "no well-formed entries".into(),
        });
    }

    match registry.add_files(&descriptors).await {
        Ok(records) => {
            info!(added = records.len(), "added files from queue");
            Ok(IngestOutcome::Added(records))
        }
        Err(e @ ScriptwatchError::Validation { .. }) => {
            warn!(error = %e, "dropping message: validation failed");
            Ok(IngestOutcome::Dropped {
                reason: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use scriptwatch_fetcher::Fetcher;
    use scriptwatch_shared::FetchConfig;
    use scriptwatch_storage::Storage;
    use uuid::Uuid;

    async fn test_setup() -> (Registry, Arc<Storage>) {
        let tmp = std::env::temp_dir().join(format!("sw_ingest_test_{}.db", Uuid::now_v7()));
        let storage = Arc::new(Storage::open(&tmp).await.expect("open test db"));
        let fetcher = Fetcher::new(&FetchConfig::default()).expect("build fetcher");
        (Registry::new(storage.clone(), fetcher), storage)
    }

    #[tokio::test]
    async fn malformed_json_is_dropped() {
        let (registry, storage) = test_setup().await;

        let outcome = ingest_payload(&registry, b"{not json")
            .await
            .expect("handler must not fail");
        assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
        assert!(storage.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_missing_fields_produce_no_records() {
        let (registry, storage) = test_setup().await;

        let body = br#"{"files": [{"url": "bad"}]}"#;
        let outcome = ingest_payload(&registry, body)
            .await
            .expect("handler must not fail");

        assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
        assert!(storage.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn well_formed_payload_adds_records() {
        let (registry, storage) = test_setup().await;
        let company = Uuid::now_v7();

        let body = serde_json::json!({
            "files": [
                { "url": "http://x.com/a.js", "priority": 1, "company_id": company },
                { "url": "http://x.com/b.js", "priority": 5, "company_id": company }
            ]
        });
        let outcome = ingest_payload(&registry, body.to_string().as_bytes())
            .await
            .expect("ingest");

        match outcome {
            IngestOutcome::Added(records) => assert_eq!(records.len(), 2),
            other => panic!("expected Added, got {other:?}"),
        }
        assert_eq!(storage.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn partial_entries_are_skipped_before_the_batch() {
        let (registry, storage) = test_setup().await;
        let company = Uuid::now_v7();

        let body = serde_json::json!({
            "files": [
                { "url": "http://x.com/a.js" },
                { "url": "http://x.com/b.js", "priority": 2, "company_id": company }
            ]
        });
        let outcome = ingest_payload(&registry, body.to_string().as_bytes())
            .await
            .expect("ingest");

        match outcome {
            IngestOutcome::Added(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].url, "http://x.com/b.js");
            }
            other => panic!("expected Added, got {other:?}"),
        }
        assert_eq!(storage.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validation_failure_drops_the_message() {
        let (registry, storage) = test_setup().await;
        let company = Uuid::now_v7();

        // Well-formed entry that fails service validation (.css suffix).
        let body = serde_json::json!({
            "files": [
                { "url": "http://x.com/style.css", "priority": 2, "company_id": company }
            ]
        });
        let outcome = ingest_payload(&registry, body.to_string().as_bytes())
            .await
            .expect("handler must not fail");

        assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
        assert!(storage.list_all().await.unwrap().is_empty());
    }
}
