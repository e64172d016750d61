//! Record creation, refresh, and listing over the store and fetcher.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scriptwatch_fetcher::{FetchError, Fetcher};
use scriptwatch_shared::{FileDescriptor, FileId, FileRecord, Result, ScriptwatchError};
use scriptwatch_storage::Storage;

use crate::validate::validate;

/// The result of a single refresh attempt.
///
/// `record` is the post-refresh state: updated on fetch success, the stored
/// (pre-refresh) state on failure. The persisted record never distinguishes
/// "never fetched" from "last fetch failed"; `fetch_error` carries that
/// distinction to callers who need it.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// The record as readers now see it.
    pub record: FileRecord,
    /// The typed failure, when the fetch did not succeed.
    pub fetch_error: Option<FetchError>,
}

/// Stateless orchestrator over the record store and content fetcher.
///
/// Constructed once at process start and shared by reference across all
/// ingress adapters; concurrent calls race only at the store, where the last
/// write wins.
pub struct Registry {
    storage: Arc<Storage>,
    fetcher: Fetcher,
}

impl Registry {
    /// Create a registry over an opened store and a built fetcher.
    pub fn new(storage: Arc<Storage>, fetcher: Fetcher) -> Self {
        Self { storage, fetcher }
    }

    /// Validate and persist a batch of descriptors, in input order.
    ///
    /// Descriptors are processed one at a time: the first invalid descriptor
    /// aborts the batch before its own insert, but records created for
    /// earlier descriptors stay committed. Callers needing all-or-nothing
    /// semantics must pre-validate.
    #[instrument(skip_all, fields(count = descriptors.len()))]
    pub async fn add_files(&self, descriptors: &[FileDescriptor]) -> Result<Vec<FileRecord>> {
        let mut records = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let normalized = validate(descriptor)?;

            let record = FileRecord {
                id: FileId::new(),
                url: normalized.url.to_string(),
                host: normalized.host,
                content: None,
                priority: normalized.priority,
                company_id: normalized.company_id,
                last_fetched: None,
                last_updated: Utc::now(),
            };

            self.storage.insert_file(&record).await?;
            records.push(record);
        }

        info!(added = records.len(), "registered files");
        Ok(records)
    }

    /// Refresh one record's content from its remote URL.
    ///
    /// Returns `NotFound` for unknown ids. A fetch failure leaves the store
    /// untouched and returns the stored record together with the typed error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn refresh_content(&self, id: &FileId) -> Result<RefreshOutcome> {
        let record = self
            .storage
            .get_file(id)
            .await?
            .ok_or(ScriptwatchError::NotFound { id: *id })?;

        self.refresh_record(record).await
    }

    /// List a tenant's records, optionally refreshing each before returning.
    pub async fn list_by_company(
        &self,
        company_id: &Uuid,
        refresh: bool,
    ) -> Result<Vec<FileRecord>> {
        let records = self.storage.list_by_company(company_id).await?;
        self.maybe_refresh(records, refresh).await
    }

    /// List every record, optionally refreshing each before returning.
    pub async fn list_all(&self, refresh: bool) -> Result<Vec<FileRecord>> {
        let records = self.storage.list_all().await?;
        self.maybe_refresh(records, refresh).await
    }

    /// Fetch and persist new content for an already-loaded record.
    async fn refresh_record(&self, mut record: FileRecord) -> Result<RefreshOutcome> {
        match self.fetcher.fetch(&record.url).await {
            Ok(content) => {
                let fetched_at = Utc::now();
                self.storage
                    .update_content(&record.id, &content, fetched_at)
                    .await?;
                record.content = Some(content);
                record.last_fetched = Some(fetched_at);
                Ok(RefreshOutcome {
                    record,
                    fetch_error: None,
                })
            }
            Err(e) => {
                warn!(url = %record.url, error = %e, "fetch failed, keeping stored content");
                Ok(RefreshOutcome {
                    record,
                    fetch_error: Some(e),
                })
            }
        }
    }

    /// Sequentially refresh a listing when asked to; fetch failures degrade
    /// to the stored state per record.
    async fn maybe_refresh(
        &self,
        records: Vec<FileRecord>,
        refresh: bool,
    ) -> Result<Vec<FileRecord>> {
        if !refresh {
            return Ok(records);
        }

        let mut refreshed = Vec::with_capacity(records.len());
        for record in records {
            refreshed.push(self.refresh_record(record).await?.record);
        }
        Ok(refreshed)
    }
}
