//! Sharded bucket store

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::trace;

use super::record::Record;

/// Records captured for one bucket, oldest first
pub type BucketLog = Vec<Arc<Record>>;

/// Every bucket and its log, keyed in sorted order
pub type Snapshot = BTreeMap<String, BucketLog>;

/// Store-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of buckets with at least one record
    pub buckets: usize,
    /// Total number of records
    pub records: usize,
    /// Total captured body bytes
    pub body_bytes: usize,
}

/// Concurrent mapping from bucket id to its append-only log
///
/// Appends to buckets living in different shards never contend. Returned
/// logs are copies of `Arc` handles, so readers never see later appends
/// through them and never hold a lock after returning.
#[derive(Default)]
pub struct RecordStore {
    buckets: DashMap<String, BucketLog>,
    record_count: AtomicUsize,
    body_bytes: AtomicUsize,
}

impl RecordStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the tail of a bucket, creating the bucket if needed
    ///
    /// The shard lock is held only for the push, so a reader sees either
    /// the whole record or nothing.
    pub fn append(&self, bucket_id: &str, record: Record) -> Arc<Record> {
        let record = Arc::new(record);
        let body_len = record.body_len();

        if let Some(mut log) = self.buckets.get_mut(bucket_id) {
            log.push(Arc::clone(&record));
        } else {
            self.buckets
                .entry(bucket_id.to_string())
                .or_default()
                .push(Arc::clone(&record));
        }

        self.record_count.fetch_add(1, Ordering::Relaxed);
        self.body_bytes.fetch_add(body_len, Ordering::Relaxed);

        trace!("Appended record to bucket '{}' ({} bytes)", bucket_id, body_len);

        record
    }

    /// Copy of a bucket's log, empty if the bucket was never written
    #[must_use]
    pub fn get(&self, bucket_id: &str) -> BucketLog {
        self.buckets
            .get(bucket_id)
            .map(|log| log.value().clone())
            .unwrap_or_default()
    }

    /// Copy of every bucket's log
    ///
    /// Shards are visited one at a time. Each bucket reflects every append
    /// that finished before the call; appends racing with the walk may or
    /// may not be included.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.buckets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of records in a bucket
    #[must_use]
    pub fn bucket_len(&self, bucket_id: &str) -> usize {
        self.buckets.get(bucket_id).map_or(0, |log| log.len())
    }

    /// Number of buckets
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if nothing has been captured yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Current counters
    ///
    /// Counters are bumped after the shard lock is released, so a value read
    /// concurrently with appends can trail the logs by a few records.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            buckets: self.buckets.len(),
            records: self.record_count.load(Ordering::Relaxed),
            body_bytes: self.body_bytes.load(Ordering::Relaxed),
        }
    }
}
