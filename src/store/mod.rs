//! In-memory record store
//!
//! Captured requests are kept per bucket in append-only logs. Nothing is ever
//! evicted: memory grows with traffic for the lifetime of the process, so the
//! store is a debugging tool rather than something to leave exposed to
//! unbounded production traffic.
//!
//! Locking is per shard of a [`dashmap::DashMap`]: an append holds the write
//! lock of the one shard owning its bucket, reads hold the read lock.

mod memory;
mod record;

pub use memory::{BucketLog, RecordStore, Snapshot, StoreStats};
pub use record::{canonical_header_name, parse_query, MultiMap, Record, RecordUrl};
