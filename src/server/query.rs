//! Read-only accessors over the record store

use hyper::StatusCode;

use crate::store::RecordStore;
use crate::{DumpError, Result};

use super::response::{self, HttpResponse};

/// Every bucket and every record, as a JSON object keyed by bucket id
///
/// # Errors
///
/// Returns error if serialization fails
pub fn list_all(store: &RecordStore) -> Result<HttpResponse> {
    response::json(StatusCode::OK, &store.snapshot())
}

/// One bucket's records as a JSON array; unknown buckets yield `[]`
///
/// # Errors
///
/// Returns error if the bucket id is empty or serialization fails
pub fn get_one(store: &RecordStore, bucket_id: &str) -> Result<HttpResponse> {
    if bucket_id.is_empty() {
        return Err(DumpError::InvalidBucketId);
    }

    response::json(StatusCode::OK, &store.get(bucket_id))
}
