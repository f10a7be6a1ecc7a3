//! httpdump - HTTP request sink
//!
//! Any request sent to `/x/{bucket}/...` is captured in memory under
//! `bucket` and can be inspected later through `/api/record/{bucket}`.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod id;
pub mod server;
pub mod store;

pub use error::{DumpError, Result};
