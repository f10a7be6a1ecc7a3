//! HTTP surface for httpdump
//!
//! | Method | Path                     | Handler                        |
//! |--------|--------------------------|--------------------------------|
//! | ANY    | `/x/{bucket}/*`          | capture into `bucket`          |
//! | GET    | `/api/record/`           | every bucket (session cookie)  |
//! | GET    | `/api/record/{bucket}`   | one bucket (session cookie)    |
//! | GET    | `/*`                     | bundled UI, if configured      |

pub mod assets;
pub mod capture;
mod limiter;
mod listener;
pub mod query;
pub mod response;
pub mod router;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use crate::store::RecordStore;

pub use limiter::ConnectionLimiter;
pub use listener::Server;
pub use response::HttpResponse;

/// Graceful shutdown timeout
pub const SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// State shared by every request handler
pub struct AppState {
    /// Captured records
    pub store: Arc<RecordStore>,
    /// Root of the bundled UI
    pub ui_dir: Option<PathBuf>,
}

impl AppState {
    /// Create handler state around a store
    #[must_use]
    pub fn new(store: Arc<RecordStore>, ui_dir: Option<PathBuf>) -> Self {
        Self { store, ui_dir }
    }
}
