//! Application state shared by every handler.

use panvert_core::Config;
use panvert_infra::RateLimitStore;
use panvert_processing::DocumentConverter;
use panvert_storage::{JobStatusStore, StagingArea};
use std::sync::Arc;

/// Services are held behind their traits so tests can substitute the
/// converter, the job store or the rate-limit counters.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub converter: Arc<dyn DocumentConverter>,
    pub jobs: Arc<dyn JobStatusStore>,
    pub staging: StagingArea,
    pub rate_limiter: Arc<dyn RateLimitStore>,
}
