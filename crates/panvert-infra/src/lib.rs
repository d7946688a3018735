//! Panvert Infrastructure Library
//!
//! Shared infrastructure for the Panvert service:
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Rate limiting
//! - Cleanup of stale staged files

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "cleanup")]
pub mod cleanup;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{request_id_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimitStore, RateLimitDecision, RateLimitStore};

#[cfg(feature = "cleanup")]
pub use cleanup::{CleanupScheduler, SweepConfig, SweepReport};
