// ============================================================================
// supptrack Library
// ============================================================================

pub mod adherence;
pub mod calendar;
pub mod config;
pub mod core;
pub mod gateway;
pub mod plan;
pub mod retention;
pub mod storage;
pub mod sync;
pub mod web;

// Re-export main types for convenience
pub use adherence::{DayState, Filter, classify};
pub use self::core::{Clock, FixedClock, Result, SystemClock, TrackerError, UserRecord};
pub use gateway::RecordGateway;
pub use plan::{PlanResolver, SupplementPlan};
pub use retention::{RetentionWindow, allowed_months};
pub use storage::{FileKvStore, InMemoryKvStore, KvStore};
pub use sync::{SyncSession, SyncStatus};
