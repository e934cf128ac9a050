//! Client-side cache and sync.

pub mod cache;
pub mod remote;
pub mod retry;
pub mod session;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use remote::{HttpRemote, RemoteRecords};
pub use retry::RetryPolicy;
pub use session::{SessionPhase, SyncSession, SyncStatus};
