use crate::core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Backing key-value store trait - allows pluggable storage backends
///
/// A `set` replaces the whole value under the key in one step; there is no
/// versioning, so concurrent writers resolve as last-write-wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value under `key`, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value under `key`
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}
