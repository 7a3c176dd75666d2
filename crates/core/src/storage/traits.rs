use async_trait::async_trait;

use super::Result;

/// Opaque string key-value persistence.
///
/// A missing key is the "not set" state and is reported as `Ok(None)`,
/// never as an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Gets a value by key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Sets a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a value. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}
