//! Listing revalidation.
//!
//! After a committed mutation the catalog tells the web layer that cached
//! renderings of a path are stale. The cache itself lives outside this crate.

use async_trait::async_trait;

/// Receives stale-path notifications.
#[async_trait]
pub trait Revalidator: Send + Sync {
    /// Mark every cached rendering of `path` as stale.
    async fn revalidate_path(&self, path: &str) -> anyhow::Result<()>;
}

/// Revalidator that only records the event in the trace log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRevalidator;

#[async_trait]
impl Revalidator for LoggingRevalidator {
    async fn revalidate_path(&self, path: &str) -> anyhow::Result<()> {
        tracing::info!(path = %path, "listing revalidated");
        Ok(())
    }
}
