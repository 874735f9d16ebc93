//! Storage sink interface for completed analyses

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{StoreStats, StoredTestResult};

/// Append-only sink for analysis results
///
/// Implementations serialize concurrent writers themselves; callers never
/// coordinate appends across analyses.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Append one analysis and return its assigned row id
    async fn append(&self, record: &StoredTestResult) -> Result<i64>;

    /// All stored analyses, newest first
    async fn read_all(&self) -> Result<Vec<StoredTestResult>>;

    /// Stored analyses whose verdict was REVIEW_REQUIRED, newest first
    async fn read_disagreements(&self) -> Result<Vec<StoredTestResult>>;

    /// Total count and counts by verdict
    async fn read_stats(&self) -> Result<StoreStats>;
}
