use async_trait::async_trait;

use crate::error::ApiError;

#[async_trait]
pub trait HomeworkStatuses: Send + Sync {
    /// Fetches every status change since `from_date`, a unix timestamp.
    ///
    /// Returns the decoded JSON body untouched; shape checks belong to
    /// [`crate::response::extract_latest`].
    async fn fetch(&self, from_date: i64) -> Result<serde_json::Value, ApiError>;
}
