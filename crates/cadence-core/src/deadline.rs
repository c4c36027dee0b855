use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;

/// Runs `fut` under a deadline.
///
/// On expiry the future is dropped, which rolls back any open transaction
/// it owned, and `CoreError::Timeout` is returned converted into the
/// caller's error type.
pub async fn with_deadline<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<CoreError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?limit, "operation exceeded its deadline");
            Err(CoreError::Timeout(limit).into())
        }
    }
}
