//! Caller-driven cancellation of service calls.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use clouddisk_core::error::AppError;
use clouddisk_core::result::AppResult;

/// Run `fut` until it completes or `cancel` fires.
///
/// On cancellation the in-flight future is dropped and `Cancelled` is
/// returned. Work already committed by the future stays committed.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(AppError::cancelled("Operation cancelled before start"));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::cancelled("Operation cancelled")),
        result = fut => result,
    }
}
