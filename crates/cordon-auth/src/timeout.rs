//! Deadline wrapper for Credential Store calls.

use std::time::Duration;

use cordon_core::error::{CordonError, CordonResult};

/// Run a store call under a deadline. An elapsed deadline becomes
/// [`CordonError::StoreTimeout`], which every authorization path
/// treats as a denial.
pub(crate) async fn bounded<T>(
    deadline: Duration,
    fut: impl Future<Output = CordonResult<T>>,
) -> CordonResult<T> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(CordonError::StoreTimeout),
    }
}
