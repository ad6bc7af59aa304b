//! Timeout utilities for page operations
//!
//! Wraps browser operations so a hung navigation surfaces as a typed
//! `FetchError::Timeout` rather than stalling the attempt forever.

use std::future::Future;
use std::time::Duration;

use super::crawl_types::FetchError;

/// Run `operation` under `timeout`
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout` - Deadline for the whole operation
/// * `operation_name` - Human-readable name used in the timeout error
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the deadline passed
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            operation: operation_name.to_string(),
            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let result: Result<(), FetchError> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            Duration::from_secs(15),
            "navigation",
        )
        .await;

        assert_eq!(
            result,
            Err(FetchError::Timeout {
                operation: "navigation".into(),
                millis: 15_000
            })
        );
    }

    #[tokio::test]
    async fn inner_error_passes_through() {
        let result: Result<(), FetchError> = with_page_timeout(
            async { Err(FetchError::Navigation("refused".into())) },
            Duration::from_secs(1),
            "navigation",
        )
        .await;
        assert_eq!(result, Err(FetchError::Navigation("refused".into())));
    }
}
