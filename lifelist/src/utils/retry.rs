//! Retry logic for transient fetch failures
//!
//! Lookups and the top-species request get a single immediate retry. The
//! observation history pass never retries; it fails as a whole instead.

use crate::error::FetchError;
use std::future::Future;

/// Automatic retries after the first attempt for retryable fetches
pub const FETCH_RETRIES: u32 = 1;

/// Run `operation`, repeating it up to `retries` more times on transient errors
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is transient and retries remain: log WARN, retry
/// 4. Otherwise return the error
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    retries: u32,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempt <= retries => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Request failed, retrying"
                );
            }
            Err(err) => {
                if attempt > 1 {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Request failed after retry"
                    );
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_success_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry_transient("test", 1, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_retry_recovers() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry_transient("test", 1, || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(FetchError::Network("connection reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_one_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), _> = retry_transient("test", 1, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Api(500, "boom".into()))
            }
        })
        .await;

        assert_eq!(result, Err(FetchError::Api(500, "boom".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_parse_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), _> = retry_transient("test", 1, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Parse("unexpected eof".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
