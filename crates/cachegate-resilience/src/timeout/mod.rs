//! Timeout wrapper for async operations.

use cachegate_core::CacheError;
use std::time::Duration;

/// Wraps an async operation with a timeout.
///
/// An elapsed deadline becomes `CacheError::Timeout`; the inner future is
/// dropped at that point.
pub async fn with_timeout<F, Fut, T>(duration: Duration, f: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, CacheError>>,
{
    tokio::time::timeout(duration, f())
        .await
        .map_err(|_| CacheError::Timeout(format!("Operation timed out after {:?}", duration)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), || async { Ok::<_, CacheError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_exceeded() {
        let result = with_timeout(Duration::from_millis(10), || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, CacheError>(42)
        })
        .await;

        assert!(matches!(result, Err(CacheError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<u8, _> = with_timeout(Duration::from_secs(1), || async {
            Err(CacheError::connection("refused"))
        })
        .await;

        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
