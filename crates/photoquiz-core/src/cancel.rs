//! Cancellation plumbing for store-facing calls.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Runs `operation` unless `cancel` fires first.
///
/// A token that is already cancelled short-circuits without polling the
/// operation at all.
///
/// # Errors
///
/// Returns [`StoreError::Cancelled`] when the token wins, otherwise whatever
/// `operation` resolves to.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StoreError::Cancelled),
        result = operation => result,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_run_cancellable_passes_through_result() {
        let token = CancellationToken::new();

        let result = run_cancellable(&token, async { Ok::<_, StoreError>(42) }).await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_run_cancellable_short_circuits_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();

        let result = run_cancellable(&token, async {
            Err::<(), _>(StoreError::Database("operation was polled".to_owned()))
        })
        .await;

        assert_eq!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_run_cancellable_interrupts_pending_operation() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = run_cancellable(&token, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<(), StoreError>(())
        })
        .await;

        assert_eq!(result, Err(StoreError::Cancelled));
    }
}
