//! # Timed HTTP Call
//!
//! Enforces a wall-clock limit on one network call, independent of any
//! timeout the underlying client may have. The call is raced against a
//! timer; when the timer wins, the call's future is dropped, which cancels
//! the in-flight request and releases its connection.

use std::future::Future;
use std::time::Duration;

use crate::error::{ReachError, Result};

/// Await `call`, failing with `ReachError::Timeout` once `limit` elapses.
/// `None` disables the timer arm entirely.
pub async fn timed_call<F, T>(limit: Option<Duration>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(limit) = limit else {
        return call.await;
    };

    tokio::select! {
        biased;
        result = call => result,
        _ = tokio::time::sleep(limit) => Err(ReachError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fast_call_wins() {
        let out = timed_call(Some(Duration::from_secs(1)), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(7)
        })
        .await
        .unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out_and_is_dropped() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let err = timed_call(Some(Duration::from_millis(100)), async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ReachError::Timeout(d) if d == Duration::from_millis(100)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_waits_for_the_call() {
        let out = timed_call(None, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("late")
        })
        .await
        .unwrap();
        assert_eq!(out, "late");
    }

    #[tokio::test]
    async fn call_errors_pass_through() {
        let err = timed_call::<_, ()>(Some(Duration::from_secs(1)), async {
            Err(ReachError::Transport("refused".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ReachError::Transport(_)));
    }
}
