//! Per-attempt activity context: heartbeats and cancellation.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Handed to each activity attempt by [`invoke_activity`].
///
/// Activities with a heartbeat window configured must call
/// [`ActivityContext::heartbeat`] often enough to stay inside it; the
/// runtime fails the attempt when the window elapses without a beat.
/// The context also exposes the cooperative cancellation token so
/// long-running activities can wind down early.
///
/// [`invoke_activity`]: crate::activity::invoke_activity
#[derive(Debug, Clone)]
pub struct ActivityContext {
    cancel: CancellationToken,
    last_beat: Arc<Mutex<Instant>>,
}

impl ActivityContext {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            last_beat: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Records a heartbeat with a progress indication (0–100).
    pub fn heartbeat(&self, progress: u8) {
        *self.last_beat.lock().unwrap() = Instant::now();
        tracing::trace!(progress, "activity heartbeat");
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Resolves once the time since the last heartbeat exceeds `window`.
    pub(crate) async fn heartbeat_expired(&self, window: Duration) {
        loop {
            let elapsed = self.last_beat.lock().unwrap().elapsed();
            if elapsed >= window {
                return;
            }
            tokio::time::sleep(window - elapsed).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heartbeat_resets_the_window() {
        let ctx = ActivityContext::new(CancellationToken::new());
        let window = Duration::from_millis(80);

        let beater = ctx.clone();
        let keeper = tokio::spawn(async move {
            for _ in 0..4 {
                tokio::time::sleep(Duration::from_millis(30)).await;
                beater.heartbeat(50);
            }
        });

        // The window never elapses while beats keep arriving.
        let expired = tokio::time::timeout(Duration::from_millis(100), ctx.heartbeat_expired(window));
        assert!(expired.await.is_err());
        keeper.await.unwrap();
    }

    #[tokio::test]
    async fn test_window_expires_without_heartbeats() {
        let ctx = ActivityContext::new(CancellationToken::new());
        let expired = tokio::time::timeout(
            Duration::from_millis(200),
            ctx.heartbeat_expired(Duration::from_millis(50)),
        );
        assert!(expired.await.is_ok());
    }

    #[tokio::test]
    async fn test_cancellation_observed() {
        let token = CancellationToken::new();
        let ctx = ActivityContext::new(token.clone());
        assert!(!ctx.is_cancelled());

        token.cancel();
        assert!(ctx.is_cancelled());
        ctx.cancelled().await;
    }
}
