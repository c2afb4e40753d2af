//! # Cancellable periodic waits.
//!
//! Every monitor loop is a `cycle → wait` repetition where the wait must
//! also observe the runtime cancellation token, so shutdown never sits out a
//! full interval. [`Ticker`] packages that select; [`sleep_cancellable`] is
//! the one-shot form used inside retry backoff and the restart workflow's
//! settle step.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

/// Periodic wait bound to a cancellation token.
pub struct Ticker {
    period: Duration,
    ctx: CancellationToken,
}

impl Ticker {
    /// Creates a ticker firing every `period` until `ctx` is cancelled.
    pub fn new(period: Duration, ctx: CancellationToken) -> Self {
        Self { period, ctx }
    }

    /// Waits one period. Returns `true` when the period elapsed and `false`
    /// when the token was cancelled first.
    pub async fn tick(&self) -> bool {
        sleep_cancellable(&self.ctx, self.period).await
    }
}

/// Sleeps for `dur`, aborting early on cancellation.
///
/// Returns `true` when the full duration elapsed, `false` on cancellation.
pub async fn sleep_cancellable(ctx: &CancellationToken, dur: Duration) -> bool {
    tokio::select! {
        _ = ctx.cancelled() => false,
        _ = time::sleep(dur) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tick_elapses_period() {
        let ticker = Ticker::new(Duration::from_secs(10), CancellationToken::new());
        assert!(ticker.tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_tick() {
        let ctx = CancellationToken::new();
        let ticker = Ticker::new(Duration::from_secs(3600), ctx.clone());

        let wait = tokio::spawn(async move { ticker.tick().await });
        tokio::task::yield_now().await;
        ctx.cancel();
        assert!(!wait.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_returns_immediately() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        assert!(!sleep_cancellable(&ctx, Duration::from_secs(3600)).await);
    }
}
