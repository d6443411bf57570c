//! Typed confirmation polling, replacing the "ad-hoc polling loop" pattern
//! flagged in the design notes with a single reusable helper used by every
//! venue client, the treasury mover, and the fee collector.

use std::time::Duration;

/// Outcome of polling an on-chain submission for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed,
    Rejected(String),
    Timeout,
}

/// A single poll attempt's result.
pub enum PollStep {
    /// Still pending — keep polling.
    Pending,
    /// Terminal success.
    Confirmed,
    /// Terminal, final on-chain rejection.
    Rejected(String),
}

/// Poll `check` at a fixed cadence for a bounded number of attempts.
///
/// `check` is async so it can make a network call per attempt (e.g. "get
/// transaction status"). Returns as soon as `check` reports a terminal
/// result; otherwise [`PollOutcome::Timeout`] once `attempts` is exhausted.
pub async fn poll_until<F, Fut>(mut check: F, cadence: Duration, attempts: u32) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = PollStep>,
{
    for _ in 0..attempts {
        match check().await {
            PollStep::Confirmed => return PollOutcome::Confirmed,
            PollStep::Rejected(reason) => return PollOutcome::Rejected(reason),
            PollStep::Pending => {
                tokio::time::sleep(cadence).await;
            }
        }
    }
    PollOutcome::Timeout
}

/// Default poll schedule used by venue clients and the treasury mover unless
/// a caller overrides it.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(2_500);
pub const DEFAULT_ATTEMPTS: u32 = 10;
