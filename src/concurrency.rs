//! Process-wide swap-submission concurrency cap: a single
//! `tokio::sync::Semaphore` shared by every per-wallet trade loop and the
//! Treasury Mover, so a large `fund`/`sweep` call can't starve concurrently
//! running sessions' RPC calls (§5).

use std::sync::Arc;

use tokio::sync::Semaphore;

pub const DEFAULT_SUBMISSION_CAP: usize = 8;

pub type SubmissionGate = Arc<Semaphore>;

pub fn new_submission_gate() -> SubmissionGate {
    Arc::new(Semaphore::new(DEFAULT_SUBMISSION_CAP))
}
