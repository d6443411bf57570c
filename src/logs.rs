//! Timestamp-prefixed line formatting shared by the CLI and the orchestrator's
//! loops. The teacher carries no `tracing`/`log` dependency anywhere in its
//! graph — narration is plain `println!`/`eprintln!` with a hand-rolled
//! prefix convention (`"[HH:MM:SS] .."`, `"  ERROR .. : {:#}"`). This module
//! keeps that idiom instead of introducing a logging framework the corpus
//! doesn't use.

fn now_hms() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}

/// `[HH:MM:SS] message` to stdout.
pub fn info(message: &str) {
    println!("[{}] {}", now_hms(), message);
}

/// `  message` to stdout, for sub-steps of a just-logged operation.
pub fn step(message: &str) {
    println!("  {}", message);
}

/// `[HH:MM:SS] ERROR: message` to stderr. Used at points where an error is
/// swallowed rather than propagated (fee collection, per-iteration trade
/// failures, best-effort cleanup).
pub fn error(message: &str) {
    eprintln!("[{}] ERROR: {}", now_hms(), message);
}

/// Formats an [`anyhow::Error`] with its full context chain, the same
/// `{:#}` convention the teacher uses in `run/mod.rs`/`api/handlers/run.rs`.
pub fn error_chain(context: &str, err: &anyhow::Error) {
    eprintln!("[{}] ERROR: {context}: {err:#}", now_hms());
}
