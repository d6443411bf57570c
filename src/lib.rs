pub mod concurrency;
pub mod confirm;
pub mod config;
pub mod errors;
pub mod fee;
pub mod logs;
pub mod orchestrator;
pub mod router;
pub mod rpc;
pub mod treasury;
pub mod vault;
pub mod venue;

pub use errors::{CoreError, CoreErrorKind};
