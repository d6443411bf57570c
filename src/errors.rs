//! The closed error taxonomy shared by every core component.
//!
//! Trade loops match on [`CoreError`] and fold every variant into a `failed`
//! counter increment (see `orchestrator::loop_task`); one-shot callers (manual
//! buy/sell, fund, sweep, stop, unlock) propagate it to the surface, which
//! renders `kind()` plus the message and never a stack trace.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreErrorKind {
    ConfigurationError,
    Locked,
    InvalidPassword,
    CorruptVault,
    UnknownWallet,
    WalletExists,
    ProtectedWallet,
    InsufficientFunds,
    InsufficientTreasury,
    NoRoute,
    StaleQuote,
    ExcessivePriceImpact,
    SubmissionFailed,
    OnChainReject,
    NotConfirmed,
    AlreadyRunning,
    GroupLimit,
    DuplicateName,
    NotFound,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("vault is locked")]
    Locked,

    #[error("invalid vault password")]
    InvalidPassword,

    #[error("vault blob is corrupt: {0}")]
    CorruptVault(String),

    #[error("unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("wallet already exists: {0}")]
    WalletExists(String),

    #[error("wallet {0} is protected by a launch record")]
    ProtectedWallet(String),

    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("insufficient treasury balance: needed {needed}, available {available}")]
    InsufficientTreasury { needed: f64, available: f64 },

    #[error("no route available for {0}")]
    NoRoute(String),

    #[error("quote is stale (age {age_ms}ms > max {max_ms}ms)")]
    StaleQuote { age_ms: i64, max_ms: i64 },

    #[error("price impact {actual_pct:.2}% exceeds max {max_pct:.2}%")]
    ExcessivePriceImpact { actual_pct: f64, max_pct: f64 },

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    #[error("on-chain rejection: {0}")]
    OnChainReject(String),

    #[error("not confirmed after polling (signature {signature})")]
    NotConfirmed { signature: String },

    #[error("a session of this kind is already running")]
    AlreadyRunning,

    #[error("running bot session group limit reached")]
    GroupLimit,

    #[error("a running bot session is already named {0}")]
    DuplicateName(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn kind(&self) -> CoreErrorKind {
        match self {
            CoreError::ConfigurationError(_) => CoreErrorKind::ConfigurationError,
            CoreError::Locked => CoreErrorKind::Locked,
            CoreError::InvalidPassword => CoreErrorKind::InvalidPassword,
            CoreError::CorruptVault(_) => CoreErrorKind::CorruptVault,
            CoreError::UnknownWallet(_) => CoreErrorKind::UnknownWallet,
            CoreError::WalletExists(_) => CoreErrorKind::WalletExists,
            CoreError::ProtectedWallet(_) => CoreErrorKind::ProtectedWallet,
            CoreError::InsufficientFunds { .. } => CoreErrorKind::InsufficientFunds,
            CoreError::InsufficientTreasury { .. } => CoreErrorKind::InsufficientTreasury,
            CoreError::NoRoute(_) => CoreErrorKind::NoRoute,
            CoreError::StaleQuote { .. } => CoreErrorKind::StaleQuote,
            CoreError::ExcessivePriceImpact { .. } => CoreErrorKind::ExcessivePriceImpact,
            CoreError::SubmissionFailed(_) => CoreErrorKind::SubmissionFailed,
            CoreError::OnChainReject(_) => CoreErrorKind::OnChainReject,
            CoreError::NotConfirmed { .. } => CoreErrorKind::NotConfirmed,
            CoreError::AlreadyRunning => CoreErrorKind::AlreadyRunning,
            CoreError::GroupLimit => CoreErrorKind::GroupLimit,
            CoreError::DuplicateName(_) => CoreErrorKind::DuplicateName,
            CoreError::NotFound(_) => CoreErrorKind::NotFound,
        }
    }

    /// Short human-readable message with no stack trace, for surface rendering.
    pub fn short_message(&self) -> String {
        self.to_string()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
