use clap::{Parser, Subcommand};

use crate::orchestrator::preset::Intensity;
use crate::vault::wallet::WalletType;

/// trenchflow — a single-operator control plane for memecoin wallet vaults,
/// DEX routing, and scripted trading sessions.
#[derive(Parser)]
#[command(name = "trenchflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Wallet vault operations: bootstrap, unlock, generate, import, remove.
    Vault {
        #[command(subcommand)]
        command: VaultCommand,
    },
    /// Start, stop, and inspect trading sessions.
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Fund wallets from a treasury source, or sweep balances back.
    Treasury {
        #[command(subcommand)]
        command: TreasuryCommand,
    },
}

#[derive(Subcommand)]
pub enum VaultCommand {
    /// Create a new vault at the configured path under a fresh password.
    Bootstrap,
    /// Unlock the vault for the remainder of this process's lifetime.
    Unlock,
    /// Generate a single new wallet.
    Generate {
        name: String,
        #[arg(long, value_enum, default_value = "sniper")]
        wallet_type: WalletTypeArg,
    },
    /// Generate `count` wallets named `"{prefix}-{n}"`.
    GenerateBatch {
        prefix: String,
        count: u32,
        #[arg(long, value_enum, default_value = "sniper")]
        wallet_type: WalletTypeArg,
    },
    /// Import an externally-supplied base64-encoded secret key.
    Import {
        name: String,
        secret_b64: String,
        #[arg(long, value_enum, default_value = "sniper")]
        wallet_type: WalletTypeArg,
    },
    /// Remove a wallet by name; refuses wallets protected by a launch record.
    Remove { name: String },
    /// Rename a wallet in place.
    Rename { name: String, new_name: String },
    /// List every wallet's name, address, and type.
    List,
    /// Write the raw vault blob to stdout (base64) for an operator backup.
    ExportBackup,
    /// Restore a vault from a previously exported backup file.
    ImportBackup { path: std::path::PathBuf },
    /// Record that `wallet` deployed `mint`, protecting it from removal.
    RegisterLaunch {
        wallet: String,
        mint: String,
        name: String,
        symbol: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum WalletTypeArg {
    Sniper,
    Treasury,
    Burner,
}

impl From<WalletTypeArg> for WalletType {
    fn from(value: WalletTypeArg) -> Self {
        match value {
            WalletTypeArg::Sniper => WalletType::Sniper,
            WalletTypeArg::Treasury => WalletType::Treasury,
            WalletTypeArg::Burner => WalletType::Burner,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum IntensityArg {
    Low,
    Medium,
    High,
}

impl From<IntensityArg> for Intensity {
    fn from(value: IntensityArg) -> Self {
        match value {
            IntensityArg::Low => Intensity::Low,
            IntensityArg::Medium => Intensity::Medium,
            IntensityArg::High => Intensity::High,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Repeated buy/sell pressure on `target` from a caller-supplied wallet set.
    StartVolume {
        target: String,
        #[arg(long, value_delimiter = ',')]
        wallets: Vec<String>,
        #[arg(long)]
        min_swap_native: Option<f64>,
        #[arg(long)]
        max_swap_native: Option<f64>,
        #[arg(long)]
        min_interval_ms: Option<u64>,
        #[arg(long)]
        max_interval_ms: Option<u64>,
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Generate and fund fresh wallets, then run them against a preset.
    StartBot {
        target: String,
        bot_name: String,
        #[arg(long)]
        wallet_count: u32,
        #[arg(long)]
        native_per_wallet: f64,
        #[arg(long)]
        funding_source: String,
        #[arg(long, value_enum, default_value = "medium")]
        intensity: IntensityArg,
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Mixed organic-looking swap/transfer traffic across a wallet set.
    StartActivity {
        target: String,
        #[arg(long, value_delimiter = ',')]
        wallets: Vec<String>,
        #[arg(long, value_enum, default_value = "medium")]
        intensity: IntensityArg,
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// One-shot buy outside any session; rejected if it exceeds the
    /// configured per-trade safety cap.
    ManualBuy {
        wallet: String,
        target: String,
        amount_native: f64,
    },
    /// One-shot sell outside any session.
    ManualSell {
        wallet: String,
        target: String,
        amount_native: f64,
    },
    /// Signal a running session to stop and wait for it to drain.
    Stop {
        session_id: uuid::Uuid,
        /// Best-effort sell every token this session traded back to native
        /// before removing it. Always attempted for `activity` sessions.
        #[arg(long)]
        sell_held: bool,
    },
    /// Print a single session's current stats.
    Status { session_id: uuid::Uuid },
    /// List every session of a given kind.
    List {
        #[arg(long, value_enum)]
        kind: SessionKindArg,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum SessionKindArg {
    Volume,
    Bot,
    Activity,
}

impl From<SessionKindArg> for crate::orchestrator::session::SessionKind {
    fn from(value: SessionKindArg) -> Self {
        match value {
            SessionKindArg::Volume => crate::orchestrator::session::SessionKind::Volume,
            SessionKindArg::Bot => crate::orchestrator::session::SessionKind::Bot,
            SessionKindArg::Activity => crate::orchestrator::session::SessionKind::Activity,
        }
    }
}

#[derive(Subcommand)]
pub enum TreasuryCommand {
    /// Fund each of `targets` with `per_target_native` from `source`.
    Fund {
        source: String,
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,
        #[arg(long)]
        per_target_native: f64,
        #[arg(long, default_value = "0.002039")]
        rent_reserve_native: f64,
    },
    /// Sweep each of `sources`' balance (minus reserve) into `to`.
    Sweep {
        to: String,
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
        #[arg(long, default_value = "0.002039")]
        keep_reserve_native: f64,
    },
}
