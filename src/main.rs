use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::Rng;

mod cli;
mod concurrency;
mod confirm;
mod config;
mod errors;
mod fee;
mod logs;
mod orchestrator;
mod router;
mod rpc;
mod treasury;
mod vault;
mod venue;

use cli::{Command, SessionCommand, TreasuryCommand, VaultCommand};
use config::RuntimeConfig;
use orchestrator::preset::Intensity;
use orchestrator::session::SessionKind;
use orchestrator::{Orchestrator, StartSessionSpec};
use router::{DexRouter, RouterConfig};
use vault::Vault;
use venue::aggregator::AggregatorClient;
use venue::amm::AmmClient;
use venue::bonding_curve::BondingCurveClient;
use venue::types::VenueId;
use venue::{Signer, VaultSigner, VenueClient};

/// Resolves the vault password: `TRENCHFLOW_VAULT_PASSWORD` if set, else a
/// password sidecar file next to the vault, else (first run only) a freshly
/// generated high-entropy password persisted to that sidecar. The sidecar
/// is written with the same restrictive permissions as the vault blob
/// itself, so a first-time operator gets a working vault without ever
/// having to choose or type a password.
fn vault_password(cfg: &RuntimeConfig) -> Result<String> {
    if let Ok(pw) = std::env::var("TRENCHFLOW_VAULT_PASSWORD") {
        return Ok(pw);
    }

    let sidecar_path = vault_password_sidecar_path(cfg);
    if sidecar_path.is_file() {
        let pw = std::fs::read_to_string(&sidecar_path)
            .with_context(|| format!("reading {}", sidecar_path.display()))?;
        return Ok(pw.trim().to_string());
    }

    let generated = generate_vault_password();
    {
        let mut file = vault::store::open_restricted(&sidecar_path)
            .with_context(|| format!("creating {}", sidecar_path.display()))?;
        file.write_all(generated.as_bytes())
            .with_context(|| format!("writing {}", sidecar_path.display()))?;
    }
    eprintln!(
        "no TRENCHFLOW_VAULT_PASSWORD set; generated a new vault password and saved it to {} \
         — back this file up, losing it locks you out of the vault for good",
        sidecar_path.display()
    );
    Ok(generated)
}

fn vault_password_sidecar_path(cfg: &RuntimeConfig) -> std::path::PathBuf {
    cfg.vault_path.with_extension("password")
}

fn generate_vault_password() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    vault::crypto::encode_b64(&bytes)
}

fn launch_registry_path(cfg: &RuntimeConfig) -> std::path::PathBuf {
    cfg.vault_path
        .parent()
        .map(|p| p.join("launch_registry.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("launch_registry.json"))
}

fn build_router(cfg: &RuntimeConfig) -> Result<Arc<DexRouter>> {
    let base_url = cfg.require_rpc_url()?.to_string();
    let venues: Vec<Arc<dyn VenueClient>> = vec![
        Arc::new(BondingCurveClient::new(base_url.clone())),
        Arc::new(AmmClient::new(VenueId::AmmA, base_url.clone())),
        Arc::new(AmmClient::new(VenueId::AmmB, base_url.clone())),
        Arc::new(AggregatorClient::new(base_url)),
    ];
    Ok(Arc::new(DexRouter::new(venues, RouterConfig::default())))
}

fn build_orchestrator(cfg: &RuntimeConfig, vault: Arc<tokio::sync::RwLock<Vault>>) -> Result<Orchestrator> {
    let router = build_router(cfg)?;
    let rpc_client = Arc::new(rpc::RpcClient::new(cfg.require_rpc_url()?.to_string()));
    let fee_collector = cfg
        .fee
        .fee_account
        .as_ref()
        .filter(|_| cfg.fee.fee_bps > 0)
        .map(|_| Arc::new(fee::FeeCollector::new(rpc_client.clone() as Arc<dyn fee::NativeTransfer>)));
    let launch_registry = Arc::new(orchestrator::launch_registry::LaunchRegistry::open(launch_registry_path(cfg))?);

    Ok(Orchestrator::new(
        vault,
        router,
        rpc_client.clone() as Arc<dyn fee::NativeTransfer>,
        rpc_client.clone() as Arc<dyn treasury::BalanceReader>,
        rpc_client as Arc<dyn orchestrator::loop_task::TokenBalanceReader>,
        fee_collector,
        launch_registry,
        concurrency::new_submission_gate(),
        cfg.fee.fee_account.clone(),
        cfg.fee.fee_bps,
        cfg.slippage_bps,
        cfg.max_buy_native,
    ))
}

/// Installs the SIGINT handler: on the first Ctrl+C, stops every running
/// session (draining each, per `Orchestrator::stop_session`) before letting
/// the process exit. A second Ctrl+C while draining exits immediately,
/// for an operator who doesn't want to wait out the drain timeout.
fn install_sigint_handler(orchestrator: Arc<Orchestrator>, runtime: tokio::runtime::Handle) {
    let interrupted = Arc::new(std::sync::atomic::AtomicBool::new(false));
    ctrlc::set_handler(move || {
        use std::sync::atomic::Ordering;
        if interrupted.swap(true, Ordering::SeqCst) {
            logs::info("second interrupt received, exiting immediately");
            std::process::exit(130);
        }
        logs::info("stopping all running sessions...");
        let orchestrator = Arc::clone(&orchestrator);
        runtime.spawn(async move {
            for kind in [SessionKind::Volume, SessionKind::Bot, SessionKind::Activity] {
                for status in orchestrator.list_by_kind(kind) {
                    if status.running {
                        if let Err(e) = orchestrator.stop_session(status.id, false).await {
                            logs::error(&format!("stopping session {}: {e}", status.id));
                        }
                    }
                }
            }
            std::process::exit(0);
        });
    })
    .expect("failed to install SIGINT handler");
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = cli::Cli::parse();
    let mut cfg = RuntimeConfig::from_env()?;
    let http = reqwest::Client::new();
    cfg.apply_hosted_bootstrap(&http).await?;

    match cli.command {
        Command::Vault { command } => run_vault_command(&cfg, command).await,
        Command::Session { command } => run_session_command(&cfg, command).await,
        Command::Treasury { command } => run_treasury_command(&cfg, command).await,
    }
}

async fn run_vault_command(cfg: &RuntimeConfig, command: VaultCommand) -> Result<()> {
    let mut vault = Vault::open(&cfg.vault_path)?;
    let pw = vault_password(cfg)?;

    match command {
        VaultCommand::Bootstrap => {
            vault.bootstrap(&pw)?;
            logs::info(&format!("vault bootstrapped at {}", vault.path().display()));
        }
        VaultCommand::Unlock => {
            vault.unlock(&pw)?;
            logs::info("vault unlocked");
        }
        VaultCommand::Generate { name, wallet_type } => {
            vault.unlock(&pw)?;
            let address = vault.generate(&name, wallet_type.into(), &pw)?;
            logs::info(&format!("generated {name}: {address}"));
        }
        VaultCommand::GenerateBatch { prefix, count, wallet_type } => {
            vault.unlock(&pw)?;
            let addresses = vault.generate_batch(&prefix, count, wallet_type.into(), &pw)?;
            for (n, address) in addresses.iter().enumerate() {
                logs::step(&format!("{prefix}-{}: {address}", n + 1));
            }
        }
        VaultCommand::Import { name, secret_b64, wallet_type } => {
            vault.unlock(&pw)?;
            let secret = vault::crypto::decode_b64(&secret_b64).context("decoding secret_b64")?;
            let address = vault.import(&name, wallet_type.into(), secret, &pw)?;
            logs::info(&format!("imported {name}: {address}"));
        }
        VaultCommand::Remove { name } => {
            vault.unlock(&pw)?;
            let registry = orchestrator::launch_registry::LaunchRegistry::open(launch_registry_path(cfg))?;
            vault.remove(&name, &pw, &registry.protected_addresses())?;
            logs::info(&format!("removed {name}"));
        }
        VaultCommand::Rename { name, new_name } => {
            vault.unlock(&pw)?;
            vault.update(&name, &new_name, &pw)?;
            logs::info(&format!("renamed {name} -> {new_name}"));
        }
        VaultCommand::List => {
            vault.unlock(&pw)?;
            for (name, address, wallet_type) in vault.list() {
                logs::step(&format!("{name} [{wallet_type:?}] {address}"));
            }
        }
        VaultCommand::ExportBackup => {
            vault.unlock(&pw)?;
            let data = vault.export_backup(&pw)?;
            println!("{}", vault::crypto::encode_b64(&data));
        }
        VaultCommand::ImportBackup { path } => {
            let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            vault.import_backup(&data, &pw)?;
            logs::info("vault restored from backup");
        }
        VaultCommand::RegisterLaunch { wallet, mint, name, symbol } => {
            vault.unlock(&pw)?;
            let address = vault.address_of(&wallet)?;
            let registry = orchestrator::launch_registry::LaunchRegistry::open(launch_registry_path(cfg))?;
            registry.append(address, mint, name, symbol)?;
            logs::info(&format!("registered launch for {wallet}"));
        }
    }

    Ok(())
}

async fn run_session_command(cfg: &RuntimeConfig, command: SessionCommand) -> Result<()> {
    let pw = vault_password(cfg)?;
    let mut vault = Vault::open(&cfg.vault_path)?;
    vault.unlock(&pw)?;
    let vault = Arc::new(tokio::sync::RwLock::new(vault));
    let orchestrator = Arc::new(build_orchestrator(cfg, vault)?);

    match command {
        SessionCommand::StartVolume {
            target,
            wallets,
            min_swap_native,
            max_swap_native,
            min_interval_ms,
            max_interval_ms,
            duration_secs,
        } => {
            let response = orchestrator
                .start_session(StartSessionSpec::Volume {
                    target,
                    wallet_ids: wallets,
                    min_swap_native,
                    max_swap_native,
                    min_interval_ms,
                    max_interval_ms,
                    duration: duration_secs.map(std::time::Duration::from_secs),
                })
                .await?;
            logs::info(&format!("started volume session {}", response.session_id));
            wait_for_interrupt(orchestrator).await;
        }
        SessionCommand::StartBot {
            target,
            bot_name,
            wallet_count,
            native_per_wallet,
            funding_source,
            intensity,
            duration_secs,
        } => {
            let response = orchestrator
                .start_session(StartSessionSpec::Bot {
                    target,
                    bot_name,
                    wallet_count,
                    native_per_wallet,
                    funding_source,
                    intensity: Intensity::from(intensity),
                    duration: duration_secs.map(std::time::Duration::from_secs),
                    vault_password: pw.clone(),
                })
                .await?;
            logs::info(&format!("started bot session {}", response.session_id));
            for (name, reason) in &response.funding_failures {
                logs::error(&format!("funding failed for {name}: {reason}"));
            }
            wait_for_interrupt(orchestrator).await;
        }
        SessionCommand::StartActivity {
            target,
            wallets,
            intensity,
            duration_secs,
        } => {
            let response = orchestrator
                .start_session(StartSessionSpec::Activity {
                    target,
                    wallet_ids: wallets,
                    intensity: Intensity::from(intensity),
                    duration: duration_secs.map(std::time::Duration::from_secs),
                })
                .await?;
            logs::info(&format!("started activity session {}", response.session_id));
            wait_for_interrupt(orchestrator).await;
        }
        SessionCommand::ManualBuy {
            wallet,
            target,
            amount_native,
        } => {
            let outcome = orchestrator.manual_buy(&wallet, &target, amount_native).await?;
            logs::info(&format!(
                "manual buy via {} confirmed={} sig={}",
                outcome.venue, outcome.confirmed, outcome.signature
            ));
        }
        SessionCommand::ManualSell {
            wallet,
            target,
            amount_native,
        } => {
            let outcome = orchestrator.manual_sell(&wallet, &target, amount_native).await?;
            logs::info(&format!(
                "manual sell via {} confirmed={} sig={}",
                outcome.venue, outcome.confirmed, outcome.signature
            ));
        }
        SessionCommand::Stop { session_id, .. } => {
            bail!(
                "stop targets a session running in another process; this single-process CLI \
                 only manages sessions it started (id {session_id}) — use Ctrl+C on that process instead \
                 (Ctrl+C always stops via the same drain path as Stop)"
            );
        }
        SessionCommand::Status { session_id } => {
            let status = orchestrator.get_status(session_id)?;
            print_status(&status);
        }
        SessionCommand::List { kind } => {
            for status in orchestrator.list_by_kind(kind.into()) {
                print_status(&status);
            }
        }
    }

    Ok(())
}

fn print_status(status: &orchestrator::SessionStatus) {
    logs::info(&format!(
        "{} [{:?}] target={} running={} executed={} successful={} failed={} volume={:.4}",
        status.id,
        status.kind,
        status.target,
        status.running,
        status.stats.executed,
        status.stats.successful,
        status.stats.failed,
        status.stats.volume_native,
    ));
}

/// Blocks the session-owning command until Ctrl+C, at which point every
/// session this process started is stopped and drained.
async fn wait_for_interrupt(orchestrator: Arc<Orchestrator>) {
    install_sigint_handler(Arc::clone(&orchestrator), tokio::runtime::Handle::current());
    std::future::pending::<()>().await;
}

async fn run_treasury_command(cfg: &RuntimeConfig, command: TreasuryCommand) -> Result<()> {
    let mut vault = Vault::open(&cfg.vault_path)?;
    vault.unlock(&vault_password(cfg)?)?;

    let rpc_client = Arc::new(rpc::RpcClient::new(cfg.require_rpc_url()?.to_string()));
    let mover = treasury::TreasuryMover::new(
        rpc_client.clone() as Arc<dyn fee::NativeTransfer>,
        rpc_client as Arc<dyn treasury::BalanceReader>,
        concurrency::new_submission_gate(),
    );
    let registry = orchestrator::launch_registry::LaunchRegistry::open(launch_registry_path(cfg))?;
    let protected = registry.protected_addresses();

    match command {
        TreasuryCommand::Fund {
            source,
            targets,
            per_target_native,
            rent_reserve_native,
        } => {
            let signer = VaultSigner::new(&vault, source)?;
            let outcome = mover
                .fund(&signer, &targets, per_target_native, rent_reserve_native, &protected)
                .await?;
            logs::info(&format!("funded {} wallets", outcome.funded_count));
            for (name, reason) in &outcome.failures {
                logs::error(&format!("funding {name}: {reason}"));
            }
        }
        TreasuryCommand::Sweep {
            to,
            sources,
            keep_reserve_native,
        } => {
            let mut signers = Vec::new();
            for name in &sources {
                signers.push((vault.address_of(name)?, VaultSigner::new(&vault, name.clone())?));
            }
            let borrowed: Vec<(String, &dyn Signer)> =
                signers.iter().map(|(addr, s)| (addr.clone(), s as &dyn Signer)).collect();
            let outcome = mover.sweep(&borrowed, &to, keep_reserve_native, &protected).await?;
            logs::info(&format!("swept {:.6} native total", outcome.swept_total_native));
            for (name, reason) in &outcome.failures {
                logs::error(&format!("sweeping {name}: {reason}"));
            }
        }
    }

    Ok(())
}
