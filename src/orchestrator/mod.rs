//! Session Orchestrator: the component that ties the Vault, Router, Fee
//! Collector, Treasury Mover, and Launch Registry together into running
//! `volume`/`bot`/`activity` sessions, each spawned and registered before
//! any wallet task starts so status lookups see it immediately.

pub mod launch_registry;
pub mod loop_task;
pub mod preset;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::concurrency::SubmissionGate;
use crate::errors::{CoreError, CoreResult};
use crate::fee::{FeeCollector, NativeTransfer};
use crate::router::DexRouter;
use crate::treasury::{BalanceReader, TreasuryMover};
use crate::vault::wallet::WalletType;
use crate::vault::Vault;
use crate::venue::VaultSigner;

use launch_registry::LaunchRegistry;
use loop_task::{LoopContext, TokenBalanceReader};
use preset::Intensity;
use session::{LoopBounds, SessionHandle, SessionId, SessionKind, SessionRegistry, SessionStats};

/// Running bot sessions are capped so a single operator process can't spawn
/// an unbounded number of wallet loops.
pub const MAX_CONCURRENT_BOT_SESSIONS: usize = 6;

/// How long `stop_session` waits for every spawned wallet task to observe
/// the shutdown signal and exit before giving up and removing the session
/// from the registry anyway. Session removal happens only after this
/// bounded drain, never eagerly, so a task mid-swap isn't yanked out from
/// under a caller still polling `GetStatus`.
pub const STOP_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub enum StartSessionSpec {
    /// Repeated buy/sell pressure on `target` from a caller-supplied set of
    /// already-funded wallets.
    Volume {
        target: String,
        wallet_ids: Vec<String>,
        min_swap_native: Option<f64>,
        max_swap_native: Option<f64>,
        min_interval_ms: Option<u64>,
        max_interval_ms: Option<u64>,
        duration: Option<Duration>,
    },
    /// Generates `wallet_count` fresh wallets, funds each with
    /// `native_per_wallet` from `funding_source`, and runs them against the
    /// preset table for `intensity`.
    Bot {
        target: String,
        bot_name: String,
        wallet_count: u32,
        native_per_wallet: f64,
        funding_source: String,
        intensity: Intensity,
        duration: Option<Duration>,
        /// The vault is only ever held pre-unlocked here, so generating the
        /// bot's fresh wallets (a mutating operation) needs the password
        /// passed in fresh by the caller rather than cached from `unlock`.
        vault_password: String,
    },
    /// Organic-looking mixed swap/transfer traffic across a caller-supplied
    /// wallet set (empty means "every wallet currently in the vault"), per
    /// the preset table for `intensity`.
    Activity {
        target: String,
        wallet_ids: Vec<String>,
        intensity: Intensity,
        duration: Option<Duration>,
    },
}

#[derive(Debug, Clone)]
pub struct StartSessionResponse {
    pub session_id: SessionId,
    /// Non-empty only for `bot` sessions: wallets that failed to receive
    /// their initial funding are excluded from the session's active set but
    /// remain in the vault.
    pub funding_failures: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub id: SessionId,
    pub kind: SessionKind,
    pub target: String,
    pub bot_name: Option<String>,
    pub wallet_ids: Vec<String>,
    pub running: bool,
    pub stats: SessionStats,
}

pub struct Orchestrator {
    vault: Arc<tokio::sync::RwLock<Vault>>,
    router: Arc<DexRouter>,
    transfer: Arc<dyn NativeTransfer>,
    native_balances: Arc<dyn BalanceReader>,
    token_balances: Arc<dyn TokenBalanceReader>,
    fee_collector: Option<Arc<FeeCollector>>,
    treasury: TreasuryMover,
    launch_registry: Arc<LaunchRegistry>,
    registry: Arc<SessionRegistry>,
    gate: SubmissionGate,
    fee_account: Option<String>,
    fee_bps: u32,
    slippage_bps: u32,
    max_buy_native: f64,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vault: Arc<tokio::sync::RwLock<Vault>>,
        router: Arc<DexRouter>,
        transfer: Arc<dyn NativeTransfer>,
        native_balances: Arc<dyn BalanceReader>,
        token_balances: Arc<dyn TokenBalanceReader>,
        fee_collector: Option<Arc<FeeCollector>>,
        launch_registry: Arc<LaunchRegistry>,
        gate: SubmissionGate,
        fee_account: Option<String>,
        fee_bps: u32,
        slippage_bps: u32,
        max_buy_native: f64,
    ) -> Self {
        let treasury = TreasuryMover::new(Arc::clone(&transfer), Arc::clone(&native_balances), Arc::clone(&gate));
        Self {
            vault,
            router,
            transfer,
            native_balances,
            token_balances,
            fee_collector,
            treasury,
            launch_registry,
            registry: Arc::new(SessionRegistry::new()),
            gate,
            fee_account,
            fee_bps,
            slippage_bps,
            max_buy_native,
        }
    }

    /// One-shot manual buy, outside any session's trade loop. Rejects
    /// `amount_native > max_buy_native` before quoting at all — the only
    /// safety cap that applies to a single operator-initiated trade rather
    /// than a running session.
    pub async fn manual_buy(&self, wallet: &str, target: &str, amount_native: f64) -> CoreResult<crate::venue::types::SwapOutcome> {
        if amount_native > self.max_buy_native {
            return Err(CoreError::ConfigurationError(format!(
                "manual buy of {amount_native} exceeds max_buy_native {}",
                self.max_buy_native
            )));
        }

        let params = crate::venue::types::QuoteParams {
            input_mint: "SOL".to_string(),
            output_mint: target.to_string(),
            in_amount: loop_task::native_to_base_units(amount_native),
            slippage_bps: self.slippage_bps,
            side: crate::venue::types::Side::Buy,
        };
        self.execute_manual(wallet, &params).await
    }

    /// One-shot manual sell of `amount_native` worth (display units) of
    /// `target` held by `wallet`, outside any session's trade loop.
    pub async fn manual_sell(&self, wallet: &str, target: &str, amount_native: f64) -> CoreResult<crate::venue::types::SwapOutcome> {
        let params = crate::venue::types::QuoteParams {
            input_mint: target.to_string(),
            output_mint: "SOL".to_string(),
            in_amount: loop_task::native_to_base_units(amount_native),
            slippage_bps: self.slippage_bps,
            side: crate::venue::types::Side::Sell,
        };
        self.execute_manual(wallet, &params).await
    }

    async fn execute_manual(
        &self,
        wallet: &str,
        params: &crate::venue::types::QuoteParams,
    ) -> CoreResult<crate::venue::types::SwapOutcome> {
        let _permit = self.gate.acquire().await.expect("submission gate never closed");
        let vault = self.vault.read().await;
        let signer = VaultSigner::new(&vault, wallet.to_string())?;
        self.router.execute(&signer, params).await
    }

    pub fn launch_registry(&self) -> &LaunchRegistry {
        &self.launch_registry
    }

    fn loop_context(&self) -> Arc<LoopContext> {
        Arc::new(LoopContext {
            vault: Arc::clone(&self.vault),
            router: Arc::clone(&self.router),
            transfer: Arc::clone(&self.transfer),
            native_balances: Arc::clone(&self.native_balances),
            token_balances: Arc::clone(&self.token_balances),
            fee_collector: self.fee_collector.clone(),
            fee_account: self.fee_account.clone(),
            fee_bps: self.fee_bps,
            gate: Arc::clone(&self.gate),
            slippage_bps: self.slippage_bps,
        })
    }

    /// Validates kind-specific constraints, resolves the wallet set
    /// (generating and funding fresh wallets for `bot`), snapshots the loop
    /// bounds, and spawns one task per wallet. Registration in the
    /// [`SessionRegistry`] happens before any task is spawned, so
    /// `GetStatus`/`ListByKind` can observe the session immediately.
    pub async fn start_session(&self, spec: StartSessionSpec) -> CoreResult<StartSessionResponse> {
        match spec {
            StartSessionSpec::Volume {
                target,
                wallet_ids,
                min_swap_native,
                max_swap_native,
                min_interval_ms,
                max_interval_ms,
                duration,
            } => {
                if self.registry.running_count(SessionKind::Volume) > 0 {
                    return Err(CoreError::AlreadyRunning);
                }
                let bounds = LoopBounds {
                    min_swap_native: min_swap_native.unwrap_or(preset::VOLUME_DEFAULT_MIN_SWAP_NATIVE),
                    max_swap_native: max_swap_native.unwrap_or(preset::VOLUME_DEFAULT_MAX_SWAP_NATIVE),
                    min_interval_ms: min_interval_ms.unwrap_or(preset::VOLUME_DEFAULT_MIN_INTERVAL_MS),
                    max_interval_ms: max_interval_ms.unwrap_or(preset::VOLUME_DEFAULT_MAX_INTERVAL_MS),
                    transfer_chance: None,
                };
                let id = self
                    .spawn_session(SessionKind::Volume, target, wallet_ids, None, duration, bounds)
                    .await;
                Ok(StartSessionResponse {
                    session_id: id,
                    funding_failures: Vec::new(),
                })
            }

            StartSessionSpec::Activity {
                target,
                wallet_ids,
                intensity,
                duration,
            } => {
                if self.registry.running_count(SessionKind::Activity) > 0 {
                    return Err(CoreError::AlreadyRunning);
                }
                if let Some(d) = duration {
                    if d.as_secs() == 0 || d.as_secs() > 48 * 3600 {
                        return Err(CoreError::ConfigurationError(
                            "activity duration must be in (0h, 48h]".to_string(),
                        ));
                    }
                }
                let wallet_ids = {
                    let vault = self.vault.read().await;
                    if wallet_ids.is_empty() {
                        vault.list().into_iter().map(|(name, ..)| name).collect::<Vec<_>>()
                    } else {
                        for w in &wallet_ids {
                            vault.address_of(w)?;
                        }
                        wallet_ids
                    }
                };
                let p = preset::activity(intensity);
                let bounds = LoopBounds {
                    min_swap_native: p.min_swap_native,
                    max_swap_native: p.max_swap_native,
                    min_interval_ms: p.min_interval_ms,
                    max_interval_ms: p.max_interval_ms,
                    transfer_chance: Some(p.transfer_chance),
                };
                let id = self
                    .spawn_session(SessionKind::Activity, target, wallet_ids, None, duration, bounds)
                    .await;
                Ok(StartSessionResponse {
                    session_id: id,
                    funding_failures: Vec::new(),
                })
            }

            StartSessionSpec::Bot {
                target,
                bot_name,
                wallet_count,
                native_per_wallet,
                funding_source,
                intensity,
                duration,
                vault_password,
            } => {
                if self.registry.running_count(SessionKind::Bot) >= MAX_CONCURRENT_BOT_SESSIONS {
                    return Err(CoreError::GroupLimit);
                }
                if self.registry.running_bot_name_taken(&bot_name) {
                    return Err(CoreError::DuplicateName(bot_name));
                }

                let source_address = {
                    let vault = self.vault.read().await;
                    vault.address_of(&funding_source)?
                };
                let needed = wallet_count as f64
                    * (native_per_wallet + crate::treasury::DEFAULT_PER_TX_FEE_NATIVE)
                    + crate::treasury::DEFAULT_RENT_RESERVE_NATIVE;
                let available = self
                    .native_balances
                    .balance_native(&source_address)
                    .await
                    .map_err(|e| CoreError::ConfigurationError(format!("reading treasury balance: {e:#}")))?;
                if available < needed {
                    return Err(CoreError::InsufficientTreasury { needed, available });
                }

                let wallet_ids = {
                    let mut vault = self.vault.write().await;
                    vault.generate_batch(&bot_name, wallet_count, WalletType::Sniper, &vault_password)?;
                    vault
                        .list()
                        .into_iter()
                        .filter(|(name, ..)| name.starts_with(&format!("{bot_name}-")))
                        .map(|(name, ..)| name)
                        .collect::<Vec<_>>()
                };

                let funding_failures = {
                    let vault = self.vault.read().await;
                    let signer = VaultSigner::new(&vault, funding_source.clone())?;
                    let outcome = self
                        .treasury
                        .fund(
                            &signer,
                            &wallet_ids,
                            native_per_wallet,
                            crate::treasury::DEFAULT_RENT_RESERVE_NATIVE,
                            &self.launch_registry.protected_addresses(),
                        )
                        .await?;
                    outcome.failures
                };
                let failed_names: Vec<&String> = funding_failures.iter().map(|(n, _)| n).collect();
                let active_wallet_ids: Vec<String> = wallet_ids
                    .into_iter()
                    .filter(|w| !failed_names.contains(&w))
                    .collect();

                let p = preset::bot(intensity);
                let bounds = LoopBounds {
                    min_swap_native: p.min_swap_native,
                    max_swap_native: p.max_swap_native,
                    min_interval_ms: p.min_interval_ms,
                    max_interval_ms: p.max_interval_ms,
                    transfer_chance: None,
                };
                let id = self
                    .spawn_session(
                        SessionKind::Bot,
                        target,
                        active_wallet_ids,
                        Some(bot_name),
                        duration,
                        bounds,
                    )
                    .await;

                Ok(StartSessionResponse {
                    session_id: id,
                    funding_failures,
                })
            }
        }
    }

    async fn spawn_session(
        &self,
        kind: SessionKind,
        target: String,
        wallet_ids: Vec<String>,
        bot_name: Option<String>,
        duration: Option<Duration>,
        bounds: LoopBounds,
    ) -> SessionId {
        let id = SessionId::new_v4();
        let end_at = duration.map(|d| Utc::now() + chrono::Duration::from_std(d).unwrap_or_default());
        let handle = Arc::new(SessionHandle::new(
            id,
            kind,
            target,
            wallet_ids.clone(),
            bot_name,
            end_at,
            bounds,
        ));
        self.registry.insert(Arc::clone(&handle));

        let ctx = self.loop_context();
        let mut tasks = handle.tasks.lock().await;
        for wallet_id in wallet_ids {
            let ctx = Arc::clone(&ctx);
            let handle = Arc::clone(&handle);
            let shutdown_rx = handle.subscribe_shutdown();
            tasks.spawn(async move {
                loop_task::run(ctx, handle, wallet_id, shutdown_rx).await;
            });
        }
        drop(tasks);

        id
    }

    /// Signals every wallet task to stop, then waits (bounded by
    /// [`STOP_DRAIN_TIMEOUT`]) for them to actually finish before removing
    /// the session from the registry — a session that's merely "signaled"
    /// but still draining must stay visible to `GetStatus`. If `sell_held`
    /// is set, or the session is `activity` (always), best-effort sells
    /// every token the session actually traded back to native before
    /// removing it; every failure there is swallowed, counts reported only
    /// via the usual log line.
    pub async fn stop_session(&self, id: SessionId, sell_held: bool) -> CoreResult<SessionStatus> {
        let handle = self.registry.get(id).ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        handle.signal_shutdown();

        let mut tasks = handle.tasks.lock().await;
        let _ = tokio::time::timeout(STOP_DRAIN_TIMEOUT, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        drop(tasks);

        if sell_held || handle.kind == SessionKind::Activity {
            self.sell_held_tokens(&handle).await;
        }

        self.registry.remove(id);
        Ok(SessionStatus {
            id: handle.id,
            kind: handle.kind,
            target: handle.target.clone(),
            bot_name: handle.bot_name.clone(),
            wallet_ids: handle.wallet_ids.clone(),
            running: handle.is_running(),
            stats: handle.snapshot_stats(),
        })
    }

    /// Best-effort: for every (wallet, token) pair the session actually
    /// swapped into, sells the wallet's full remaining balance of that
    /// token back to native. Every failure is logged and swallowed —
    /// cleanup never blocks session removal.
    async fn sell_held_tokens(&self, handle: &SessionHandle) {
        for token in handle.tokens_traded() {
            for wallet_id in &handle.wallet_ids {
                let address = {
                    let vault = self.vault.read().await;
                    match vault.address_of(wallet_id) {
                        Ok(a) => a,
                        Err(e) => {
                            crate::logs::error(&format!("sell_held lookup for {wallet_id}: {e}"));
                            continue;
                        }
                    }
                };
                let held = match self.token_balances.token_balance(&address, &token).await {
                    Ok(b) if b > 0.0 => b,
                    _ => continue,
                };

                let params = crate::venue::types::QuoteParams {
                    input_mint: token.clone(),
                    output_mint: "SOL".to_string(),
                    in_amount: loop_task::native_to_base_units(held),
                    slippage_bps: self.slippage_bps,
                    side: crate::venue::types::Side::Sell,
                };
                match self.execute_manual(wallet_id, &params).await {
                    Ok(_) => {}
                    Err(e) => crate::logs::error(&format!("sell_held {wallet_id}/{token}: {e}")),
                }
            }
        }
    }

    pub fn get_status(&self, id: SessionId) -> CoreResult<SessionStatus> {
        let handle = self.registry.get(id).ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        Ok(SessionStatus {
            id: handle.id,
            kind: handle.kind,
            target: handle.target.clone(),
            bot_name: handle.bot_name.clone(),
            wallet_ids: handle.wallet_ids.clone(),
            running: handle.is_running(),
            stats: handle.snapshot_stats(),
        })
    }

    pub fn list_by_kind(&self, kind: SessionKind) -> Vec<SessionStatus> {
        self.registry
            .list_by_kind(kind)
            .into_iter()
            .map(|handle| SessionStatus {
                id: handle.id,
                kind: handle.kind,
                target: handle.target.clone(),
                bot_name: handle.bot_name.clone(),
                wallet_ids: handle.wallet_ids.clone(),
                running: handle.is_running(),
                stats: handle.snapshot_stats(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::NativeTransfer;
    use crate::venue::types::NativeTransferOutcome;
    use crate::venue::Signer;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct NoopTransfer;
    #[async_trait::async_trait]
    impl NativeTransfer for NoopTransfer {
        async fn transfer(&self, _signer: &dyn Signer, to: &str, amount_native: f64) -> anyhow::Result<NativeTransferOutcome> {
            Ok(NativeTransferOutcome {
                signature: format!("sig-{to}"),
                amount_native,
                confirmed: true,
            })
        }
    }

    struct FixedBalances(StdMutex<HashMap<String, f64>>);
    #[async_trait::async_trait]
    impl BalanceReader for FixedBalances {
        async fn balance_native(&self, address: &str) -> anyhow::Result<f64> {
            Ok(*self.0.lock().unwrap().get(address).unwrap_or(&0.0))
        }
    }

    struct ZeroTokenBalances;
    #[async_trait::async_trait]
    impl TokenBalanceReader for ZeroTokenBalances {
        async fn token_balance(&self, _owner: &str, _mint: &str) -> anyhow::Result<f64> {
            Ok(0.0)
        }
    }

    fn test_orchestrator(vault: Arc<tokio::sync::RwLock<Vault>>, treasury_balance: f64) -> Orchestrator {
        let router = Arc::new(DexRouter::new(Vec::new(), Default::default()));
        let mut balances = HashMap::new();
        balances.insert("treasury-addr".to_string(), treasury_balance);
        let launch_registry_path = std::env::temp_dir().join(format!(
            "trenchflow-orchestrator-test-{}.json",
            uuid::Uuid::new_v4()
        ));
        Orchestrator::new(
            vault,
            router,
            Arc::new(NoopTransfer),
            Arc::new(FixedBalances(StdMutex::new(balances))),
            Arc::new(ZeroTokenBalances),
            None,
            Arc::new(LaunchRegistry::open(launch_registry_path).unwrap()),
            crate::concurrency::new_submission_gate(),
            None,
            0,
            500,
            1.0,
        )
    }

    const TEST_PASSWORD: &str = "correct horse battery staple";

    async fn vault_with_treasury() -> Arc<tokio::sync::RwLock<Vault>> {
        let path = std::env::temp_dir().join(format!("trenchflow-orch-vault-{}.json", uuid::Uuid::new_v4()));
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap(TEST_PASSWORD).unwrap();
        vault.generate("treasury", WalletType::Treasury, TEST_PASSWORD).unwrap();
        Arc::new(tokio::sync::RwLock::new(vault))
    }

    #[tokio::test]
    async fn bot_session_rejects_insufficient_treasury_before_generating_wallets() {
        let vault = vault_with_treasury().await;
        let orchestrator = test_orchestrator(Arc::clone(&vault), 0.0);

        let result = orchestrator
            .start_session(StartSessionSpec::Bot {
                target: "MEME".to_string(),
                bot_name: "botA".to_string(),
                wallet_count: 3,
                native_per_wallet: 0.1,
                funding_source: "treasury".to_string(),
                intensity: Intensity::Low,
                duration: None,
                vault_password: TEST_PASSWORD.to_string(),
            })
            .await;

        assert!(matches!(result, Err(CoreError::InsufficientTreasury { .. })));
        let vault = vault.read().await;
        assert!(vault.list().iter().all(|(name, ..)| !name.starts_with("botA-")));
    }

    #[tokio::test]
    async fn bot_session_group_limit_and_duplicate_name_are_enforced() {
        let vault = vault_with_treasury().await;
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);

        let spec = || StartSessionSpec::Bot {
            target: "MEME".to_string(),
            bot_name: "botA".to_string(),
            wallet_count: 1,
            native_per_wallet: 0.01,
            funding_source: "treasury".to_string(),
            intensity: Intensity::Low,
            duration: None,
            vault_password: TEST_PASSWORD.to_string(),
        };

        let first = orchestrator.start_session(spec()).await.unwrap();
        let duplicate = orchestrator.start_session(spec()).await;
        assert!(matches!(duplicate, Err(CoreError::DuplicateName(_))));

        orchestrator.stop_session(first.session_id, false).await.unwrap();
    }

    #[tokio::test]
    async fn volume_session_rejects_duplicate_target() {
        let vault = vault_with_treasury().await;
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);
        {
            let mut v = vault.write().await;
            v.generate("w1", WalletType::Sniper, TEST_PASSWORD).unwrap();
        }

        let spec = StartSessionSpec::Volume {
            target: "MEME".to_string(),
            wallet_ids: vec!["w1".to_string()],
            min_swap_native: None,
            max_swap_native: None,
            min_interval_ms: Some(1),
            max_interval_ms: Some(2),
            duration: None,
        };

        let first = orchestrator.start_session(spec.clone()).await.unwrap();
        let second = orchestrator.start_session(spec).await;
        assert!(matches!(second, Err(CoreError::AlreadyRunning)));

        orchestrator.stop_session(first.session_id, false).await.unwrap();
    }

    /// A second volume session is rejected even against a different target —
    /// the cap is one running volume session per process, not one per target.
    #[tokio::test]
    async fn volume_session_rejects_second_target_while_one_is_running() {
        let vault = vault_with_treasury().await;
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);
        {
            let mut v = vault.write().await;
            v.generate("w1", WalletType::Sniper, TEST_PASSWORD).unwrap();
        }

        let first = orchestrator
            .start_session(StartSessionSpec::Volume {
                target: "MEME".to_string(),
                wallet_ids: vec!["w1".to_string()],
                min_swap_native: None,
                max_swap_native: None,
                min_interval_ms: Some(1),
                max_interval_ms: Some(2),
                duration: None,
            })
            .await
            .unwrap();

        let second = orchestrator
            .start_session(StartSessionSpec::Volume {
                target: "OTHER".to_string(),
                wallet_ids: vec!["w1".to_string()],
                min_swap_native: None,
                max_swap_native: None,
                min_interval_ms: Some(1),
                max_interval_ms: Some(2),
                duration: None,
            })
            .await;
        assert!(matches!(second, Err(CoreError::AlreadyRunning)));

        orchestrator.stop_session(first.session_id, false).await.unwrap();
    }

    #[tokio::test]
    async fn stop_session_removes_it_from_status_lookups() {
        let vault = vault_with_treasury().await;
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);
        {
            let mut v = vault.write().await;
            v.generate("w1", WalletType::Sniper, TEST_PASSWORD).unwrap();
        }

        let started = orchestrator
            .start_session(StartSessionSpec::Volume {
                target: "MEME".to_string(),
                wallet_ids: vec!["w1".to_string()],
                min_swap_native: None,
                max_swap_native: None,
                min_interval_ms: Some(1),
                max_interval_ms: Some(2),
                duration: None,
            })
            .await
            .unwrap();

        assert!(orchestrator.get_status(started.session_id).is_ok());
        orchestrator.stop_session(started.session_id, false).await.unwrap();
        assert!(matches!(
            orchestrator.get_status(started.session_id),
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn manual_buy_rejects_above_safety_cap_before_quoting() {
        let vault = vault_with_treasury().await;
        {
            let mut v = vault.write().await;
            v.generate("w1", WalletType::Sniper, TEST_PASSWORD).unwrap();
        }
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);

        let result = orchestrator.manual_buy("w1", "MEME", 2.0).await;
        assert!(matches!(result, Err(CoreError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn activity_session_defaults_to_every_vault_wallet() {
        let vault = vault_with_treasury().await;
        {
            let mut v = vault.write().await;
            v.generate("w1", WalletType::Sniper, TEST_PASSWORD).unwrap();
            v.generate("w2", WalletType::Sniper, TEST_PASSWORD).unwrap();
        }
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);

        let started = orchestrator
            .start_session(StartSessionSpec::Activity {
                target: "MEME".to_string(),
                wallet_ids: Vec::new(),
                intensity: Intensity::Low,
                duration: None,
            })
            .await
            .unwrap();

        let status = orchestrator.get_status(started.session_id).unwrap();
        assert_eq!(status.wallet_ids.len(), 3); // treasury + w1 + w2
        orchestrator.stop_session(started.session_id, false).await.unwrap();
    }

    #[tokio::test]
    async fn activity_session_rejects_unknown_wallet() {
        let vault = vault_with_treasury().await;
        let orchestrator = test_orchestrator(Arc::clone(&vault), 100.0);

        let result = orchestrator
            .start_session(StartSessionSpec::Activity {
                target: "MEME".to_string(),
                wallet_ids: vec!["ghost".to_string()],
                intensity: Intensity::Low,
                duration: None,
            })
            .await;

        assert!(matches!(result, Err(CoreError::UnknownWallet(_))));
    }
}
