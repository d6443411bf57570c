//! The per-wallet trade loop spawned once per wallet in a session: sleep a
//! jittered interval, recheck the shared running flag, act, record, repeat.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::broadcast;

use crate::concurrency::SubmissionGate;
use crate::fee::{FeeCollector, NativeTransfer};
use crate::logs;
use crate::router::DexRouter;
use crate::treasury::{BalanceReader, DEFAULT_PER_TX_FEE_NATIVE, DEFAULT_RENT_RESERVE_NATIVE};
use crate::vault::Vault;
use crate::venue::types::{QuoteParams, Side};
use crate::venue::VaultSigner;

use super::session::{SessionHandle, SessionKind};

/// Reads a wallet's balance of an arbitrary SPL-style token, in display
/// units. A thin complement to [`BalanceReader`] (native-only) — the trade
/// loop needs both to decide buy vs. sell.
#[async_trait::async_trait]
pub trait TokenBalanceReader: Send + Sync {
    async fn token_balance(&self, owner: &str, mint: &str) -> anyhow::Result<f64>;
}

/// Everything a wallet loop needs, shared read-only across every spawned
/// task in a session.
pub struct LoopContext {
    pub vault: Arc<tokio::sync::RwLock<Vault>>,
    pub router: Arc<DexRouter>,
    pub transfer: Arc<dyn NativeTransfer>,
    pub native_balances: Arc<dyn BalanceReader>,
    pub token_balances: Arc<dyn TokenBalanceReader>,
    pub fee_collector: Option<Arc<FeeCollector>>,
    pub fee_account: Option<String>,
    pub fee_bps: u32,
    pub gate: SubmissionGate,
    pub slippage_bps: u32,
}

/// Candidate organic tokens an `activity` session rotates through when it
/// decides to swap rather than transfer. Distinct from the session's own
/// `target` so activity traffic doesn't exclusively touch the launched
/// token.
const ORGANIC_TOKENS: &[&str] = &["SOL", "BONK", "WIF"];

/// Runs until the session is stopped (`running` flips false), a shutdown
/// signal arrives, or (when the session carries an `end_at`) the deadline
/// passes. Each iteration:
///
/// 1. sleeps a random jittered interval within the session's bounds
/// 2. rechecks the running flag / shutdown signal before acting
/// 3. decides buy, sell, or (activity only) transfer
/// 4. pre-checks the wallet has enough native balance to cover the attempt
/// 5. requests a quote and validates it through the Router
/// 6. submits the swap under the shared submission gate
/// 7. records the iteration's outcome on the session's stats
/// 8. best-effort fee collection on a successful buy/sell
/// 9. loops back to (1)
///
/// Every error from a failed iteration is folded into the `failed` counter
/// rather than propagated — a single bad quote or RPC hiccup must never
/// take down the whole session.
pub async fn run(
    ctx: Arc<LoopContext>,
    handle: Arc<SessionHandle>,
    wallet_id: String,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        if !handle.is_running() {
            return;
        }
        if let Some(end_at) = handle.end_at {
            if chrono::Utc::now() >= end_at {
                handle.signal_shutdown();
                return;
            }
        }

        let sleep_ms = jittered_interval_ms(handle.bounds.min_interval_ms, handle.bounds.max_interval_ms);
        tokio::select! {
            _ = tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)) => {}
            _ = shutdown_rx.recv() => return,
        }

        if !handle.is_running() {
            return;
        }

        run_one_iteration(&ctx, &handle, &wallet_id).await;
    }
}

fn jittered_interval_ms(min_ms: u64, max_ms: u64) -> u64 {
    if min_ms >= max_ms {
        return min_ms;
    }
    rand::rng().random_range(min_ms..=max_ms)
}

fn jittered_amount_native(min_native: f64, max_native: f64) -> f64 {
    if min_native >= max_native {
        return min_native;
    }
    rand::rng().random_range(min_native..max_native)
}

async fn run_one_iteration(ctx: &Arc<LoopContext>, handle: &Arc<SessionHandle>, wallet_id: &str) {
    if let Some(chance) = handle.bounds.transfer_chance {
        if rand::rng().random_bool(chance) {
            run_transfer(ctx, handle, wallet_id).await;
            return;
        }
    }
    run_swap(ctx, handle, wallet_id).await;
}

/// Activity-only: a small native transfer to another session wallet, purely
/// for on-chain movement — it doesn't touch the target token at all, so it
/// is counted toward `executed`/`successful` but never `volume_native`.
async fn run_transfer(ctx: &Arc<LoopContext>, handle: &Arc<SessionHandle>, wallet_id: &str) {
    let Some(to_id) = handle.wallet_ids.iter().find(|w| *w != wallet_id) else {
        return;
    };

    let (from_address, to_address) = {
        let vault = ctx.vault.read().await;
        let from = vault.address_of(wallet_id);
        let to = vault.address_of(to_id);
        match (from, to) {
            (Ok(f), Ok(t)) => (f, t),
            (Err(e), _) | (_, Err(e)) => {
                logs::error(&format!("activity transfer lookup for {wallet_id}: {e}"));
                handle.record_iteration(false, 0.0);
                return;
            }
        }
    };

    let amount = jittered_amount_native(handle.bounds.min_swap_native, handle.bounds.max_swap_native);
    let balance = match ctx.native_balances.balance_native(&from_address).await {
        Ok(b) => b,
        Err(e) => {
            logs::error(&format!("reading balance for {wallet_id}: {e:#}"));
            handle.record_iteration(false, 0.0);
            return;
        }
    };
    if balance <= amount + DEFAULT_RENT_RESERVE_NATIVE + DEFAULT_PER_TX_FEE_NATIVE {
        handle.record_iteration(false, 0.0);
        return;
    }

    let _permit = ctx.gate.acquire().await.expect("submission gate never closed");
    let vault = ctx.vault.read().await;
    let signer = match VaultSigner::new(&vault, wallet_id.to_string()) {
        Ok(s) => s,
        Err(e) => {
            logs::error(&format!("building signer for {wallet_id}: {e}"));
            handle.record_iteration(false, 0.0);
            return;
        }
    };

    match ctx.transfer.transfer(&signer, &to_address, amount).await {
        Ok(_) => handle.record_iteration(true, 0.0),
        Err(e) => {
            logs::error(&format!("{wallet_id} activity transfer failed: {e:#}"));
            handle.record_iteration(false, 0.0);
        }
    }
}

async fn run_swap(ctx: &Arc<LoopContext>, handle: &Arc<SessionHandle>, wallet_id: &str) {
    let address = {
        let vault = ctx.vault.read().await;
        match vault.address_of(wallet_id) {
            Ok(a) => a,
            Err(e) => {
                logs::error(&format!("wallet lookup for {wallet_id}: {e}"));
                handle.record_iteration(false, 0.0);
                return;
            }
        }
    };

    let token = pick_token(handle);

    let held = ctx.token_balances.token_balance(&address, &token).await.unwrap_or(0.0);
    let side = if held > 0.0 && rand::rng().random_bool(0.5) {
        Side::Sell
    } else {
        Side::Buy
    };

    let amount_native = jittered_amount_native(handle.bounds.min_swap_native, handle.bounds.max_swap_native);

    if side == Side::Buy {
        match ctx.native_balances.balance_native(&address).await {
            Ok(balance)
                if balance >= amount_native + DEFAULT_RENT_RESERVE_NATIVE + DEFAULT_PER_TX_FEE_NATIVE => {}
            _ => {
                handle.record_iteration(false, 0.0);
                return;
            }
        }
    }

    let params = match side {
        Side::Buy => QuoteParams {
            input_mint: "SOL".to_string(),
            output_mint: token.clone(),
            in_amount: native_to_base_units(amount_native),
            slippage_bps: ctx.slippage_bps,
            side,
        },
        Side::Sell => QuoteParams {
            input_mint: token.clone(),
            output_mint: "SOL".to_string(),
            in_amount: native_to_base_units(held),
            slippage_bps: ctx.slippage_bps,
            side,
        },
    };

    let result = {
        let _permit = ctx.gate.acquire().await.expect("submission gate never closed");
        let vault = ctx.vault.read().await;
        let signer = match VaultSigner::new(&vault, wallet_id.to_string()) {
            Ok(s) => s,
            Err(e) => {
                logs::error(&format!("building signer for {wallet_id}: {e}"));
                handle.record_iteration(false, 0.0);
                return;
            }
        };
        ctx.router.execute_with_quote(&signer, &params).await
    };

    match result {
        Ok((quote, outcome)) => {
            handle.record_token_traded(&token);

            // A sell's notional is the native actually received, not the
            // buy-side jitter amount; fall back to the quoted amount when the
            // venue doesn't report an actual fill.
            let notional_native = match side {
                Side::Buy => amount_native,
                Side::Sell => outcome
                    .out_amount_actual
                    .unwrap_or(quote.out_amount as f64 / 1_000_000_000.0),
            };
            handle.record_iteration(true, notional_native);

            if let (Some(collector), Some(fee_account)) = (&ctx.fee_collector, &ctx.fee_account) {
                let vault = ctx.vault.read().await;
                if let Ok(signer) = VaultSigner::new(&vault, wallet_id.to_string()) {
                    collector
                        .collect(&signer, notional_native, fee_account, ctx.fee_bps)
                        .await;
                }
            }

            logs::step(&format!(
                "{wallet_id}: {side:?} {token} via {} (sig {})",
                outcome.venue, outcome.signature
            ));
        }
        Err(e) => {
            logs::error(&format!("{wallet_id} trade failed: {e}"));
            handle.record_iteration(false, 0.0);
        }
    }
}

fn pick_token(handle: &SessionHandle) -> String {
    if handle.kind == SessionKind::Activity {
        // Activity sessions bias toward the launched token but still rotate
        // through organic pairs so on-chain activity isn't exclusively
        // concentrated on one mint.
        if rand::rng().random_bool(0.6) {
            handle.target.clone()
        } else {
            let idx = rand::rng().random_range(0..ORGANIC_TOKENS.len());
            ORGANIC_TOKENS[idx].to_string()
        }
    } else {
        handle.target.clone()
    }
}

pub(crate) fn native_to_base_units(amount_native: f64) -> u64 {
    (amount_native * 1_000_000_000.0).round() as u64
}
