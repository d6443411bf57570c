//! Treasury Mover: funds N wallets from a source and sweeps balances back,
//! both gated by the process-wide swap-submission semaphore shared with the
//! Venue Clients.

use std::sync::Arc;

use anyhow::Result;

use crate::concurrency::SubmissionGate;
use crate::errors::CoreError;
use crate::fee::NativeTransfer;
use crate::logs;
use crate::venue::Signer;
use crate::venue::types::NativeTransferOutcome;

/// Estimated fee for a single native transfer, in native units. A parameter
/// of the deployment, not a protocol constant — kept as a named default
/// here since reproducing a specific chain's fee schedule is out of scope.
pub const DEFAULT_PER_TX_FEE_NATIVE: f64 = 0.000_005;
/// Minimum balance a wallet must retain to stay rent-exempt / above the
/// chain's dust floor.
pub const DEFAULT_RENT_RESERVE_NATIVE: f64 = 0.002_039;

/// Reads a wallet's current native-token balance. Implemented by whichever
/// RPC adapter the process wires up.
#[async_trait::async_trait]
pub trait BalanceReader: Send + Sync {
    async fn balance_native(&self, address: &str) -> Result<f64>;
}

#[derive(Debug, Clone)]
pub struct FundOutcome {
    pub funded_count: u32,
    pub failures: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub swept_total_native: f64,
    pub failures: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct TreasuryMover {
    transfer: Arc<dyn NativeTransfer>,
    balances: Arc<dyn BalanceReader>,
    gate: SubmissionGate,
    per_tx_fee_native: f64,
}

impl TreasuryMover {
    pub fn new(
        transfer: Arc<dyn NativeTransfer>,
        balances: Arc<dyn BalanceReader>,
        gate: SubmissionGate,
    ) -> Self {
        Self {
            transfer,
            balances,
            gate,
            per_tx_fee_native: DEFAULT_PER_TX_FEE_NATIVE,
        }
    }

    /// Pre-checks the source balance against the full cost of funding every
    /// target before submitting anything; on failure returns
    /// `InsufficientFunds` without touching the chain. Continues past
    /// per-target failures, reporting each individually. Any target in
    /// `protected_addresses` (wallets that created a token, per the launch
    /// registry) is reported as a failure rather than funded, matching the
    /// same protection the Vault enforces on `remove`.
    pub async fn fund(
        &self,
        source: &dyn Signer,
        targets: &[String],
        per_target_native: f64,
        rent_reserve_native: f64,
        protected_addresses: &[String],
    ) -> Result<FundOutcome, CoreError> {
        let needed = targets.len() as f64 * (per_target_native + self.per_tx_fee_native)
            + rent_reserve_native;
        let available = self
            .balances
            .balance_native(source.address())
            .await
            .map_err(|e| CoreError::ConfigurationError(format!("reading source balance: {e:#}")))?;

        if available < needed {
            return Err(CoreError::InsufficientFunds { needed, available });
        }

        let mut funded_count = 0u32;
        let mut failures = Vec::new();

        for target in targets {
            if protected_addresses.iter().any(|a| a == target) {
                failures.push((target.clone(), "target is a protected wallet, skipped".to_string()));
                continue;
            }
            let _permit = self.gate.acquire().await.expect("submission gate never closed");
            match self.transfer.transfer(source, target, per_target_native).await {
                Ok(_) => funded_count += 1,
                Err(e) => {
                    logs::error_chain(&format!("funding {target}"), &e);
                    failures.push((target.clone(), e.to_string()));
                }
            }
        }

        Ok(FundOutcome {
            funded_count,
            failures,
        })
    }

    /// For each source, sends `balance - keep_reserve - per_tx_fee` to `to`,
    /// skipping (with a reported reason, not an error) any source whose
    /// computed send amount is `<= 0`, that equals `to`, or that appears in
    /// `protected_addresses`.
    pub async fn sweep(
        &self,
        sources: &[(String, &dyn Signer)],
        to: &str,
        keep_reserve_native: f64,
        protected_addresses: &[String],
    ) -> Result<SweepOutcome, CoreError> {
        let mut swept_total_native = 0.0;
        let mut failures = Vec::new();

        for (address, signer) in sources {
            if address == to {
                failures.push((address.clone(), "source equals destination, skipped".to_string()));
                continue;
            }
            if protected_addresses.iter().any(|a| a == address) {
                failures.push((address.clone(), "source is a protected wallet, skipped".to_string()));
                continue;
            }

            let balance = match self.balances.balance_native(address).await {
                Ok(b) => b,
                Err(e) => {
                    failures.push((address.clone(), format!("reading balance: {e:#}")));
                    continue;
                }
            };

            let send = balance - keep_reserve_native - self.per_tx_fee_native;
            if send <= 0.0 {
                failures.push((
                    address.clone(),
                    format!("balance {balance} below reserve + fee, skipped"),
                ));
                continue;
            }

            let _permit = self.gate.acquire().await.expect("submission gate never closed");
            match self.transfer.transfer(*signer, to, send).await {
                Ok(outcome) => swept_total_native += outcome.amount_native,
                Err(e) => {
                    logs::error_chain(&format!("sweeping {address}"), &e);
                    failures.push((address.clone(), e.to_string()));
                }
            }
        }

        Ok(SweepOutcome {
            swept_total_native,
            failures,
        })
    }
}
