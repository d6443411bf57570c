//! Shared test doubles for the integration suite: a stateful native-balance
//! ledger (fund/sweep conservation needs real debit/credit, not fixed
//! lookups) and a couple of fixed-answer readers for cases that don't.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use trenchflow::fee::NativeTransfer;
use trenchflow::orchestrator::loop_task::TokenBalanceReader;
use trenchflow::treasury::{BalanceReader, DEFAULT_PER_TX_FEE_NATIVE};
use trenchflow::venue::Signer;
use trenchflow::venue::types::NativeTransferOutcome;

/// A shared `HashMap<address, native_balance>` that `transfer` actually
/// debits/credits, so a test can assert conservation across a fund/sweep
/// round trip rather than trusting fixed stand-in numbers.
pub struct Ledger(Mutex<HashMap<String, f64>>);

impl Ledger {
    pub fn new() -> Self {
        Self(Mutex::new(HashMap::new()))
    }

    pub fn set(&self, address: &str, amount: f64) {
        self.0.lock().unwrap().insert(address.to_string(), amount);
    }

    pub fn balance_of(&self, address: &str) -> f64 {
        *self.0.lock().unwrap().get(address).unwrap_or(&0.0)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BalanceReader for Ledger {
    async fn balance_native(&self, address: &str) -> anyhow::Result<f64> {
        Ok(self.balance_of(address))
    }
}

/// Debits `amount_native + DEFAULT_PER_TX_FEE_NATIVE` from the signer and
/// credits `amount_native` to `to`, standing in for the chain actually
/// consuming a transaction fee on every transfer.
#[async_trait::async_trait]
impl NativeTransfer for Ledger {
    async fn transfer(
        &self,
        signer: &dyn Signer,
        to: &str,
        amount_native: f64,
    ) -> anyhow::Result<NativeTransferOutcome> {
        let mut map = self.0.lock().unwrap();
        let from = signer.address().to_string();
        let from_balance = *map.get(&from).unwrap_or(&0.0);
        map.insert(from.clone(), from_balance - amount_native - DEFAULT_PER_TX_FEE_NATIVE);
        let to_balance = *map.get(to).unwrap_or(&0.0);
        map.insert(to.to_string(), to_balance + amount_native);
        Ok(NativeTransferOutcome {
            signature: format!("ledger-sig-{from}-{to}"),
            amount_native,
            confirmed: true,
        })
    }
}

/// A native-balance reader that returns the same generous figure for every
/// address — for scenarios where only relative call counts matter, not
/// actual conservation.
pub struct GenerousBalance(pub f64);

#[async_trait::async_trait]
impl BalanceReader for GenerousBalance {
    async fn balance_native(&self, _address: &str) -> anyhow::Result<f64> {
        Ok(self.0)
    }
}

/// A native transfer that always succeeds and records nothing — for paths
/// where the call must simply not fail.
pub struct AlwaysTransfer;

#[async_trait::async_trait]
impl NativeTransfer for AlwaysTransfer {
    async fn transfer(
        &self,
        _signer: &dyn Signer,
        to: &str,
        amount_native: f64,
    ) -> anyhow::Result<NativeTransferOutcome> {
        Ok(NativeTransferOutcome {
            signature: format!("sig-{to}"),
            amount_native,
            confirmed: true,
        })
    }
}

/// A native transfer that always fails — for proving fee-collection
/// failures never cross back into a trade's own success/failure counter.
pub struct FailingTransfer;

#[async_trait::async_trait]
impl NativeTransfer for FailingTransfer {
    async fn transfer(
        &self,
        _signer: &dyn Signer,
        _to: &str,
        _amount_native: f64,
    ) -> anyhow::Result<NativeTransferOutcome> {
        anyhow::bail!("simulated fee-transfer rejection")
    }
}

/// A token-balance reader that reports zero for every (owner, mint) — forces
/// every swap iteration in a trade loop toward the `Buy` side, since `Sell`
/// only happens when a wallet is reported holding some of the target.
pub struct ZeroTokenBalance;

#[async_trait::async_trait]
impl TokenBalanceReader for ZeroTokenBalance {
    async fn token_balance(&self, _owner: &str, _mint: &str) -> anyhow::Result<f64> {
        Ok(0.0)
    }
}

pub fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "trenchflow-itest-{label}-{}.json",
        uuid::Uuid::new_v4()
    ))
}
