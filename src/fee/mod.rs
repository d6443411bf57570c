//! Fee Collector: stateless, best-effort post-swap transfer of a native-token
//! share of a trade's notional to a configured platform account.
//!
//! Failures are logged and swallowed rather than propagated — `collect`
//! returns `Option<NativeTransferOutcome>` (never a `Result`) specifically so
//! a caller cannot accidentally `?` it into the trade path and abort an
//! otherwise-successful swap over a fee transfer that didn't land.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::logs;
use crate::venue::Signer;
use crate::venue::types::NativeTransferOutcome;

/// Computes `floor(trade_notional_native * fee_bps / 10_000)`, `None` when
/// zero.
pub fn fee_amount_native(trade_notional_native: f64, fee_bps: u32) -> Option<f64> {
    let fee = (trade_notional_native * fee_bps as f64 / 10_000.0 * 1e9).floor() / 1e9;
    if fee <= 0.0 { None } else { Some(fee) }
}

/// Submits a native-token transfer of `trade_notional_native * fee_bps /
/// 10_000` from `signer` to `fee_account`, on a fresh transaction run after
/// the primary swap has already confirmed. `transfer` is the chain-specific
/// transfer-and-confirm primitive (shared with the Treasury Mover).
#[derive(Clone)]
pub struct FeeCollector {
    transfer: Arc<dyn NativeTransfer>,
}

/// A transfer primitive: builds, submits, and confirms a native-token
/// transfer. Implemented by whatever RPC adapter the process wires up;
/// kept as a trait object here so this module has no chain-specific code
/// and so the Orchestrator can share a single adapter between the Fee
/// Collector and the Treasury Mover.
#[async_trait::async_trait]
pub trait NativeTransfer: Send + Sync {
    async fn transfer(
        &self,
        signer: &dyn Signer,
        to: &str,
        amount_native: f64,
    ) -> Result<NativeTransferOutcome>;
}

impl FeeCollector {
    pub fn new(transfer: Arc<dyn NativeTransfer>) -> Self {
        Self { transfer }
    }

    /// Never fails the parent trade: any error is logged and swallowed.
    pub async fn collect(
        &self,
        signer: &dyn Signer,
        trade_notional_native: f64,
        fee_account: &str,
        fee_bps: u32,
    ) -> Option<NativeTransferOutcome> {
        let fee = fee_amount_native(trade_notional_native, fee_bps)?;

        match self
            .transfer
            .transfer(signer, fee_account, fee)
            .await
            .with_context(|| format!("collecting fee of {fee} to {fee_account}"))
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                logs::error_chain("fee collection", &e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::mock::MockSigner;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct AlwaysSucceeds;

    #[async_trait::async_trait]
    impl NativeTransfer for AlwaysSucceeds {
        async fn transfer(
            &self,
            _signer: &dyn Signer,
            _to: &str,
            amount_native: f64,
        ) -> Result<NativeTransferOutcome> {
            Ok(NativeTransferOutcome {
                signature: "sig".into(),
                amount_native,
                confirmed: true,
            })
        }
    }

    struct AlwaysFails {
        called: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl NativeTransfer for AlwaysFails {
        async fn transfer(
            &self,
            _signer: &dyn Signer,
            _to: &str,
            _amount_native: f64,
        ) -> Result<NativeTransferOutcome> {
            self.called.store(true, Ordering::SeqCst);
            anyhow::bail!("rpc unavailable")
        }
    }

    #[test]
    fn fee_amount_floors_to_zero_below_minimum_unit() {
        assert_eq!(fee_amount_native(0.01, 1), None);
    }

    #[test]
    fn fee_amount_computes_bps_share() {
        assert_eq!(fee_amount_native(1.0, 100), Some(0.01));
    }

    #[tokio::test]
    async fn collect_returns_none_for_zero_fee() {
        let collector = FeeCollector::new(Arc::new(AlwaysSucceeds));
        let signer = MockSigner::new("addr");
        let outcome = collector.collect(&signer, 0.0, "fee-account", 100).await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn collect_swallows_transfer_failures() {
        let called = Arc::new(AtomicBool::new(false));
        let collector = FeeCollector::new(Arc::new(AlwaysFails {
            called: called.clone(),
        }));
        let signer = MockSigner::new("addr");
        let outcome = collector.collect(&signer, 1.0, "fee-account", 100).await;
        assert!(outcome.is_none());
        assert!(called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn collect_returns_outcome_on_success() {
        let collector = FeeCollector::new(Arc::new(AlwaysSucceeds));
        let signer = MockSigner::new("addr");
        let outcome = collector
            .collect(&signer, 1.0, "fee-account", 100)
            .await
            .unwrap();
        assert!(outcome.confirmed);
        assert_eq!(outcome.amount_native, 0.01);
    }
}
