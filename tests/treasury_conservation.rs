//! S4 — Fund/sweep conservation: funding a set of targets from a source and
//! then sweeping them back must not create or destroy native balance beyond
//! the declared per-transaction fee.

mod common;

use std::sync::Arc;

use common::Ledger;
use trenchflow::treasury::{TreasuryMover, DEFAULT_PER_TX_FEE_NATIVE};
use trenchflow::venue::mock::MockSigner;
use trenchflow::venue::Signer;

#[tokio::test]
async fn s4_fund_then_sweep_conserves_balance_within_fees() {
    let ledger = Arc::new(Ledger::new());
    ledger.set("source", 1.0);

    let mover = TreasuryMover::new(
        ledger.clone(),
        ledger.clone(),
        trenchflow::concurrency::new_submission_gate(),
    );

    let source_signer = MockSigner::new("source");
    let targets = vec!["w1".to_string(), "w2".to_string(), "w3".to_string()];
    let per_target = 0.05;

    let fund_outcome = mover
        .fund(&source_signer, &targets, per_target, 0.002_039, &[])
        .await
        .unwrap();
    assert_eq!(fund_outcome.funded_count, 3);
    assert!(fund_outcome.failures.is_empty());

    let expected_source_after_fund = 1.0 - 3.0 * (per_target + DEFAULT_PER_TX_FEE_NATIVE);
    let source_after_fund = ledger.balance_of("source");
    assert!(source_after_fund <= 1.0 - 0.15 - 3.0 * DEFAULT_PER_TX_FEE_NATIVE + 1e-9);
    assert!((source_after_fund - expected_source_after_fund).abs() < 1e-9);

    for target in &targets {
        assert!(ledger.balance_of(target) >= per_target - 1e-9);
    }

    let w1 = MockSigner::new("w1");
    let w2 = MockSigner::new("w2");
    let w3 = MockSigner::new("w3");
    let sources: Vec<(String, &dyn Signer)> = vec![
        ("w1".to_string(), &w1),
        ("w2".to_string(), &w2),
        ("w3".to_string(), &w3),
    ];

    let keep_reserve = 0.002;
    let sweep_outcome = mover.sweep(&sources, "source", keep_reserve, &[]).await.unwrap();
    assert!(sweep_outcome.failures.is_empty());
    assert!(sweep_outcome.swept_total_native > 0.0);

    let source_after_sweep = ledger.balance_of("source");
    let expected_floor = 1.0 - 3.0 * (2.0 * DEFAULT_PER_TX_FEE_NATIVE) - 3.0 * keep_reserve;
    assert!(source_after_sweep >= expected_floor - 1e-9);

    for target in &targets {
        let remaining = ledger.balance_of(target);
        assert!(remaining <= keep_reserve + DEFAULT_PER_TX_FEE_NATIVE + 1e-9);
    }
}

#[tokio::test]
async fn fund_rejects_without_touching_ledger_when_source_is_short() {
    let ledger = Arc::new(Ledger::new());
    ledger.set("source", 0.01);

    let mover = TreasuryMover::new(
        ledger.clone(),
        ledger.clone(),
        trenchflow::concurrency::new_submission_gate(),
    );

    let source_signer = MockSigner::new("source");
    let targets = vec!["w1".to_string(), "w2".to_string()];
    let result = mover.fund(&source_signer, &targets, 0.05, 0.002_039, &[]).await;

    assert!(result.is_err());
    assert_eq!(ledger.balance_of("source"), 0.01);
    assert_eq!(ledger.balance_of("w1"), 0.0);
}
