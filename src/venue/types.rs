//! Shared value types crossing the Venue Client boundary.
//!
//! Amounts that cross this boundary are integer base units (`u64`): floating
//! display units are a reporting-layer concern (`SessionStats`,
//! `SwapOutcome`), never a wire amount a venue client or the chain RPC
//! receives.

use serde::{Deserialize, Serialize};

pub type BaseUnits = u64;

/// Which venue a quote/swap was served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueId {
    BondingCurve,
    AmmA,
    AmmB,
    Aggregator,
}

impl std::fmt::Display for VenueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VenueId::BondingCurve => "bonding_curve",
            VenueId::AmmA => "amm_a",
            VenueId::AmmB => "amm_b",
            VenueId::Aggregator => "aggregator",
        };
        write!(f, "{s}")
    }
}

/// Direction of a requested swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Parameters for a quote request. `in_amount` is in base units of
/// `input_mint`.
#[derive(Debug, Clone)]
pub struct QuoteParams {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: BaseUnits,
    pub slippage_bps: u32,
    pub side: Side,
}

/// A frozen quote. `timestamp_ms`/`expires_at_ms` are process clock
/// milliseconds; `expires_at_ms > timestamp_ms` always holds (constructed
/// only via [`Quote::new`]).
#[derive(Debug, Clone)]
pub struct Quote {
    pub venue: VenueId,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: BaseUnits,
    pub out_amount: BaseUnits,
    pub min_out_amount: BaseUnits,
    pub price_impact_pct: f64,
    pub timestamp_ms: i64,
    pub expires_at_ms: i64,
}

impl Quote {
    pub const DEFAULT_VALIDITY_MS: i64 = 30_000;

    pub fn new(
        venue: VenueId,
        input_mint: String,
        output_mint: String,
        in_amount: BaseUnits,
        out_amount: BaseUnits,
        slippage_bps: u32,
        price_impact_pct: f64,
        now_ms: i64,
        validity_ms: i64,
    ) -> Self {
        let min_out_amount = apply_slippage(out_amount, slippage_bps);
        Self {
            venue,
            input_mint,
            output_mint,
            in_amount,
            out_amount,
            min_out_amount,
            price_impact_pct,
            timestamp_ms: now_ms,
            expires_at_ms: now_ms + validity_ms,
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.timestamp_ms).max(0)
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

fn apply_slippage(out_amount: BaseUnits, slippage_bps: u32) -> BaseUnits {
    let bps = slippage_bps.min(10_000) as u128;
    let reduced = (out_amount as u128) * (10_000 - bps) / 10_000;
    reduced as u64
}

/// Result of a completed (or failed-but-submitted) swap, in display units.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub signature: String,
    pub venue: VenueId,
    pub in_amount: f64,
    pub out_amount_actual: Option<f64>,
    pub confirmed: bool,
}

/// Result of a native-token transfer (treasury fund/sweep, fee collection).
#[derive(Debug, Clone)]
pub struct NativeTransferOutcome {
    pub signature: String,
    pub amount_native: f64,
    pub confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_applies_slippage_floor() {
        let q = Quote::new(
            VenueId::AmmA,
            "SOL".into(),
            "MINT".into(),
            1_000_000,
            2_000_000,
            500,
            1.2,
            1_000,
            Quote::DEFAULT_VALIDITY_MS,
        );
        assert_eq!(q.min_out_amount, 1_900_000);
        assert!(q.min_out_amount <= q.out_amount);
        assert!(q.expires_at_ms > q.timestamp_ms);
    }

    #[test]
    fn quote_expiry_is_a_half_open_boundary() {
        let q = Quote::new(
            VenueId::AmmA,
            "SOL".into(),
            "MINT".into(),
            1,
            1,
            0,
            0.0,
            0,
            30_000,
        );
        assert!(!q.is_expired(29_999));
        assert!(q.is_expired(30_000));
    }
}
