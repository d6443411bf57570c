//! Policy Presets: the authoritative intensity/timing/size tables for `bot`
//! and `activity` sessions, factored out of the Orchestrator as its own
//! pure, dependency-free lookup — snapshotted once at `StartSession` time,
//! never a live reference into a mutable global.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

/// Snapshot value consumed once at session creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotPreset {
    pub min_swap_native: f64,
    pub max_swap_native: f64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityPreset {
    pub min_swap_native: f64,
    pub max_swap_native: f64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub transfer_chance: f64,
}

pub fn bot(intensity: Intensity) -> BotPreset {
    match intensity {
        Intensity::Low => BotPreset {
            min_swap_native: 0.005,
            max_swap_native: 0.02,
            min_interval_ms: 60_000,
            max_interval_ms: 300_000,
        },
        Intensity::Medium => BotPreset {
            min_swap_native: 0.01,
            max_swap_native: 0.05,
            min_interval_ms: 30_000,
            max_interval_ms: 120_000,
        },
        Intensity::High => BotPreset {
            min_swap_native: 0.02,
            max_swap_native: 0.10,
            min_interval_ms: 15_000,
            max_interval_ms: 60_000,
        },
    }
}

pub fn activity(intensity: Intensity) -> ActivityPreset {
    match intensity {
        Intensity::Low => ActivityPreset {
            min_swap_native: 0.002,
            max_swap_native: 0.01,
            min_interval_ms: 120_000,
            max_interval_ms: 600_000,
            transfer_chance: 0.3,
        },
        Intensity::Medium => ActivityPreset {
            min_swap_native: 0.005,
            max_swap_native: 0.02,
            min_interval_ms: 60_000,
            max_interval_ms: 300_000,
            transfer_chance: 0.4,
        },
        Intensity::High => ActivityPreset {
            min_swap_native: 0.01,
            max_swap_native: 0.05,
            min_interval_ms: 30_000,
            max_interval_ms: 120_000,
            transfer_chance: 0.5,
        },
    }
}

/// Volume sessions bypass the table entirely; these are the stated fallback
/// defaults when the caller omits explicit bounds.
pub const VOLUME_DEFAULT_MIN_SWAP_NATIVE: f64 = 0.01;
pub const VOLUME_DEFAULT_MAX_SWAP_NATIVE: f64 = 0.05;
pub const VOLUME_DEFAULT_MIN_INTERVAL_MS: u64 = 30_000;
pub const VOLUME_DEFAULT_MAX_INTERVAL_MS: u64 = 120_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_preset_bounds_widen_with_intensity() {
        let low = bot(Intensity::Low);
        let high = bot(Intensity::High);
        assert!(high.max_swap_native > low.max_swap_native);
        assert!(high.max_interval_ms < low.max_interval_ms);
    }

    #[test]
    fn activity_preset_transfer_chance_increases_with_intensity() {
        assert!(activity(Intensity::High).transfer_chance > activity(Intensity::Low).transfer_chance);
    }

    #[test]
    fn every_preset_has_well_ordered_bounds() {
        for level in [Intensity::Low, Intensity::Medium, Intensity::High] {
            let b = bot(level);
            assert!(b.min_swap_native < b.max_swap_native);
            assert!(b.min_interval_ms < b.max_interval_ms);

            let a = activity(level);
            assert!(a.min_swap_native < a.max_swap_native);
            assert!(a.min_interval_ms < a.max_interval_ms);
            assert!(a.transfer_chance > 0.0 && a.transfer_chance < 1.0);
        }
    }
}
