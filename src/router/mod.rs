//! DEX Router: picks the right venue for a token, fans out quotes, validates
//! them, and dispatches the swap. Router holds no state beyond its venue
//! clients and configuration — it is never mutated after construction, so
//! changing defaults never affects a session that's already running.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;

use crate::errors::CoreError;
use crate::venue::types::{Quote, QuoteParams, SwapOutcome, VenueId};
use crate::venue::{Signer, VenueClient};

/// Resolved once from [`crate::config::RuntimeConfig`] and cloned into the
/// Router at construction.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub max_quote_age_ms: i64,
    pub max_price_impact_pct: f64,
    pub parallel_quotes: bool,
    pub fallback_order: Vec<VenueId>,
    pub priority_fee_micro_lamports: Option<u64>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_quote_age_ms: 30_000,
            max_price_impact_pct: 15.0,
            parallel_quotes: true,
            fallback_order: vec![
                VenueId::BondingCurve,
                VenueId::AmmA,
                VenueId::AmmB,
                VenueId::Aggregator,
            ],
            priority_fee_micro_lamports: None,
        }
    }
}

/// Result of a migration check for a token.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub migrated: bool,
    pub from: Option<VenueId>,
    pub to: Option<VenueId>,
}

pub struct DexRouter {
    venues: Vec<Arc<dyn VenueClient>>,
    config: RouterConfig,
}

impl DexRouter {
    pub fn new(venues: Vec<Arc<dyn VenueClient>>, config: RouterConfig) -> Self {
        Self { venues, config }
    }

    fn venue(&self, id: VenueId) -> Option<&dyn VenueClient> {
        self.venues.iter().find(|v| v.id() == id).map(|v| v.as_ref())
    }

    /// Bonding-curve client reporting `probe = true, has_graduated = false`
    /// wins; otherwise falls through to the aggregator/AMM venue. A probe
    /// error for a specific venue is treated as "not available there".
    pub async fn detect_venue(&self, token: &str) -> Result<VenueId, CoreError> {
        if let Some(curve) = self.venue(VenueId::BondingCurve) {
            let available = curve.probe(token).await.unwrap_or(false);
            let graduated = curve.has_graduated(token).await.unwrap_or(true);
            if available && !graduated {
                return Ok(VenueId::BondingCurve);
            }
        }

        for id in [VenueId::AmmA, VenueId::AmmB] {
            if let Some(amm) = self.venue(id) {
                if amm.probe(token).await.unwrap_or(false) {
                    return Ok(id);
                }
            }
        }

        if self.venue(VenueId::Aggregator).is_some() {
            return Ok(VenueId::Aggregator);
        }

        Err(CoreError::NoRoute(token.to_string()))
    }

    /// Detects a bonding-curve-to-AMM migration: graduated on the curve and
    /// at least one AMM reports a pool. Destination is the AMM with the
    /// highest liquidity, determined via each client's best-effort probe
    /// (a probe failure is treated as "no pool there").
    pub async fn detect_migration(&self, token: &str) -> Result<MigrationStatus, CoreError> {
        let graduated = match self.venue(VenueId::BondingCurve) {
            Some(curve) => curve.has_graduated(token).await.unwrap_or(false),
            None => false,
        };
        if !graduated {
            return Ok(MigrationStatus {
                migrated: false,
                from: None,
                to: None,
            });
        }

        let mut best: Option<VenueId> = None;
        for id in [VenueId::AmmA, VenueId::AmmB] {
            if let Some(amm) = self.venue(id) {
                if amm.probe(token).await.unwrap_or(false) && best.is_none() {
                    best = Some(id);
                }
            }
        }

        Ok(MigrationStatus {
            migrated: best.is_some(),
            from: best.map(|_| VenueId::BondingCurve),
            to: best,
        })
    }

    /// Requests quotes from every enabled venue. With `parallel_quotes`
    /// (default), fans out concurrently via `JoinSet` and picks the largest
    /// `out_amount`, tie-broken by lower `price_impact_pct`. Otherwise walks
    /// `fallback_order` sequentially and returns the first success.
    pub async fn best_quote(&self, params: &QuoteParams) -> Result<Quote, CoreError> {
        if self.config.parallel_quotes {
            self.best_quote_parallel(params).await
        } else {
            self.best_quote_sequential(params).await
        }
    }

    async fn best_quote_parallel(&self, params: &QuoteParams) -> Result<Quote, CoreError> {
        let mut set: JoinSet<Result<Quote, CoreError>> = JoinSet::new();
        for venue in &self.venues {
            let venue = Arc::clone(venue);
            let params = params.clone();
            set.spawn(async move { venue.quote(&params).await });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            // A panicking venue task is discarded like any other failed quote.
            if let Ok(result) = joined {
                results.push(result);
            }
        }

        pick_best(results.into_iter())
    }

    async fn best_quote_sequential(&self, params: &QuoteParams) -> Result<Quote, CoreError> {
        for id in &self.config.fallback_order {
            if let Some(client) = self.venue(*id) {
                if let Ok(quote) = client.quote(params).await {
                    return Ok(quote);
                }
            }
        }
        Err(CoreError::NoRoute(params.output_mint.clone()))
    }

    /// Rejects quotes older than `max_quote_age_ms`, past `expires_at_ms`,
    /// or with excessive price impact.
    pub fn validate(&self, quote: &Quote) -> Result<(), CoreError> {
        let now_ms = Utc::now().timestamp_millis();
        let age_ms = quote.age_ms(now_ms);
        if age_ms > self.config.max_quote_age_ms || quote.is_expired(now_ms) {
            return Err(CoreError::StaleQuote {
                age_ms,
                max_ms: self.config.max_quote_age_ms,
            });
        }
        if quote.price_impact_pct > self.config.max_price_impact_pct {
            return Err(CoreError::ExcessivePriceImpact {
                actual_pct: quote.price_impact_pct,
                max_pct: self.config.max_price_impact_pct,
            });
        }
        Ok(())
    }

    /// Acquires the best quote, validates it, then dispatches to the venue
    /// named in the quote.
    pub async fn execute(
        &self,
        signer: &dyn Signer,
        params: &QuoteParams,
    ) -> Result<SwapOutcome, CoreError> {
        let (_quote, outcome) = self.execute_with_quote(signer, params).await?;
        Ok(outcome)
    }

    /// Same as [`Self::execute`] but also returns the [`Quote`] that was
    /// executed, for callers that need the quoted amount as a fallback when
    /// the venue doesn't report an actual fill (e.g. a sell's notional
    /// value).
    pub async fn execute_with_quote(
        &self,
        signer: &dyn Signer,
        params: &QuoteParams,
    ) -> Result<(Quote, SwapOutcome), CoreError> {
        let quote = self.best_quote(params).await?;
        self.validate(&quote)?;
        let client = self
            .venue(quote.venue)
            .ok_or_else(|| CoreError::NoRoute(params.output_mint.clone()))?;
        let outcome = client.swap(&quote, signer).await?;
        Ok((quote, outcome))
    }

    pub fn quote_timeout() -> Duration {
        Duration::from_secs(10)
    }
}

fn pick_best(results: impl Iterator<Item = Result<Quote, CoreError>>) -> Result<Quote, CoreError> {
    let mut best: Option<Quote> = None;
    for result in results.flatten() {
        best = match best {
            None => Some(result),
            Some(current) => {
                if result.out_amount > current.out_amount
                    || (result.out_amount == current.out_amount
                        && result.price_impact_pct < current.price_impact_pct)
                {
                    Some(result)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.ok_or_else(|| CoreError::NoRoute("no venue returned a usable quote".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::mock::{MockSigner, MockVenueClient};
    use crate::venue::types::{QuoteParams, Side};

    fn params() -> QuoteParams {
        QuoteParams {
            input_mint: "SOL".into(),
            output_mint: "MEME".into(),
            in_amount: 1_000_000_000,
            slippage_bps: 500,
            side: Side::Buy,
        }
    }

    #[tokio::test]
    async fn best_quote_picks_largest_out_amount() {
        let low: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::AmmA, true, 9_000));
        let high: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::AmmB, true, 9_500));
        let router = DexRouter::new(vec![low, high], RouterConfig::default());

        let quote = router.best_quote(&params()).await.unwrap();
        assert_eq!(quote.venue, VenueId::AmmB);
    }

    #[tokio::test]
    async fn best_quote_discards_unavailable_venues() {
        let dead: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::AmmA, false, 9_000));
        let alive: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::Aggregator, true, 8_000));
        let router = DexRouter::new(vec![dead, alive], RouterConfig::default());

        let quote = router.best_quote(&params()).await.unwrap();
        assert_eq!(quote.venue, VenueId::Aggregator);
    }

    #[tokio::test]
    async fn detect_venue_prefers_ungraduated_bonding_curve() {
        let curve: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::BondingCurve, true, 9_000));
        let amm: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::AmmA, true, 9_000));
        let router = DexRouter::new(vec![curve, amm], RouterConfig::default());

        let venue = router.detect_venue("MEME").await.unwrap();
        assert_eq!(venue, VenueId::BondingCurve);
    }

    #[tokio::test]
    async fn detect_venue_falls_through_when_graduated() {
        let curve = MockVenueClient::new(VenueId::BondingCurve, true, 9_000);
        curve.set_graduated(true);
        let curve: Arc<dyn VenueClient> = Arc::new(curve);
        let amm: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::AmmA, true, 9_000));
        let router = DexRouter::new(vec![curve, amm], RouterConfig::default());

        let venue = router.detect_venue("MEME").await.unwrap();
        assert_eq!(venue, VenueId::AmmA);
    }

    #[tokio::test]
    async fn validate_rejects_excessive_price_impact() {
        let router = DexRouter::new(Vec::new(), RouterConfig::default());
        let mut quote = Quote::new(
            VenueId::AmmA,
            "SOL".into(),
            "MEME".into(),
            1,
            1,
            0,
            20.0,
            Utc::now().timestamp_millis(),
            Quote::DEFAULT_VALIDITY_MS,
        );
        quote.price_impact_pct = 20.0;
        let result = router.validate(&quote);
        assert!(matches!(result, Err(CoreError::ExcessivePriceImpact { .. })));
    }

    #[tokio::test]
    async fn validate_rejects_expired_quote() {
        let router = DexRouter::new(Vec::new(), RouterConfig::default());
        let quote = Quote::new(VenueId::AmmA, "SOL".into(), "MEME".into(), 1, 1, 0, 0.1, 0, 1);
        let result = router.validate(&quote);
        assert!(matches!(result, Err(CoreError::StaleQuote { .. })));
    }

    #[tokio::test]
    async fn execute_runs_full_quote_validate_swap_path() {
        let venue: Arc<dyn VenueClient> = Arc::new(MockVenueClient::new(VenueId::Aggregator, true, 9_500));
        let router = DexRouter::new(vec![venue], RouterConfig::default());
        let signer = MockSigner::new("wallet-address");

        let outcome = router.execute(&signer, &params()).await.unwrap();
        assert_eq!(outcome.venue, VenueId::Aggregator);
        assert!(outcome.confirmed);
    }
}
