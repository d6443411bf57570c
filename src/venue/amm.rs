//! Simulated constant-product AMM venue client. Two instances
//! (`amm_a`/`amm_b`) are wired up by the caller purely so the Router's
//! tie-break logic (largest `out_amount`, then lowest `price_impact_pct`)
//! has more than one candidate to choose between.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::confirm::{self, PollStep};
use crate::errors::CoreError;
use crate::venue::http::VenueHttpClient;
use crate::venue::types::{BaseUnits, Quote, QuoteParams, SwapOutcome, VenueId};
use crate::venue::{Signer, VenueClient};

#[derive(Debug, Serialize)]
struct PoolQuery<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct PoolResponse {
    has_pool: bool,
    #[serde(default)]
    liquidity_native: f64,
}

#[derive(Debug, Serialize)]
struct QuoteRequest<'a> {
    input_mint: &'a str,
    output_mint: &'a str,
    in_amount: BaseUnits,
    slippage_bps: u32,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    out_amount: BaseUnits,
    price_impact_pct: f64,
}

#[derive(Debug, Serialize)]
struct SwapRequest<'a> {
    input_mint: &'a str,
    output_mint: &'a str,
    in_amount: BaseUnits,
    min_out_amount: BaseUnits,
    signer_address: &'a str,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

pub struct AmmClient {
    venue: VenueId,
    http: VenueHttpClient,
    cadence: std::time::Duration,
    attempts: u32,
}

impl AmmClient {
    /// `venue` must be [`VenueId::AmmA`] or [`VenueId::AmmB`].
    pub fn new(venue: VenueId, base_url: impl Into<String>) -> Self {
        Self {
            venue,
            http: VenueHttpClient::new(base_url),
            cadence: confirm::DEFAULT_CADENCE,
            attempts: confirm::DEFAULT_ATTEMPTS,
        }
    }

    /// Liquidity reported for `token`'s pool, used by the Router's
    /// migration-destination tie-break (highest-liquidity AMM wins).
    pub async fn liquidity_native(&self, token: &str) -> Result<f64, CoreError> {
        let resp: PoolResponse = self
            .http
            .post_json("/pool", &PoolQuery { token })
            .await
            .map_err(|e| CoreError::NoRoute(format!("{token}: {e:#}")))?;
        Ok(if resp.has_pool { resp.liquidity_native } else { 0.0 })
    }
}

#[async_trait]
impl VenueClient for AmmClient {
    fn id(&self) -> VenueId {
        self.venue
    }

    async fn probe(&self, token: &str) -> Result<bool, CoreError> {
        let resp: PoolResponse = self
            .http
            .post_json("/pool", &PoolQuery { token })
            .await
            .map_err(|e| CoreError::NoRoute(format!("{token}: {e:#}")))?;
        Ok(resp.has_pool)
    }

    async fn quote(&self, params: &QuoteParams) -> Result<Quote, CoreError> {
        let resp: QuoteResponse = self
            .http
            .post_json(
                "/quote",
                &QuoteRequest {
                    input_mint: &params.input_mint,
                    output_mint: &params.output_mint,
                    in_amount: params.in_amount,
                    slippage_bps: params.slippage_bps,
                },
            )
            .await
            .map_err(|e| CoreError::NoRoute(format!("{}: {e:#}", params.output_mint)))?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(Quote::new(
            self.venue,
            params.input_mint.clone(),
            params.output_mint.clone(),
            params.in_amount,
            resp.out_amount,
            params.slippage_bps,
            resp.price_impact_pct,
            now_ms,
            Quote::DEFAULT_VALIDITY_MS,
        ))
    }

    async fn swap(&self, quote: &Quote, signer: &dyn Signer) -> Result<SwapOutcome, CoreError> {
        let submit: SwapResponse = self
            .http
            .post_json(
                "/swap",
                &SwapRequest {
                    input_mint: &quote.input_mint,
                    output_mint: &quote.output_mint,
                    in_amount: quote.in_amount,
                    min_out_amount: quote.min_out_amount,
                    signer_address: signer.address(),
                },
            )
            .await
            .map_err(|e| CoreError::SubmissionFailed(format!("{e:#}")))?;

        let signature = submit.signature;
        let outcome = confirm::poll_until(
            || poll_status(&self.http, &signature),
            self.cadence,
            self.attempts,
        )
        .await;

        match outcome {
            confirm::PollOutcome::Confirmed => Ok(SwapOutcome {
                signature,
                venue: self.venue,
                in_amount: quote.in_amount as f64 / 1e9,
                out_amount_actual: Some(quote.out_amount as f64 / 1e9),
                confirmed: true,
            }),
            confirm::PollOutcome::Rejected(reason) => Err(CoreError::OnChainReject(reason)),
            confirm::PollOutcome::Timeout => Err(CoreError::NotConfirmed { signature }),
        }
    }
}

async fn poll_status(http: &VenueHttpClient, signature: &str) -> PollStep {
    match http
        .get_json::<StatusResponse>(&format!("/status/{signature}"))
        .await
    {
        Ok(resp) => match resp.status.as_str() {
            "confirmed" => PollStep::Confirmed,
            "rejected" => PollStep::Rejected(resp.reason.unwrap_or_else(|| "rejected".into())),
            _ => PollStep::Pending,
        },
        Err(_) => PollStep::Pending,
    }
}
