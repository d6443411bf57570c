//! Simulated single-pool bonding-curve venue client. Wire format is
//! intentionally abstract per the Non-goal against reproducing any specific
//! DEX's instruction layout — this client speaks a small JSON request/
//! response pair to whatever endpoint `base_url` points at.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::confirm::{self, PollStep};
use crate::errors::CoreError;
use crate::venue::http::VenueHttpClient;
use crate::venue::types::{BaseUnits, Quote, QuoteParams, SwapOutcome, VenueId};
use crate::venue::{Signer, VenueClient};

#[derive(Debug, Serialize)]
struct ProbeRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProbeResponse {
    available: bool,
    graduated: bool,
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
    status: String, // "confirmed" | "pending" | "rejected"
    #[serde(default)]
    reason: Option<String>,
}

pub struct BondingCurveClient {
    http: VenueHttpClient,
    cadence: std::time::Duration,
    attempts: u32,
}

impl BondingCurveClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: VenueHttpClient::new(base_url),
            cadence: confirm::DEFAULT_CADENCE,
            attempts: confirm::DEFAULT_ATTEMPTS,
        }
    }
}

#[async_trait]
impl VenueClient for BondingCurveClient {
    fn id(&self) -> VenueId {
        VenueId::BondingCurve
    }

    async fn probe(&self, token: &str) -> Result<bool, CoreError> {
        let resp: ProbeResponse = self
            .http
            .post_json("/probe", &ProbeRequest { token })
            .await
            .map_err(|e| CoreError::NoRoute(format!("{token}: {e:#}")))?;
        Ok(resp.available && !resp.graduated)
    }

    async fn has_graduated(&self, token: &str) -> Result<bool, CoreError> {
        let resp: ProbeResponse = self
            .http
            .post_json("/probe", &ProbeRequest { token })
            .await
            .map_err(|e| CoreError::NoRoute(format!("{token}: {e:#}")))?;
        Ok(resp.graduated)
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
            VenueId::BondingCurve,
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
                venue: VenueId::BondingCurve,
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
