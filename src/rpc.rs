//! The native-chain RPC adapter: the one concrete implementation of
//! [`fee::NativeTransfer`], [`treasury::BalanceReader`], and
//! [`orchestrator::loop_task::TokenBalanceReader`] the Orchestrator wires up
//! for the Fee Collector, Treasury Mover, and every wallet's trade loop.
//! Shares [`venue::http::VenueHttpClient`] with the venue clients rather
//! than rolling its own `reqwest` setup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::confirm::{self, PollStep};
use crate::errors::CoreError;
use crate::fee::NativeTransfer;
use crate::orchestrator::loop_task::TokenBalanceReader;
use crate::treasury::BalanceReader;
use crate::venue::http::VenueHttpClient;
use crate::venue::types::NativeTransferOutcome;
use crate::venue::Signer;

#[derive(Debug, Serialize)]
struct BalanceRequest<'a> {
    address: &'a str,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    native: f64,
}

#[derive(Debug, Serialize)]
struct TokenBalanceRequest<'a> {
    owner: &'a str,
    mint: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenBalanceResponse {
    amount: f64,
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    from_address: &'a str,
    to_address: &'a str,
    amount_native: f64,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

pub struct RpcClient {
    http: VenueHttpClient,
    cadence: std::time::Duration,
    attempts: u32,
}

impl RpcClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            http: VenueHttpClient::new(rpc_url),
            cadence: confirm::DEFAULT_CADENCE,
            attempts: confirm::DEFAULT_ATTEMPTS,
        }
    }

    async fn poll_status(&self, signature: &str) -> PollStep {
        match self
            .http
            .get_json::<StatusResponse>(&format!("/tx/{signature}"))
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
}

#[async_trait]
impl NativeTransfer for RpcClient {
    async fn transfer(
        &self,
        signer: &dyn Signer,
        to: &str,
        amount_native: f64,
    ) -> anyhow::Result<NativeTransferOutcome> {
        let submit: TransferResponse = self
            .http
            .post_json(
                "/transfer",
                &TransferRequest {
                    from_address: signer.address(),
                    to_address: to,
                    amount_native,
                },
            )
            .await?;

        let signature = submit.signature;
        let outcome = confirm::poll_until(|| self.poll_status(&signature), self.cadence, self.attempts).await;

        match outcome {
            confirm::PollOutcome::Confirmed => Ok(NativeTransferOutcome {
                signature,
                amount_native,
                confirmed: true,
            }),
            confirm::PollOutcome::Rejected(reason) => {
                Err(CoreError::OnChainReject(reason).into())
            }
            confirm::PollOutcome::Timeout => Err(CoreError::NotConfirmed { signature }.into()),
        }
    }
}

#[async_trait]
impl BalanceReader for RpcClient {
    async fn balance_native(&self, address: &str) -> anyhow::Result<f64> {
        let resp: BalanceResponse = self
            .http
            .post_json("/balance", &BalanceRequest { address })
            .await?;
        Ok(resp.native)
    }
}

#[async_trait]
impl TokenBalanceReader for RpcClient {
    async fn token_balance(&self, owner: &str, mint: &str) -> anyhow::Result<f64> {
        let resp: TokenBalanceResponse = self
            .http
            .post_json("/token-balance", &TokenBalanceRequest { owner, mint })
            .await?;
        Ok(resp.amount)
    }
}
