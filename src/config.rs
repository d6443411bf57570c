//! Environment-driven runtime configuration, resolved once at process start
//! into an immutable value — no global statics, mirroring the teacher's
//! `run::config::RuntimeConfig::from_cli`/`from_args` split.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::errors::CoreError;

const ENV_PREFIX: &str = "TRENCHFLOW";

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{suffix}")).ok()
}

/// Fee collection parameters, either supplied locally or populated by the
/// hosted bootstrap response.
#[derive(Debug, Clone, Default)]
pub struct FeeConfig {
    pub fee_account: Option<String>,
    pub fee_bps: u32,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub rpc_url: Option<String>,
    pub vault_path: PathBuf,
    pub slippage_bps: u32,
    pub max_buy_native: f64,
    pub self_hosted: bool,
    pub fee: FeeConfig,
    pub jupiter_api_key: Option<String>,
    pub helius_api_key: Option<String>,
    pub changenow_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostedBootstrapResponse {
    #[serde(rename = "rpcUrl")]
    rpc_url: Option<String>,
    #[serde(rename = "feeAccount")]
    fee_account: Option<String>,
    #[serde(rename = "feeBps")]
    fee_bps: Option<u32>,
}

impl RuntimeConfig {
    fn default_vault_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trenchsniper")
            .join("vault.json")
    }

    /// Resolve from the environment only (no network I/O). Hosted bootstrap,
    /// when enabled, is a separate async step — see [`Self::apply_hosted_bootstrap`].
    pub fn from_env() -> Result<Self> {
        let vault_path = env_var("VAULT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_vault_path);

        let slippage_bps = match env_var("SLIPPAGE_BPS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid TRENCHFLOW_SLIPPAGE_BPS '{v}'"))?,
            None => 500,
        };

        let max_buy_native = match env_var("MAX_BUY_SOL") {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid TRENCHFLOW_MAX_BUY_SOL '{v}'"))?,
            None => 1.0,
        };

        let self_hosted = env_var("SELF_HOSTED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let rpc_url = env_var("RPC_URL");
        if self_hosted && rpc_url.is_none() {
            bail!("TRENCHFLOW_SELF_HOSTED=true requires TRENCHFLOW_RPC_URL to be set");
        }

        Ok(RuntimeConfig {
            rpc_url,
            vault_path,
            slippage_bps,
            max_buy_native,
            self_hosted,
            fee: FeeConfig::default(),
            jupiter_api_key: env_var("JUPITER_API_KEY"),
            helius_api_key: env_var("HELIUS_API_KEY"),
            changenow_api_key: env_var("CHANGENOW_API_KEY"),
        })
    }

    /// Hosted bootstrap: `GET {api_url}/api/config`, optional bearer. Populates
    /// fee parameters and, if the operator didn't set one, the RPC endpoint.
    /// A non-2xx response aborts startup (`ConfigurationError`). Skipped
    /// entirely in self-hosted mode.
    pub async fn apply_hosted_bootstrap(&mut self, client: &reqwest::Client) -> Result<()> {
        if self.self_hosted {
            return Ok(());
        }

        let api_url = env_var("API_URL")
            .unwrap_or_else(|| "https://api.trenchsniper.example/v1".to_string());
        let api_key = env_var("API_KEY");

        let mut request = client.get(format!("{api_url}/api/config"));
        if let Some(key) = &api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("hosted bootstrap request to {api_url}"))?;

        if !response.status().is_success() {
            bail!(
                "hosted bootstrap failed: {api_url} returned {}",
                response.status()
            );
        }

        let body: HostedBootstrapResponse = response
            .json()
            .await
            .context("parsing hosted bootstrap response")?;

        if self.rpc_url.is_none() {
            self.rpc_url = body.rpc_url;
        }
        self.fee.fee_account = body.fee_account;
        self.fee.fee_bps = body.fee_bps.unwrap_or(0);

        Ok(())
    }

    pub fn require_rpc_url(&self) -> Result<&str, CoreError> {
        self.rpc_url
            .as_deref()
            .ok_or_else(|| CoreError::ConfigurationError("no RPC endpoint configured".into()))
    }
}
