//! Thin `reqwest::Client` wrapper shared by every venue client, modeled on
//! the teacher's `fetch_data/providers/defillama.rs` request/deserialize
//! pattern — a bounded-timeout client, a `post_json` helper, and errors
//! wrapped with `anyhow::Context` rather than a bespoke HTTP error type.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct VenueHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl VenueHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builder");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?
            .json::<R>()
            .await
            .with_context(|| format!("parsing JSON response from {url}"))
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url} returned an error status"))?
            .json::<R>()
            .await
            .with_context(|| format!("parsing JSON response from {url}"))
    }
}
