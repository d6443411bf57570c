//! Mock signer and venue client used by unit/integration tests, mirroring
//! the teacher's `tests/test_reserve.rs::MockVenue` shape.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::venue::types::{BaseUnits, Quote, QuoteParams, SwapOutcome, VenueId};
use crate::venue::{Signer, VenueClient};

/// A signer that never touches the vault — tests supply a fixed address and
/// a deterministic stand-in signature.
pub struct MockSigner {
    address: String,
}

impl MockSigner {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CoreError> {
        Ok(message.to_vec())
    }
}

/// A scriptable venue client: callers configure whether it's available,
/// graduated, and what quote it should hand back; every call is counted so
/// tests can assert call volume.
pub struct MockVenueClient {
    pub id: VenueId,
    pub available: Mutex<bool>,
    pub graduated: Mutex<bool>,
    pub out_per_in_bps: u32,
    pub fail_swap: Mutex<bool>,
    pub probe_calls: AtomicU64,
    pub quote_calls: AtomicU64,
    pub swap_calls: AtomicU64,
}

impl MockVenueClient {
    pub fn new(id: VenueId, available: bool, out_per_in_bps: u32) -> Self {
        Self {
            id,
            available: Mutex::new(available),
            graduated: Mutex::new(false),
            out_per_in_bps,
            fail_swap: Mutex::new(false),
            probe_calls: AtomicU64::new(0),
            quote_calls: AtomicU64::new(0),
            swap_calls: AtomicU64::new(0),
        }
    }

    pub fn set_graduated(&self, value: bool) {
        *self.graduated.lock().unwrap() = value;
    }

    pub fn set_fail_swap(&self, value: bool) {
        *self.fail_swap.lock().unwrap() = value;
    }
}

#[async_trait]
impl VenueClient for MockVenueClient {
    fn id(&self) -> VenueId {
        self.id
    }

    async fn probe(&self, _token: &str) -> Result<bool, CoreError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.available.lock().unwrap())
    }

    async fn has_graduated(&self, _token: &str) -> Result<bool, CoreError> {
        Ok(*self.graduated.lock().unwrap())
    }

    async fn quote(&self, params: &QuoteParams) -> Result<Quote, CoreError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if !*self.available.lock().unwrap() {
            return Err(CoreError::NoRoute(params.output_mint.clone()));
        }
        let out_amount: BaseUnits =
            (params.in_amount as u128 * self.out_per_in_bps as u128 / 10_000) as u64;
        Ok(Quote::new(
            self.id,
            params.input_mint.clone(),
            params.output_mint.clone(),
            params.in_amount,
            out_amount,
            params.slippage_bps,
            0.5,
            chrono::Utc::now().timestamp_millis(),
            Quote::DEFAULT_VALIDITY_MS,
        ))
    }

    async fn swap(&self, quote: &Quote, signer: &dyn Signer) -> Result<SwapOutcome, CoreError> {
        self.swap_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_swap.lock().unwrap() {
            return Err(CoreError::OnChainReject("mock rejection".into()));
        }
        Ok(SwapOutcome {
            signature: format!("mock-sig-{}-{}", signer.address(), self.swap_calls.load(Ordering::SeqCst)),
            venue: self.id,
            in_amount: quote.in_amount as f64 / 1e9,
            out_amount_actual: Some(quote.out_amount as f64 / 1e9),
            confirmed: true,
        })
    }
}
