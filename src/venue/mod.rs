//! Venue Client: the polymorphic contract every DEX-like venue satisfies.
//!
//! Modeled exactly on the teacher's `Venue`/`VenueExecutor` split
//! (`venues/mod.rs`, `run/executor/mod.rs`): an `async_trait` object-safe
//! trait (`Send + Sync`), held behind `Box<dyn VenueClient>` by the Router —
//! no venue-specific code anywhere outside this module's own files.

pub mod aggregator;
pub mod amm;
pub mod bonding_curve;
pub mod http;
pub mod mock;
pub mod types;

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::vault::Vault;
use types::{Quote, QuoteParams, SwapOutcome, VenueId};

/// A signing capability the Router/Venue Clients use without ever seeing
/// secret material — the Vault is the only `Signer` implementation, but the
/// trait keeps venue code decoupled from vault internals (and lets tests
/// supply [`mock::MockSigner`]).
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CoreError>;
}

/// Adapts a single unlocked wallet name in a [`Vault`] to the [`Signer`]
/// contract.
pub struct VaultSigner<'a> {
    vault: &'a Vault,
    wallet_name: String,
    address: String,
}

impl<'a> VaultSigner<'a> {
    pub fn new(vault: &'a Vault, wallet_name: impl Into<String>) -> Result<Self, CoreError> {
        let wallet_name = wallet_name.into();
        let address = vault.address_of(&wallet_name)?;
        Ok(Self {
            vault,
            wallet_name,
            address,
        })
    }
}

impl Signer for VaultSigner<'_> {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CoreError> {
        self.vault.sign(&self.wallet_name, message)
    }
}

/// Venue Client capability set: `probe`, `quote`, `swap`, plus an optional
/// graduation check bonding-curve variants override.
#[async_trait]
pub trait VenueClient: Send + Sync {
    fn id(&self) -> VenueId;

    /// Whether this venue currently serves the token at all.
    async fn probe(&self, token: &str) -> Result<bool, CoreError>;

    /// Bonding-curve variants override this; every other venue is never
    /// "graduated" and the default simply reports `false`.
    async fn has_graduated(&self, _token: &str) -> Result<bool, CoreError> {
        Ok(false)
    }

    async fn quote(&self, params: &QuoteParams) -> Result<Quote, CoreError>;

    async fn swap(&self, quote: &Quote, signer: &dyn Signer) -> Result<SwapOutcome, CoreError>;
}
