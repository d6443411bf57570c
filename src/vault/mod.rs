//! Wallet Vault: an encrypted-at-rest store of signing keypairs, unlocked by
//! a single operator password for the lifetime of a process.
//!
//! PBKDF2 derives the encryption key and AES-256-GCM wraps each wallet's
//! secret individually; decrypted material lives only inside [`Unlocked`],
//! which is dropped (zeroing everything) on `lock`. The blob itself is a
//! single JSON file rather than a database table — there's exactly one
//! operator per vault, so a multi-tenant store would just be overhead.

pub mod crypto;
pub mod store;
pub mod wallet;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{CoreError, CoreResult};
use crate::vault::crypto::DerivedKey;
use crate::vault::store::VaultBlob;
use crate::vault::wallet::{Ed25519Scheme, KeypairScheme, UnlockedWallet, WalletRecord, WalletType};

/// Password length bounds, checked at `bootstrap` and `unlock`. A floor
/// rules out trivially guessable passwords; the ceiling keeps the PBKDF2
/// derivation input bounded.
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 256;

fn validate_password_len(password: &str) -> CoreResult<()> {
    let len = password.len();
    if len < MIN_PASSWORD_LEN || len > MAX_PASSWORD_LEN {
        return Err(CoreError::ConfigurationError(format!(
            "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters, got {len}"
        )));
    }
    Ok(())
}

/// In-memory state once the operator password has been verified. Dropping
/// this struct (as `Vault::lock` does explicitly) zeroes every wallet's
/// secret via `UnlockedWallet`'s own `Drop`.
struct Unlocked {
    key: DerivedKey,
    wallets: HashMap<String, UnlockedWallet>,
}

/// The wallet vault. Holds the path to its backing blob, the scheme used to
/// derive addresses, and — only while unlocked — the decrypted key material.
pub struct Vault {
    path: PathBuf,
    scheme: Box<dyn KeypairScheme>,
    blob: VaultBlob,
    unlocked: Option<Unlocked>,
}

impl Vault {
    /// Opens the vault at `path`. If no blob exists yet, `bootstrap` must be
    /// called first with a new password.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let blob = if store::exists(&path) {
            store::load(&path)?
        } else {
            VaultBlob::new(String::new(), crypto::DEFAULT_PBKDF2_ITERATIONS)
        };
        Ok(Self {
            path,
            scheme: Box::new(Ed25519Scheme),
            blob,
            unlocked: None,
        })
    }

    pub fn is_bootstrapped(&self) -> bool {
        !self.blob.salt_b64.is_empty()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    /// First-run bootstrap: generates a fresh random salt, derives the key,
    /// and persists an empty blob under the new password. Errors if a blob
    /// already exists — re-bootstrapping would silently discard every
    /// existing wallet.
    pub fn bootstrap(&mut self, password: &str) -> CoreResult<()> {
        if self.is_bootstrapped() {
            return Err(CoreError::ConfigurationError(
                "vault is already bootstrapped".into(),
            ));
        }
        validate_password_len(password)?;
        let salt = crypto::random_salt();
        self.blob.salt_b64 = crypto::encode_b64(&salt);
        self.blob.iterations = crypto::DEFAULT_PBKDF2_ITERATIONS;

        let key = crypto::derive_key(password, &salt, self.blob.iterations);
        self.unlocked = Some(Unlocked {
            key,
            wallets: HashMap::new(),
        });
        self.persist()
    }

    /// Verifies `password` against every stored wallet's ciphertext and, on
    /// success, decrypts each into memory. Re-verified on every mutating
    /// call even once unlocked — the password is never cached beyond the
    /// derived key already held in `Unlocked`.
    pub fn unlock(&mut self, password: &str) -> CoreResult<()> {
        if !self.is_bootstrapped() {
            return Err(CoreError::ConfigurationError(
                "vault has not been bootstrapped yet".into(),
            ));
        }
        validate_password_len(password)?;
        let salt = crypto::decode_b64(&self.blob.salt_b64)?;
        let key = crypto::derive_key(password, &salt, self.blob.iterations);

        let mut wallets = HashMap::new();
        for record in &self.blob.wallets {
            let ciphertext = crypto::decode_b64(&record.encrypted_secret)?;
            let secret = crypto::decrypt(&ciphertext, &key)?;
            wallets.insert(
                record.name.clone(),
                UnlockedWallet::new(
                    record.name.clone(),
                    record.address.clone(),
                    record.wallet_type,
                    secret,
                ),
            );
        }

        self.unlocked = Some(Unlocked { key, wallets });
        Ok(())
    }

    /// Zeroes and drops every decrypted wallet and the derived key.
    pub fn lock(&mut self) {
        self.unlocked = None;
    }

    fn unlocked(&self) -> CoreResult<&Unlocked> {
        self.unlocked.as_ref().ok_or(CoreError::Locked)
    }

    fn unlocked_mut(&mut self) -> CoreResult<&mut Unlocked> {
        self.unlocked.as_mut().ok_or(CoreError::Locked)
    }

    /// Re-derives a key from `password` and the stored salt/iteration count
    /// and compares it against the key captured at `unlock`/`bootstrap`
    /// time. A stale in-memory unlock can't be used to mutate the vault
    /// under a different (or mistyped) password than the one that unlocked
    /// it — every mutator calls this before touching the blob.
    fn verify_password(&self, password: &str) -> CoreResult<()> {
        let unlocked = self.unlocked()?;
        let salt = crypto::decode_b64(&self.blob.salt_b64)?;
        let candidate = crypto::derive_key(password, &salt, self.blob.iterations);
        if candidate.0 == unlocked.key.0 {
            Ok(())
        } else {
            Err(CoreError::InvalidPassword)
        }
    }

    fn persist(&self) -> CoreResult<()> {
        store::save(&self.path, &self.blob)
    }

    /// Generates a fresh keypair, stores it encrypted, and returns its
    /// address. Fails if a wallet with `name` already exists.
    pub fn generate(&mut self, name: &str, wallet_type: WalletType, password: &str) -> CoreResult<String> {
        self.verify_password(password)?;
        if self.blob.wallets.iter().any(|w| w.name == name) {
            return Err(CoreError::WalletExists(name.to_string()));
        }
        let (secret, address) = self.scheme.generate();
        self.insert_wallet(name, address.clone(), wallet_type, secret)?;
        Ok(address)
    }

    /// Generates `count` wallets named `"{prefix}-{n}"` (1-indexed). Stops
    /// and returns the error at the first name collision, leaving any
    /// earlier-generated wallets in this batch already persisted — callers
    /// that need all-or-nothing semantics should pre-check the name range.
    pub fn generate_batch(
        &mut self,
        prefix: &str,
        count: u32,
        wallet_type: WalletType,
        password: &str,
    ) -> CoreResult<Vec<String>> {
        self.verify_password(password)?;
        let mut addresses = Vec::with_capacity(count as usize);
        for n in 1..=count {
            let name = format!("{prefix}-{n}");
            addresses.push(self.generate(&name, wallet_type, password)?);
        }
        Ok(addresses)
    }

    /// Imports an externally-supplied secret key under `name`.
    pub fn import(
        &mut self,
        name: &str,
        wallet_type: WalletType,
        secret: Vec<u8>,
        password: &str,
    ) -> CoreResult<String> {
        self.verify_password(password)?;
        if self.blob.wallets.iter().any(|w| w.name == name) {
            return Err(CoreError::WalletExists(name.to_string()));
        }
        let address = self
            .scheme
            .derive_address(&secret)
            .map_err(CoreError::ConfigurationError)?;
        self.insert_wallet(name, address.clone(), wallet_type, secret)?;
        Ok(address)
    }

    fn insert_wallet(
        &mut self,
        name: &str,
        address: String,
        wallet_type: WalletType,
        secret: Vec<u8>,
    ) -> CoreResult<()> {
        let key_b64 = {
            let unlocked = self.unlocked()?;
            let ciphertext = crypto::encrypt(&secret, &unlocked.key)?;
            crypto::encode_b64(&ciphertext)
        };

        self.blob.wallets.push(WalletRecord {
            name: name.to_string(),
            address: address.clone(),
            wallet_type,
            encrypted_secret: key_b64,
        });
        self.persist()?;

        let unlocked = self.unlocked_mut()?;
        unlocked.wallets.insert(
            name.to_string(),
            UnlockedWallet::new(name.to_string(), address, wallet_type, secret),
        );
        Ok(())
    }

    /// Removes a single wallet by name. `protected_addresses` is the set of
    /// addresses referenced by any launch record — callers that hold a
    /// launch registry (the Orchestrator) pass it through so a wallet that
    /// created a token can never be deleted out from under its record.
    pub fn remove(&mut self, name: &str, password: &str, protected_addresses: &[String]) -> CoreResult<()> {
        self.verify_password(password)?;
        self.remove_unchecked(name, protected_addresses)
    }

    fn remove_unchecked(&mut self, name: &str, protected_addresses: &[String]) -> CoreResult<()> {
        let record = self
            .blob
            .wallets
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| CoreError::UnknownWallet(name.to_string()))?;
        if protected_addresses.iter().any(|a| a == &record.address) {
            return Err(CoreError::ProtectedWallet(name.to_string()));
        }
        self.blob.wallets.retain(|w| w.name != name);
        self.persist()?;
        if let Some(unlocked) = self.unlocked.as_mut() {
            unlocked.wallets.remove(name);
        }
        Ok(())
    }

    /// Removes every name in `names`, collecting any failure (unknown or
    /// protected) rather than aborting at the first one — a bulk cleanup
    /// continues past names that no longer exist or can't be removed,
    /// reporting the non-protected subset actually removed. The password is
    /// verified once up front rather than once per name.
    pub fn remove_many(
        &mut self,
        names: &[String],
        password: &str,
        protected_addresses: &[String],
    ) -> CoreResult<(u32, Vec<(String, CoreError)>)> {
        self.verify_password(password)?;
        let mut failures = Vec::new();
        let mut removed = 0u32;
        for name in names {
            match self.remove_unchecked(name, protected_addresses) {
                Ok(()) => removed += 1,
                Err(e) => failures.push((name.clone(), e)),
            }
        }
        Ok((removed, failures))
    }

    /// Renames a wallet in place.
    pub fn update(&mut self, name: &str, new_name: &str, password: &str) -> CoreResult<()> {
        self.verify_password(password)?;
        if self.blob.wallets.iter().any(|w| w.name == new_name) {
            return Err(CoreError::WalletExists(new_name.to_string()));
        }
        let record = self
            .blob
            .wallets
            .iter_mut()
            .find(|w| w.name == name)
            .ok_or_else(|| CoreError::UnknownWallet(name.to_string()))?;
        record.name = new_name.to_string();
        self.persist()?;

        if let Some(unlocked) = self.unlocked.as_mut() {
            if let Some(mut wallet) = unlocked.wallets.remove(name) {
                wallet.name = new_name.to_string();
                unlocked.wallets.insert(new_name.to_string(), wallet);
            }
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<(String, String, WalletType)> {
        self.blob
            .wallets
            .iter()
            .map(|w| (w.name.clone(), w.address.clone(), w.wallet_type))
            .collect()
    }

    pub fn address_of(&self, name: &str) -> CoreResult<String> {
        self.blob
            .wallets
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.address.clone())
            .ok_or_else(|| CoreError::UnknownWallet(name.to_string()))
    }

    /// Signs `message` with the named wallet's secret key. Requires the
    /// vault to be unlocked.
    pub fn sign(&self, name: &str, message: &[u8]) -> CoreResult<Vec<u8>> {
        let unlocked = self.unlocked()?;
        let wallet = unlocked
            .wallets
            .get(name)
            .ok_or_else(|| CoreError::UnknownWallet(name.to_string()))?;
        self.scheme
            .sign(wallet.secret_bytes(), message)
            .map_err(CoreError::ConfigurationError)
    }

    /// Signs the same message with every named wallet, short-circuiting on
    /// the first failure (an unknown name in the batch indicates caller
    /// error, not a per-wallet condition worth partial results for).
    pub fn sign_batch(&self, names: &[String], message: &[u8]) -> CoreResult<Vec<Vec<u8>>> {
        names.iter().map(|name| self.sign(name, message)).collect()
    }

    /// Raw bytes of the on-disk blob, for an operator-initiated backup.
    pub fn export_backup(&self, password: &str) -> CoreResult<Vec<u8>> {
        self.verify_password(password)?;
        serde_json::to_vec_pretty(&self.blob)
            .map_err(|e| CoreError::CorruptVault(format!("serializing backup: {e}")))
    }

    /// Restores from a previously exported blob. The vault must not already
    /// be bootstrapped — restoring over a live vault would silently discard
    /// its wallets. `password` must be the password the backup was
    /// encrypted under; a mismatch surfaces as `InvalidPassword` while
    /// decrypting the first wallet, and this vault's blob is left untouched
    /// (the parsed backup is only adopted once every wallet decrypts clean).
    pub fn import_backup(&mut self, data: &[u8], password: &str) -> CoreResult<()> {
        if self.is_bootstrapped() {
            return Err(CoreError::ConfigurationError(
                "refusing to import backup over an already-bootstrapped vault".into(),
            ));
        }
        validate_password_len(password)?;
        let blob: VaultBlob = serde_json::from_slice(data)
            .map_err(|e| CoreError::CorruptVault(format!("parsing backup: {e}")))?;

        let salt = crypto::decode_b64(&blob.salt_b64)?;
        let key = crypto::derive_key(password, &salt, blob.iterations);
        let mut wallets = HashMap::new();
        for record in &blob.wallets {
            let ciphertext = crypto::decode_b64(&record.encrypted_secret)?;
            let secret = crypto::decrypt(&ciphertext, &key)?;
            wallets.insert(
                record.name.clone(),
                UnlockedWallet::new(record.name.clone(), record.address.clone(), record.wallet_type, secret),
            );
        }

        self.blob = blob;
        self.unlocked = Some(Unlocked { key, wallets });
        self.persist()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_vault_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "trenchflow-vault-{label}-{}-{}.json",
            std::process::id(),
            label.len()
        ))
    }

    #[test]
    fn bootstrap_then_unlock_round_trips_wallets() {
        let path = temp_vault_path("roundtrip");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("correct horse battery staple").unwrap();

        let address = vault
            .generate("sniper-1", WalletType::Sniper, "correct horse battery staple")
            .unwrap();
        vault.lock();

        let mut reopened = Vault::open(&path).unwrap();
        assert!(reopened.unlock("wrong password").is_err());
        reopened.unlock("correct horse battery staple").unwrap();
        assert_eq!(reopened.address_of("sniper-1").unwrap(), address);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn bootstrap_rejects_password_outside_length_bounds() {
        let path = temp_vault_path("short-pw");
        let mut vault = Vault::open(&path).unwrap();
        let result = vault.bootstrap("short");
        assert!(matches!(result, Err(CoreError::ConfigurationError(_))));
        assert!(!vault.is_bootstrapped());

        let result = vault.bootstrap(&"x".repeat(300));
        assert!(matches!(result, Err(CoreError::ConfigurationError(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn mutators_reject_a_stale_unlock_under_the_wrong_password() {
        let path = temp_vault_path("staleunlock");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("first password!!").unwrap();

        let result = vault.generate("w1", WalletType::Burner, "wrong password");
        assert!(matches!(result, Err(CoreError::InvalidPassword)));
        assert!(vault.list().is_empty());

        vault.generate("w1", WalletType::Burner, "first password!!").unwrap();
        assert_eq!(vault.list().len(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn sign_requires_unlock() {
        let path = temp_vault_path("locked");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("correct horse battery staple").unwrap();
        vault
            .generate("w1", WalletType::Burner, "correct horse battery staple")
            .unwrap();
        vault.lock();

        let result = vault.sign("w1", b"message");
        assert!(matches!(result, Err(CoreError::Locked)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let path = temp_vault_path("dup");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("correct horse battery staple").unwrap();
        vault
            .generate("w1", WalletType::Burner, "correct horse battery staple")
            .unwrap();
        let result = vault.generate("w1", WalletType::Burner, "correct horse battery staple");
        assert!(matches!(result, Err(CoreError::WalletExists(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn remove_many_collects_unknown_wallet_failures() {
        let path = temp_vault_path("removemany");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("correct horse battery staple").unwrap();
        vault
            .generate("w1", WalletType::Burner, "correct horse battery staple")
            .unwrap();

        let (removed, failures) = vault
            .remove_many(
                &["w1".to_string(), "ghost".to_string()],
                "correct horse battery staple",
                &[],
            )
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "ghost");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn remove_refuses_protected_wallet() {
        let path = temp_vault_path("protected");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("correct horse battery staple").unwrap();
        let address = vault
            .generate("w1", WalletType::Burner, "correct horse battery staple")
            .unwrap();

        let result = vault.remove("w1", "correct horse battery staple", &[address]);
        assert!(matches!(result, Err(CoreError::ProtectedWallet(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn export_then_import_backup_round_trips_under_the_same_password() {
        let path = temp_vault_path("exportimport");
        let mut vault = Vault::open(&path).unwrap();
        vault.bootstrap("correct horse battery staple").unwrap();
        let address = vault
            .generate("w1", WalletType::Burner, "correct horse battery staple")
            .unwrap();
        let backup = vault.export_backup("correct horse battery staple").unwrap();

        let restore_path = temp_vault_path("exportimport-restore");
        let mut restored = Vault::open(&restore_path).unwrap();
        assert!(matches!(
            restored.import_backup(&backup, "wrong password"),
            Err(CoreError::InvalidPassword)
        ));
        assert!(!restored.is_bootstrapped());

        restored.import_backup(&backup, "correct horse battery staple").unwrap();
        assert_eq!(restored.address_of("w1").unwrap(), address);

        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&restore_path).ok();
    }
}
