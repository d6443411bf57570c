//! On-disk vault blob persistence. Writes go to a sibling temp file followed
//! by a `rename`, so a crash mid-write leaves the previous blob intact
//! instead of a half-written file.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::vault::wallet::WalletRecord;

/// The vault blob's on-disk shape. `salt` and `iterations` are stored
/// alongside the ciphertext so the password can be re-derived into the same
/// key on every unlock without a separate config file.
#[derive(Debug, Serialize, Deserialize)]
pub struct VaultBlob {
    pub salt_b64: String,
    pub iterations: u32,
    pub wallets: Vec<WalletRecord>,
}

impl VaultBlob {
    pub fn new(salt_b64: String, iterations: u32) -> Self {
        Self {
            salt_b64,
            iterations,
            wallets: Vec::new(),
        }
    }
}

pub fn load(path: &Path) -> Result<VaultBlob, CoreError> {
    let data = fs::read_to_string(path)
        .map_err(|e| CoreError::CorruptVault(format!("reading {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| CoreError::CorruptVault(format!("parsing vault blob: {e}")))
}

pub fn exists(path: &Path) -> bool {
    path.is_file()
}

/// Writes `blob` atomically: serialize to `<path>.tmp`, fsync, then rename
/// over `path`. On unix the file is created with `0600` permissions so the
/// encrypted blob is never world- or group-readable.
pub fn save(path: &Path, blob: &VaultBlob) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CoreError::CorruptVault(format!("creating {}: {e}", parent.display())))?;
    }

    let tmp_path: PathBuf = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(blob)
        .map_err(|e| CoreError::CorruptVault(format!("serializing vault blob: {e}")))?;

    {
        let mut file = open_restricted(&tmp_path)
            .map_err(|e| CoreError::CorruptVault(format!("opening {}: {e}", tmp_path.display())))?;
        file.write_all(json.as_bytes())
            .map_err(|e| CoreError::CorruptVault(format!("writing {}: {e}", tmp_path.display())))?;
        file.sync_all().ok();
    }

    fs::rename(&tmp_path, path)
        .map_err(|e| CoreError::CorruptVault(format!("renaming into {}: {e}", path.display())))?;

    Ok(())
}

/// Opens `path` for a truncating write, `0600` on unix. Also used by
/// the first-run vault password sidecar (see `main.rs`), which needs the
/// same "never world- or group-readable" guarantee as the vault blob itself.
#[cfg(unix)]
pub(crate) fn open_restricted(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
pub(crate) fn open_restricted(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_atomic_save() {
        let dir = std::env::temp_dir().join(format!("trenchflow-vault-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("vault.json");

        let mut blob = VaultBlob::new("c2FsdA==".to_string(), 600_000);
        blob.wallets.push(WalletRecord {
            name: "w1".to_string(),
            address: "addr1".to_string(),
            wallet_type: crate::vault::wallet::WalletType::Sniper,
            encrypted_secret: "Zm9v".to_string(),
        });

        save(&path, &blob).unwrap();
        assert!(exists(&path));
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.wallets.len(), 1);
        assert_eq!(loaded.iterations, 600_000);

        fs::remove_dir_all(&dir).ok();
    }
}
