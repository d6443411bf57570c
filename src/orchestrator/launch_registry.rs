//! Append-only record of wallets that created a token. There is no daemon
//! process per session to track, so this is a plain load/save/atomic-rewrite
//! file rather than a process registry.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub wallet_address: String,
    pub token_mint: String,
    pub name: String,
    pub symbol: String,
    pub created_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LaunchRegistryFile {
    records: Vec<LaunchRecord>,
}

pub struct LaunchRegistry {
    path: PathBuf,
    records: Mutex<Vec<LaunchRecord>>,
}

impl LaunchRegistry {
    pub fn open(path: impl Into<PathBuf>) -> CoreResultAlias<Self> {
        let path = path.into();
        let records = if path.is_file() {
            let data = fs::read_to_string(&path)
                .map_err(|e| CoreError::CorruptVault(format!("reading {}: {e}", path.display())))?;
            let file: LaunchRegistryFile = serde_json::from_str(&data)
                .map_err(|e| CoreError::CorruptVault(format!("parsing launch registry: {e}")))?;
            file.records
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Appends a record and persists atomically (write-temp-then-`rename`,
    /// the same pattern as the vault blob).
    pub fn append(
        &self,
        wallet_address: String,
        token_mint: String,
        name: String,
        symbol: String,
    ) -> CoreResultAlias<()> {
        let record = LaunchRecord {
            wallet_address,
            token_mint,
            name,
            symbol,
            created_at: Utc::now().to_rfc3339(),
        };

        let mut guard = self.records.lock().unwrap();
        guard.push(record);
        self.persist(&guard)
    }

    /// Addresses referenced by any launch record — used by the Vault's
    /// remove/remove_many guard and by the Treasury Mover's protected-
    /// wallet check on orchestrator-initiated cleanup paths.
    pub fn protected_addresses(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.wallet_address.clone())
            .collect()
    }

    fn persist(&self, records: &[LaunchRecord]) -> CoreResultAlias<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CoreError::CorruptVault(format!("creating {}: {e}", parent.display())))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&LaunchRegistryFile {
            records: records.to_vec(),
        })
        .map_err(|e| CoreError::CorruptVault(format!("serializing launch registry: {e}")))?;
        fs::write(&tmp_path, json)
            .map_err(|e| CoreError::CorruptVault(format!("writing {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| CoreError::CorruptVault(format!("renaming into {}: {e}", self.path.display())))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

type CoreResultAlias<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_persists_and_reopens() {
        let path = std::env::temp_dir().join(format!(
            "trenchflow-launch-registry-test-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let registry = LaunchRegistry::open(&path).unwrap();
        registry
            .append(
                "addr1".to_string(),
                "mint1".to_string(),
                "Name".to_string(),
                "SYM".to_string(),
            )
            .unwrap();

        let reopened = LaunchRegistry::open(&path).unwrap();
        assert_eq!(reopened.protected_addresses(), vec!["addr1".to_string()]);

        fs::remove_file(&path).ok();
    }
}
