//! Session types and the registry that owns them. A session is purely
//! in-process: `SessionHandle` owns its own `JoinSet` of wallet tasks and a
//! `shutdown_tx` broadcast sender every spawned task subscribes to, rather
//! than tracking a separate daemon process per session.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::task::JoinSet;
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Volume,
    Bot,
    Activity,
}

use serde::{Deserialize, Serialize};

/// Bounds driving every per-wallet loop iteration, resolved once at
/// `StartSession` regardless of kind: caller-supplied bounds for `volume`,
/// the snapshotted preset table row for `bot`/`activity`.
#[derive(Debug, Clone, Copy)]
pub struct LoopBounds {
    pub min_swap_native: f64,
    pub max_swap_native: f64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    /// `Some` only for `activity` sessions.
    pub transfer_chance: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub executed: u64,
    pub successful: u64,
    pub failed: u64,
    pub volume_native: f64,
    pub started_at: Option<DateTime<Utc>>,
}

pub(crate) struct SessionMutable {
    pub stats: SessionStats,
    pub running: bool,
    /// Distinct tokens swapped into this session, tracked for `sell_held`/
    /// activity-expiry cleanup rather than reconstructed from chain state.
    pub tokens_traded: HashSet<String>,
}

/// A running (or just-stopped) session and everything needed to cancel it.
pub struct SessionHandle {
    pub id: SessionId,
    pub kind: SessionKind,
    pub target: String,
    /// Vault wallet ids participating in this session (the identifier
    /// `Vault::sign`/`address_of` takes — see DESIGN.md for the naming
    /// decision relative to the data model's literal "wallet_addresses").
    pub wallet_ids: Vec<String>,
    pub bot_name: Option<String>,
    pub end_at: Option<DateTime<Utc>>,
    pub bounds: LoopBounds,
    pub(crate) mutable: StdMutex<SessionMutable>,
    pub(crate) shutdown_tx: broadcast::Sender<()>,
    pub(crate) tasks: AsyncMutex<JoinSet<()>>,
}

impl SessionHandle {
    pub fn new(
        id: SessionId,
        kind: SessionKind,
        target: String,
        wallet_ids: Vec<String>,
        bot_name: Option<String>,
        end_at: Option<DateTime<Utc>>,
        bounds: LoopBounds,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            id,
            kind,
            target,
            wallet_ids,
            bot_name,
            end_at,
            bounds,
            mutable: StdMutex::new(SessionMutable {
                stats: SessionStats {
                    started_at: Some(Utc::now()),
                    ..Default::default()
                },
                running: true,
                tokens_traded: HashSet::new(),
            }),
            shutdown_tx,
            tasks: AsyncMutex::new(JoinSet::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.mutable.lock().unwrap().running
    }

    pub fn mark_stopped(&self) {
        self.mutable.lock().unwrap().running = false;
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn signal_shutdown(&self) {
        self.mark_stopped();
        let _ = self.shutdown_tx.send(());
    }

    pub fn record_iteration(&self, success: bool, notional_native: f64) {
        let mut guard = self.mutable.lock().unwrap();
        guard.stats.executed += 1;
        if success {
            guard.stats.successful += 1;
            guard.stats.volume_native += notional_native;
        } else {
            guard.stats.failed += 1;
        }
    }

    pub fn record_token_traded(&self, token: &str) {
        self.mutable.lock().unwrap().tokens_traded.insert(token.to_string());
    }

    pub fn tokens_traded(&self) -> Vec<String> {
        self.mutable.lock().unwrap().tokens_traded.iter().cloned().collect()
    }

    pub fn snapshot_stats(&self) -> SessionStats {
        self.mutable.lock().unwrap().stats.clone()
    }
}

/// Process-wide registry of sessions. The registry mutex is held only long
/// enough to clone/insert/remove a handle — never across a `.await` or the
/// per-session mutex, per the acquisition order in §5 (registry → session,
/// never the reverse).
pub struct SessionRegistry {
    sessions: StdMutex<HashMap<SessionId, std::sync::Arc<SessionHandle>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: StdMutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, handle: std::sync::Arc<SessionHandle>) {
        self.sessions.lock().unwrap().insert(handle.id, handle);
    }

    pub fn get(&self, id: SessionId) -> Option<std::sync::Arc<SessionHandle>> {
        self.sessions.lock().unwrap().get(&id).cloned()
    }

    pub fn remove(&self, id: SessionId) -> Option<std::sync::Arc<SessionHandle>> {
        self.sessions.lock().unwrap().remove(&id)
    }

    pub fn running_count(&self, kind: SessionKind) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.kind == kind && s.is_running())
            .count()
    }

    pub fn running_bot_name_taken(&self, name: &str) -> bool {
        self.sessions.lock().unwrap().values().any(|s| {
            s.kind == SessionKind::Bot && s.is_running() && s.bot_name.as_deref() == Some(name)
        })
    }

    pub fn list_by_kind(&self, kind: SessionKind) -> Vec<std::sync::Arc<SessionHandle>> {
        self.sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect()
    }
}
