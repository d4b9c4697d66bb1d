use skyfare_core::repository::HistoryRepository;
use skyfare_core::CoreError;
use skyfare_shared::models::events::HistoryResetEvent;
use skyfare_shared::{HistoryEntry, SearchDraft};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::app_config::HistoryConfig;

pub const DEFAULT_CAPACITY: usize = 5;

/// Result of initializing history from persisted bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored yet
    Empty,
    Loaded(usize),
    /// Stored payload was unreadable and has been discarded
    Reset { reason: String },
}

/// Bounded most-recent-first list of past searches.
///
/// Pure in-memory structure; `load` and `flush` convert to and from the
/// persisted JSON array so the owner decides where the bytes live.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SearchHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Replace the contents with a persisted payload. Never fails: anything
    /// unreadable leaves the history empty and reports `Reset`.
    pub fn load(&mut self, payload: Option<&str>) -> LoadOutcome {
        self.entries.clear();

        let payload = match payload.map(str::trim) {
            None | Some("") => return LoadOutcome::Empty,
            Some(p) => p,
        };

        let parsed: Vec<HistoryEntry> = match serde_json::from_str(payload) {
            Ok(entries) => entries,
            Err(e) => return LoadOutcome::Reset { reason: e.to_string() },
        };

        for entry in parsed {
            if self.entries.len() == self.capacity {
                break;
            }
            if !self.entries.iter().any(|e| e.key == entry.key) {
                self.entries.push_back(entry);
            }
        }
        LoadOutcome::Loaded(self.entries.len())
    }

    /// Serialized form, most recent first
    pub fn flush(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Add an entry as the most recent. An existing entry with the same key is
    /// moved instead of duplicated. Returns the evicted entry, if any.
    pub fn record(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        self.entries.retain(|e| e.key != entry.key);
        self.entries.push_front(entry);

        if self.entries.len() <= self.capacity {
            return None;
        }

        // Oldest by saved_at; on equal timestamps the one further back goes.
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by(|(ia, a), (ib, b)| a.saved_at.cmp(&b.saved_at).then(ib.cmp(ia)))
            .map(|(i, _)| i)?;
        self.entries.remove(oldest)
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// `SearchHistory` bound to an external storage slot. Writes through on every
/// record; storage failures are logged and never reach the caller.
pub struct HistoryStore {
    repo: Arc<dyn HistoryRepository>,
    key: String,
    history: RwLock<SearchHistory>,
    // Held from snapshot to write so the slot always ends with the latest snapshot
    persist: Mutex<()>,
}

impl HistoryStore {
    pub async fn init(repo: Arc<dyn HistoryRepository>, config: &HistoryConfig) -> (Self, LoadOutcome) {
        let mut history = SearchHistory::new(config.capacity);

        let outcome = match repo.read(&config.key).await {
            Ok(payload) => history.load(payload.as_deref()),
            Err(e) => LoadOutcome::Reset { reason: format!("storage read failed: {}", e) },
        };

        match &outcome {
            LoadOutcome::Reset { reason } => {
                let err = CoreError::StorageCorruption(reason.clone());
                let event = HistoryResetEvent {
                    storage_key: config.key.clone(),
                    reason: reason.clone(),
                    timestamp: chrono::Utc::now().timestamp(),
                };
                warn!(
                    "{} ({}): {}",
                    err.title(),
                    err,
                    serde_json::to_string(&event).unwrap_or_default()
                );
                // Overwrite the corrupt slot so the next start is clean
                if let Err(e) = repo.write(&config.key, &history.flush()).await {
                    warn!("Failed to clear corrupt history under {}: {}", config.key, e);
                }
            }
            LoadOutcome::Loaded(count) => info!("Loaded {} history entries from {}", count, config.key),
            LoadOutcome::Empty => {}
        }

        let store = Self {
            repo,
            key: config.key.clone(),
            history: RwLock::new(history),
            persist: Mutex::new(()),
        };
        (store, outcome)
    }

    pub async fn record(&self, entry: HistoryEntry) {
        let _persisting = self.persist.lock().await;
        let payload = {
            let mut history = self.history.write().await;
            if let Some(evicted) = history.record(entry) {
                info!("History full, evicted {}", evicted.key);
            }
            history.flush()
        };

        if let Err(e) = self.repo.write(&self.key, &payload).await {
            warn!("Failed to persist search history under {}: {}", self.key, e);
        }
    }

    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.history.read().await.list()
    }

    /// Form values for a remembered search
    pub async fn restore(&self, key: &str) -> Option<SearchDraft> {
        self.history.read().await.get(key).map(HistoryEntry::to_draft)
    }
}
