use serde::Serialize;
use serde_json::Value;

use crate::storage::KeyValueStore;

use super::PredictionRecord;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Key the serialized history lives under.
pub const HISTORY_KEY: &str = "fnd_history";

/// Maximum number of records kept.
pub const HISTORY_CAPACITY: usize = 20;

/// A history write that did not reach the backing store. The in-memory
/// sequence was still updated for this session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistenceWarning {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct HistoryUpdate {
    pub records: Vec<PredictionRecord>,
    pub warning: Option<PersistenceWarning>,
}

/// Newest-first bounded log of predictions, written through to a
/// [`KeyValueStore`] on every mutation.
pub struct HistoryStore<S> {
    backend: S,
    records: Vec<PredictionRecord>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Hydrate from whatever the backend currently holds.
    pub async fn open(backend: S) -> Self {
        let mut store = Self {
            backend,
            records: Vec::new(),
        };
        store.load().await;
        store
    }

    /// Replace the in-memory sequence with the persisted one. Never fails:
    /// unreadable state loads as empty and bad entries are skipped.
    pub async fn load(&mut self) -> &[PredictionRecord] {
        self.records = match self.backend.get(HISTORY_KEY).await {
            Ok(Some(raw)) => decode_history(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                log_warn!("Failed to read history, starting empty: {err:#}");
                Vec::new()
            }
        };
        &self.records
    }

    pub async fn prepend(&mut self, record: PredictionRecord) -> HistoryUpdate {
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAPACITY);
        self.persist().await
    }

    /// Out-of-range indices leave the sequence as it is (it is still re-persisted).
    pub async fn remove_at(&mut self, index: usize) -> HistoryUpdate {
        if index < self.records.len() {
            self.records.remove(index);
        }
        self.persist().await
    }

    pub async fn clear(&mut self) -> HistoryUpdate {
        self.records.clear();
        self.persist().await
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&PredictionRecord> {
        self.records.get(index)
    }

    pub fn newest(&self) -> Option<&PredictionRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn persist(&self) -> HistoryUpdate {
        let warning = match serde_json::to_string(&self.records) {
            Ok(serialized) => match self.backend.set(HISTORY_KEY, serialized).await {
                Ok(()) => None,
                Err(err) => Some(PersistenceWarning {
                    message: format!("History could not be saved: {err:#}"),
                }),
            },
            Err(err) => Some(PersistenceWarning {
                message: format!("History could not be serialized: {err}"),
            }),
        };

        if let Some(warning) = &warning {
            log_warn!("{}", warning.message);
        }

        HistoryUpdate {
            records: self.records.clone(),
            warning,
        }
    }
}

fn decode_history(raw: &str) -> Vec<PredictionRecord> {
    let entries = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) | Err(_) => {
            log_warn!("Persisted history is not a JSON array; ignoring it");
            return Vec::new();
        }
    };

    let total = entries.len();
    let mut records: Vec<PredictionRecord> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    if records.len() < total {
        log_info!(
            "Dropped {} malformed history entries",
            total - records.len()
        );
    }

    records.truncate(HISTORY_CAPACITY);
    records
}
