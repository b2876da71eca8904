#[cfg(feature = "desktop")]
pub mod commands;
pub mod record;
pub mod store;

pub use record::{PredictionRecord, RecordError};
pub use store::{HistoryStore, HistoryUpdate, PersistenceWarning, HISTORY_CAPACITY, HISTORY_KEY};
