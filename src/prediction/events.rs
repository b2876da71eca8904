use crate::history::PredictionRecord;

use super::PredictionState;

/// What the presentation layer is told. The controller never renders anything itself.
pub trait PredictionEvents: Send + Sync + 'static {
    fn state_changed(&self, state: &PredictionState);
    fn result(&self, record: &PredictionRecord);
    fn error(&self, message: &str);
    fn history_changed(&self, records: &[PredictionRecord]);
    /// Non-fatal notice, shown as a toast.
    fn warning(&self, message: &str);
}

/// Drops everything. Useful for headless callers.
pub struct NoopEvents;

impl PredictionEvents for NoopEvents {
    fn state_changed(&self, _state: &PredictionState) {}
    fn result(&self, _record: &PredictionRecord) {}
    fn error(&self, _message: &str) {}
    fn history_changed(&self, _records: &[PredictionRecord]) {}
    fn warning(&self, _message: &str) {}
}

#[cfg(feature = "desktop")]
mod tauri_events {
    use serde::Serialize;
    use tauri::{AppHandle, Emitter};

    use super::PredictionEvents;
    use crate::{
        history::PredictionRecord,
        prediction::PredictionState,
        presentation::{history_views, HistoryItemView, ResultView},
    };

    #[derive(Serialize, Clone)]
    struct HistoryChangedEvent {
        records: Vec<PredictionRecord>,
        items: Vec<HistoryItemView>,
    }

    #[derive(Serialize, Clone)]
    struct MessageEvent<'a> {
        message: &'a str,
    }

    impl PredictionEvents for AppHandle {
        fn state_changed(&self, state: &PredictionState) {
            let _ = self.emit("prediction-state-changed", state);
        }

        fn result(&self, record: &PredictionRecord) {
            let _ = self.emit("prediction-result", ResultView::from_record(record));
        }

        fn error(&self, message: &str) {
            let _ = self.emit("prediction-error", MessageEvent { message });
        }

        fn history_changed(&self, records: &[PredictionRecord]) {
            let payload = HistoryChangedEvent {
                records: records.to_vec(),
                items: history_views(records),
            };
            let _ = self.emit("history-changed", payload);
        }

        fn warning(&self, message: &str) {
            let _ = self.emit("toast", MessageEvent { message });
        }
    }
}
