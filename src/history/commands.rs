use serde::Serialize;
use tauri::State;

use crate::{
    desktop::AppState,
    history::PredictionRecord,
    presentation::{history_views, HistoryItemView, ResultView, EMPTY_HISTORY_TEXT},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPayload {
    records: Vec<PredictionRecord>,
    items: Vec<HistoryItemView>,
    empty_text: &'static str,
}

impl From<Vec<PredictionRecord>> for HistoryPayload {
    fn from(records: Vec<PredictionRecord>) -> Self {
        Self {
            items: history_views(&records),
            records,
            empty_text: EMPTY_HISTORY_TEXT,
        }
    }
}

#[tauri::command]
pub async fn get_history(state: State<'_, AppState>) -> Result<HistoryPayload, String> {
    Ok(state.prediction.history().await.into())
}

#[tauri::command]
pub async fn delete_history_item(
    state: State<'_, AppState>,
    index: usize,
) -> Result<HistoryPayload, String> {
    Ok(state.prediction.delete_history_item(index).await.into())
}

#[tauri::command]
pub async fn clear_history(state: State<'_, AppState>) -> Result<HistoryPayload, String> {
    Ok(state.prediction.clear_history().await.into())
}

#[tauri::command]
pub async fn reload_history(state: State<'_, AppState>) -> Result<HistoryPayload, String> {
    Ok(state.prediction.reload_history().await.into())
}

/// Put a past result back on screen together with its text.
#[tauri::command]
pub async fn recall_history_item(
    state: State<'_, AppState>,
    index: usize,
) -> Result<Option<(String, ResultView)>, String> {
    Ok(state
        .prediction
        .recall_history_item(index)
        .await
        .map(|record| (record.text().to_string(), ResultView::from_record(&record))))
}
