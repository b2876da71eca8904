use tauri::State;

use crate::{
    desktop::{AppController, AppState},
    prediction::PredictionState,
};

fn controller_from_state(state: &State<'_, AppState>) -> AppController {
    state.prediction.clone()
}

#[tauri::command]
pub async fn get_prediction_state(state: State<'_, AppState>) -> Result<PredictionState, String> {
    let controller = controller_from_state(&state);
    Ok(controller.snapshot().await)
}

/// Settles before returning. Classifier failures come back as a settled
/// failure state; `Err` only for empty input or a request already in flight.
#[tauri::command]
pub async fn submit_prediction(
    state: State<'_, AppState>,
    text: String,
) -> Result<PredictionState, String> {
    let controller = controller_from_state(&state);
    controller.submit(&text).await.map_err(|e| e.to_string())
}
