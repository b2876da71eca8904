pub mod classifier;
pub mod db;
pub mod history;
pub mod intake;
pub mod prediction;
pub mod presentation;
pub mod settings;
pub mod storage;
pub mod utils;

pub use db::Database;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::path::PathBuf;

    use log::{info, warn};
    use serde::Serialize;
    use tauri::{AppHandle, Emitter, Manager, State};

    use crate::{
        classifier::{AnyClassifier, Classifier, DemoClassifier},
        db::Database,
        history::{
            commands::{
                clear_history, delete_history_item, get_history, recall_history_item,
                reload_history,
            },
            HistoryStore,
        },
        intake,
        prediction::{
            commands::{get_prediction_state, submit_prediction},
            PredictionController,
        },
        settings::{SettingsStore, Theme},
        utils,
    };

    pub(crate) type AppController = PredictionController<AnyClassifier, Database, AppHandle>;

    pub(crate) struct AppState {
        pub(crate) prediction: AppController,
        pub(crate) settings: SettingsStore,
    }

    #[derive(Serialize, Clone)]
    #[serde(rename_all = "camelCase")]
    struct ClassifierInfo {
        model: String,
        endpoint: Option<String>,
    }

    #[tauri::command]
    fn get_classifier_info(state: State<AppState>) -> ClassifierInfo {
        ClassifierInfo {
            model: state.prediction.model().to_string(),
            endpoint: state.settings.endpoint(),
        }
    }

    #[tauri::command]
    fn get_theme(state: State<AppState>) -> Theme {
        state.settings.theme()
    }

    #[tauri::command]
    fn set_theme(
        theme: Theme,
        state: State<AppState>,
        app_handle: AppHandle,
    ) -> Result<(), String> {
        state
            .settings
            .update_theme(theme)
            .map_err(|e| e.to_string())?;

        app_handle
            .emit("theme-changed", theme)
            .map_err(|e| e.to_string())?;

        Ok(())
    }

    /// Read a dropped file so the frontend can put it in the editor.
    #[tauri::command]
    fn load_text_file(path: PathBuf) -> Result<String, String> {
        intake::read_text_file(&path).map_err(|e| e.to_string())
    }

    /// Decode a file chosen in the picker. The webview reads the bytes, so
    /// only its name and MIME type come along.
    #[tauri::command]
    fn load_selected_file(
        name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<String, String> {
        intake::read_selected_file(&name, mime.as_deref(), bytes).map_err(|e| e.to_string())
    }

    fn build_classifier(settings: &SettingsStore) -> AnyClassifier {
        let endpoint = settings.endpoint();
        match AnyClassifier::resolve(endpoint.as_deref(), settings.request_timeout()) {
            Ok(classifier) => classifier,
            Err(err) => {
                warn!("{err:#}; falling back to the demo classifier");
                AnyClassifier::Demo(DemoClassifier::new())
            }
        }
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        // Reads RUST_LOG on top of the default info level.
        utils::logging::init();

        info!("NewsLens starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let settings = SettingsStore::new(app_data_dir.join("settings.json"))?;
                    let classifier = build_classifier(&settings);
                    info!("Using the {} classifier", classifier.model());

                    let database = Database::new(app_data_dir.join("newslens.sqlite3"))?;
                    let history =
                        tauri::async_runtime::block_on(HistoryStore::open(database));
                    info!("Loaded {} history entries", history.len());

                    let prediction =
                        PredictionController::new(classifier, history, app.handle().clone());

                    app.manage(AppState {
                        prediction,
                        settings,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                submit_prediction,
                get_prediction_state,
                get_history,
                delete_history_item,
                clear_history,
                reload_history,
                recall_history_item,
                load_text_file,
                load_selected_file,
                get_theme,
                set_theme,
                get_classifier_info,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
