use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

/// Overrides the configured classifier endpoint. An empty value disables it.
pub const ENDPOINT_ENV: &str = "NEWSLENS_ENDPOINT";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    /// Follow the system preference.
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// POST endpoint of the classification service. `None` selects the demo classifier.
    pub endpoint: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub theme: Theme,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> UserSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Configured endpoint after applying the environment override.
    pub fn endpoint(&self) -> Option<String> {
        resolve_endpoint(std::env::var(ENDPOINT_ENV).ok(), self.snapshot().endpoint)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.snapshot().request_timeout_ms.map(Duration::from_millis)
    }

    pub fn theme(&self) -> Theme {
        self.snapshot().theme
    }

    pub fn update_theme(&self, theme: Theme) -> Result<()> {
        self.update(|settings| settings.theme = theme)
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn resolve_endpoint(env_value: Option<String>, configured: Option<String>) -> Option<String> {
    env_value
        .or(configured)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}
