use serde::Serialize;

use crate::{classifier::ClassifierError, history::PredictionRecord};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PredictionStatus {
    Idle,
    Pending,
    Settled,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Settlement {
    Success { record: PredictionRecord },
    Failure { error: ClassifierError },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PredictionState {
    Idle,
    Pending { text: String },
    Settled(Settlement),
}

impl Default for PredictionState {
    fn default() -> Self {
        PredictionState::Idle
    }
}

impl PredictionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PredictionStatus {
        match self {
            PredictionState::Idle => PredictionStatus::Idle,
            PredictionState::Pending { .. } => PredictionStatus::Pending,
            PredictionState::Settled(_) => PredictionStatus::Settled,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PredictionState::Pending { .. })
    }

    /// Move to `Pending` unless a request is already in flight. Returns whether it moved.
    pub fn begin(&mut self, text: &str) -> bool {
        if self.is_pending() {
            return false;
        }
        *self = PredictionState::Pending {
            text: text.to_string(),
        };
        true
    }

    pub fn succeed(&mut self, record: PredictionRecord) {
        *self = PredictionState::Settled(Settlement::Success { record });
    }

    pub fn fail(&mut self, error: ClassifierError) {
        *self = PredictionState::Settled(Settlement::Failure { error });
    }

    pub fn record(&self) -> Option<&PredictionRecord> {
        match self {
            PredictionState::Settled(Settlement::Success { record }) => Some(record),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifierError> {
        match self {
            PredictionState::Settled(Settlement::Failure { error }) => Some(error),
            _ => None,
        }
    }
}
