use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::Classification;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("text is empty")]
    EmptyText,
    #[error("label is empty")]
    EmptyLabel,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// One completed classification. Immutable once built; the persisted shape
/// is `{"text","label","confidence","model","time"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct PredictionRecord {
    text: String,
    label: String,
    confidence: f64,
    model: String,
    /// Unix epoch milliseconds.
    time: i64,
}

#[derive(Deserialize)]
struct RawRecord {
    text: String,
    label: String,
    confidence: f64,
    #[serde(default)]
    model: String,
    time: i64,
}

impl TryFrom<RawRecord> for PredictionRecord {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        PredictionRecord::new(raw.text, raw.label, raw.confidence, raw.model, raw.time)
    }
}

impl PredictionRecord {
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
        model: impl Into<String>,
        time: i64,
    ) -> Result<Self, RecordError> {
        let text = text.into();
        let label = label.into();

        if text.trim().is_empty() {
            return Err(RecordError::EmptyText);
        }
        if label.trim().is_empty() {
            return Err(RecordError::EmptyLabel);
        }
        // NaN fails the range check too.
        if !(0.0..=1.0).contains(&confidence) {
            return Err(RecordError::ConfidenceOutOfRange(confidence));
        }

        Ok(Self {
            text,
            label,
            confidence,
            model: model.into(),
            time,
        })
    }

    pub fn from_classification(
        text: impl Into<String>,
        classification: Classification,
        time: i64,
    ) -> Result<Self, RecordError> {
        Self::new(
            text,
            classification.label,
            classification.confidence,
            classification.model,
            time,
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn time(&self) -> i64 {
        self.time
    }
}
