pub mod demo;
pub mod remote;

use std::{future::Future, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use demo::{demo_score, DemoClassifier, RandomSource, ThreadRandom};
pub use remote::RemoteClassifier;

/// Normalized output shared by every classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "status", rename_all = "camelCase")]
pub enum ClassifierErrorKind {
    EmptyInput,
    NetworkError,
    ServerError(u16),
    MalformedResponse,
    /// The submit was dropped before the classifier answered.
    Interrupted,
}

/// A failed classification. `message` is what the user sees.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct ClassifierError {
    pub kind: ClassifierErrorKind,
    pub message: String,
}

impl ClassifierError {
    pub fn empty_input() -> Self {
        Self {
            kind: ClassifierErrorKind::EmptyInput,
            message: "Text is empty".into(),
        }
    }

    pub fn network() -> Self {
        Self {
            kind: ClassifierErrorKind::NetworkError,
            message: "Network error. Please check your connection.".into(),
        }
    }

    pub fn server(status: u16) -> Self {
        Self {
            kind: ClassifierErrorKind::ServerError(status),
            message: format!("Server error {status}"),
        }
    }

    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        Self {
            kind: ClassifierErrorKind::MalformedResponse,
            message: format!("Prediction failed. Unexpected response: {detail}"),
        }
    }

    pub fn interrupted() -> Self {
        Self {
            kind: ClassifierErrorKind::Interrupted,
            message: "Prediction failed. Try again.".into(),
        }
    }
}

pub trait Classifier: Send + Sync + 'static {
    /// Tag stored on every record this classifier produces.
    fn model(&self) -> &str;

    fn classify(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Classification, ClassifierError>> + Send;
}

/// The classifier chosen at startup: remote when an endpoint is configured,
/// the demo heuristic otherwise.
pub enum AnyClassifier {
    Remote(RemoteClassifier),
    Demo(DemoClassifier),
}

impl AnyClassifier {
    pub fn resolve(endpoint: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        match endpoint.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => Ok(Self::Remote(RemoteClassifier::new(url, timeout)?)),
            None => Ok(Self::Demo(DemoClassifier::new())),
        }
    }
}

impl Classifier for AnyClassifier {
    fn model(&self) -> &str {
        match self {
            Self::Remote(classifier) => classifier.model(),
            Self::Demo(classifier) => classifier.model(),
        }
    }

    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        match self {
            Self::Remote(classifier) => classifier.classify(text).await,
            Self::Demo(classifier) => classifier.classify(text).await,
        }
    }
}
