use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{Classification, Classifier, ClassifierError};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const REMOTE_MODEL: &str = "remote";

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

/// Only the fields we use; anything else in the body is ignored.
#[derive(Deserialize)]
struct PredictResponse {
    label: String,
    confidence: f64,
}

/// Posts `{"text": ...}` to a configured endpoint. One attempt per call.
pub struct RemoteClassifier {
    client: Client,
    endpoint: Url,
}

impl RemoteClassifier {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid classifier endpoint '{endpoint}'"))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

impl Classifier for RemoteClassifier {
    fn model(&self) -> &str {
        REMOTE_MODEL
    }

    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::empty_input());
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&PredictRequest { text })
            .send()
            .await
            .map_err(|err| {
                log_warn!("Request to {} failed: {err}", self.endpoint);
                ClassifierError::network()
            })?;

        let status = response.status();
        if !status.is_success() {
            log_warn!("Classifier at {} answered {status}", self.endpoint);
            return Err(ClassifierError::server(status.as_u16()));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|err| ClassifierError::malformed(err))?;

        if body.label.trim().is_empty() {
            return Err(ClassifierError::malformed("empty label"));
        }
        if !(0.0..=1.0).contains(&body.confidence) {
            return Err(ClassifierError::malformed(format!(
                "confidence {} outside [0, 1]",
                body.confidence
            )));
        }

        log_info!(
            "Remote classifier returned {} ({:.3})",
            body.label,
            body.confidence
        );

        Ok(Classification {
            label: body.label,
            confidence: body.confidence,
            model: REMOTE_MODEL.to_string(),
        })
    }
}
