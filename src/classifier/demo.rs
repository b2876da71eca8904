//! Offline stand-in used when no endpoint is configured.
//!
//! Scores text by how much of it is shouted (runs of three or more capital
//! letters) plus some noise. It is not a model and makes no claim to be
//! predictive; the only guarantees are the clamp bounds and the label
//! threshold.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use super::{Classification, Classifier, ClassifierError};

pub const DEMO_MODEL: &str = "demo";

pub const MIN_CONFIDENCE: f64 = 0.05;
pub const MAX_CONFIDENCE: f64 = 0.99;
/// Blended scores above this are labelled "Fake".
pub const FAKE_THRESHOLD: f64 = 0.55;

const CAPS_WEIGHT: f64 = 0.8;
const NOISE_WEIGHT: f64 = 0.4;

/// Source of noise in `[0, 1)`.
pub trait RandomSource: Send + Sync + 'static {
    fn next_unit(&self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same value. Values outside `[0, 1)` are clamped into it.
#[cfg(test)]
pub(crate) struct FixedRandom(pub f64);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

fn shouty_tokens() -> &'static Regex {
    static SHOUTY: OnceLock<Regex> = OnceLock::new();
    SHOUTY.get_or_init(|| Regex::new(r"[A-Z]{3,}").expect("static regex is valid"))
}

/// Shouted runs per word. Empty text counts as one word.
pub fn caps_density(text: &str) -> f64 {
    let words = text.split_whitespace().count().max(1);
    let shouty = shouty_tokens().find_iter(text).count();
    shouty as f64 / words as f64
}

/// Pure scoring step: returns `(label, confidence, blended)` for a given noise draw.
pub fn demo_score(text: &str, noise: f64) -> (&'static str, f64, f64) {
    let blended = caps_density(text) * CAPS_WEIGHT + noise * NOISE_WEIGHT;
    let confidence = blended.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    let label = if blended > FAKE_THRESHOLD { "Fake" } else { "Real" };
    (label, confidence, blended)
}

pub struct DemoClassifier {
    random: Box<dyn RandomSource>,
}

impl DemoClassifier {
    pub fn new() -> Self {
        Self::with_random(ThreadRandom)
    }

    pub fn with_random(random: impl RandomSource) -> Self {
        Self {
            random: Box::new(random),
        }
    }
}

impl Default for DemoClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for DemoClassifier {
    fn model(&self) -> &str {
        DEMO_MODEL
    }

    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::empty_input());
        }

        let (label, confidence, _) = demo_score(text, self.random.next_unit());
        Ok(Classification {
            label: label.to_string(),
            confidence,
            model: DEMO_MODEL.to_string(),
        })
    }
}
