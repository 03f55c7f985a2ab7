// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-profile text recognition.
//
// The recognition engine sits behind the `TextRecognizer` trait so the
// pipeline can be driven by tesseract in production and by scripted engines
// in tests. `MultiConfigRecognizer` evaluates every configured profile
// against the same image, each under its own timeout, and turns failures into
// zero-confidence attempts instead of errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use menuscan_core::config::{RecognitionConfig, RecognitionProfile};
use menuscan_core::error::{MenuscanError, Result};
use menuscan_core::types::RecognitionAttempt;
use tracing::{debug, info, instrument, warn};

use crate::scan::preprocess::PreprocessedImage;

/// Text plus the engine's confidence for one recognition run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognizedText {
    pub text: String,
    /// Aggregate confidence, 0–100.
    pub confidence: f32,
}

/// A text-recognition engine.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in `image` using the given page-segmentation profile.
    async fn recognize(
        &self,
        image: &PreprocessedImage,
        profile: &RecognitionProfile,
    ) -> Result<RecognizedText>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

/// Runs one engine under every configured profile.
#[derive(Clone)]
pub struct MultiConfigRecognizer {
    engine: Arc<dyn TextRecognizer>,
    profiles: Vec<RecognitionProfile>,
    timeout: Duration,
}

impl MultiConfigRecognizer {
    pub fn new(
        engine: Arc<dyn TextRecognizer>,
        profiles: Vec<RecognitionProfile>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            profiles,
            timeout,
        }
    }

    /// Build from the `recognition` config section.
    pub fn from_config(engine: Arc<dyn TextRecognizer>, config: &RecognitionConfig) -> Self {
        Self::new(engine, config.profiles.clone(), config.timeout())
    }

    /// Run every profile against `image` and return one attempt per profile,
    /// in profile order.
    ///
    /// All profiles run concurrently and to completion. A profile that fails
    /// or exceeds the timeout yields an empty, zero-confidence attempt.
    ///
    /// # Errors
    ///
    /// [`MenuscanError::NoRecognitionProfiles`] when no profiles are configured.
    #[instrument(skip_all, fields(engine = self.engine.name(), profiles = self.profiles.len()))]
    pub async fn recognize_all(&self, image: &PreprocessedImage) -> Result<Vec<RecognitionAttempt>> {
        if self.profiles.is_empty() {
            return Err(MenuscanError::NoRecognitionProfiles);
        }

        let runs = self
            .profiles
            .iter()
            .map(|profile| self.run_profile(image, profile));
        let attempts = join_all(runs).await;

        let succeeded = attempts.iter().filter(|a| !a.text.trim().is_empty()).count();
        info!(
            attempts = attempts.len(),
            with_text = succeeded,
            "Recognition profiles evaluated"
        );
        Ok(attempts)
    }

    async fn run_profile(
        &self,
        image: &PreprocessedImage,
        profile: &RecognitionProfile,
    ) -> RecognitionAttempt {
        let label = profile.label.as_str();
        match tokio::time::timeout(self.timeout, self.engine.recognize(image, profile)).await {
            Ok(Ok(recognized)) => {
                let confidence = sanitize_confidence(recognized.confidence);
                debug!(
                    profile = label,
                    confidence,
                    chars = recognized.text.len(),
                    "Recognition run complete"
                );
                RecognitionAttempt {
                    text: recognized.text,
                    confidence,
                    label: label.to_string(),
                }
            }
            Ok(Err(err)) => {
                warn!(profile = label, error = %err, "Recognition run failed");
                RecognitionAttempt::failed(label)
            }
            Err(_) => {
                warn!(
                    profile = label,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Recognition run timed out"
                );
                RecognitionAttempt::failed(label)
            }
        }
    }
}

/// Clamp engine-reported confidence into [0, 100]; non-finite values become 0.
fn sanitize_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
