// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted recognition engine for tests and offline runs.
//
// Each profile label can be given its own outcome; unlisted labels use the
// default outcome. Results are fully deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use menuscan_core::config::RecognitionProfile;
use menuscan_core::error::{MenuscanError, Result};

use crate::ocr::recognizer::{RecognizedText, TextRecognizer};
use crate::scan::preprocess::PreprocessedImage;

/// What the mock engine does for one profile.
#[derive(Debug, Clone)]
pub enum MockRecognition {
    /// Return this text and confidence.
    Text { text: String, confidence: f32 },
    /// Fail with a recognition error.
    Fail(String),
    /// Never finish (for timeout testing).
    Hang,
}

impl MockRecognition {
    pub fn text(text: impl Into<String>, confidence: f32) -> Self {
        Self::Text {
            text: text.into(),
            confidence,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail(reason.into())
    }
}

/// Deterministic [`TextRecognizer`] keyed by profile label.
#[derive(Debug)]
pub struct MockRecognizer {
    default: MockRecognition,
    by_label: HashMap<String, MockRecognition>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(default: MockRecognition) -> Self {
        Self {
            default,
            by_label: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Script the outcome for one profile label.
    pub fn on(mut self, label: impl Into<String>, outcome: MockRecognition) -> Self {
        self.by_label.insert(label.into(), outcome);
        self
    }

    /// Number of `recognize` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn recognize(
        &self,
        _image: &PreprocessedImage,
        profile: &RecognitionProfile,
    ) -> Result<RecognizedText> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.by_label.get(&profile.label).unwrap_or(&self.default);
        match outcome {
            MockRecognition::Text { text, confidence } => Ok(RecognizedText {
                text: text.clone(),
                confidence: *confidence,
            }),
            MockRecognition::Fail(reason) => Err(MenuscanError::Recognition(reason.clone())),
            MockRecognition::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
