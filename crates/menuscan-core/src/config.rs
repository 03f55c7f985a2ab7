// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MenuscanError, Result};
use crate::types::LanguageCode;

/// Environment variable overriding `translation.endpoint`.
pub const ENV_TRANSLATE_URL: &str = "MENUSCAN_TRANSLATE_URL";
/// Environment variable overriding `translation.api_key`.
pub const ENV_TRANSLATE_API_KEY: &str = "MENUSCAN_TRANSLATE_API_KEY";

/// Complete settings for one pipeline instance.
///
/// Every section defaults independently, so a config file only needs the
/// keys it wants to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub recognition: RecognitionConfig,
    pub detection: DetectionConfig,
    pub segmentation: SegmentationConfig,
    pub translation: TranslationConfig,
    pub pipeline: CoordinatorConfig,
}

/// Largest accepted binarization neighbourhood radius.
pub const MAX_BLOCK_RADIUS: u32 = 256;

/// Image normalisation before recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Inputs larger than this are rejected before decoding.
    pub max_image_bytes: usize,
    /// Contrast factor applied to the grayscale image (1.0 = unchanged).
    pub contrast_factor: f32,
    /// Gaussian blur sigma applied after grayscale conversion.
    pub blur_sigma: f32,
    /// Neighbourhood radius for adaptive binarization (5 = 11x11 window).
    pub block_radius: u32,
    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 16 * 1024 * 1024,
            contrast_factor: 1.0,
            blur_sigma: 1.1,
            block_radius: 5,
            threshold_offset: 2,
        }
    }
}

/// One page-segmentation configuration for the recognition engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionProfile {
    /// Short name used in logs and attempt labels.
    pub label: String,
    /// Tesseract `--psm` value.
    pub page_segmentation_mode: u8,
    /// Tesseract `--oem` value.
    pub engine_mode: u8,
}

impl RecognitionProfile {
    pub fn new(label: impl Into<String>, page_segmentation_mode: u8) -> Self {
        Self {
            label: label.into(),
            page_segmentation_mode,
            engine_mode: 3,
        }
    }
}

/// Multi-profile text recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Profiles evaluated on every request, in tie-break order.
    pub profiles: Vec<RecognitionProfile>,
    /// Per-profile timeout.
    pub timeout_secs: u64,
    /// Path or name of the tesseract executable.
    pub tesseract_binary: String,
    /// Tesseract `-l` argument.
    pub tesseract_languages: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            profiles: vec![
                RecognitionProfile::new("uniform-block", 6),
                RecognitionProfile::new("single-column", 4),
                RecognitionProfile::new("fully-automatic", 3),
            ],
            timeout_secs: 30,
            tesseract_binary: "tesseract".into(),
            tesseract_languages: "eng".into(),
        }
    }
}

impl RecognitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Source-language detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Returned whenever detection is inconclusive.
    pub fallback_language: LanguageCode,
    /// Inputs with fewer alphabetic characters skip detection.
    pub min_letters: usize,
    /// Minimum relative distance between the top two candidates.
    pub minimum_relative_distance: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fallback_language: LanguageCode::En,
            min_letters: 3,
            minimum_relative_distance: 0.0,
        }
    }
}

/// Menu segmentation heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Trimmed lines shorter than this (in characters) are noise.
    pub min_line_chars: usize,
    /// Append lowercase-initial, priceless lines to the previous description.
    pub merge_continuations: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_line_chars: 3,
            merge_continuations: true,
        }
    }
}

/// Translation provider and orchestration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of a LibreTranslate-compatible service.
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Per-call timeout.
    pub timeout_secs: u64,
    /// Maximum in-flight provider calls per request.
    pub max_concurrency: usize,
    /// Retries for transient failures (0 disables retrying).
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub retry_base_delay_ms: u64,
    /// Upper bound for a single backoff delay.
    pub retry_max_delay_ms: u64,
    /// Also translate the whole recognized text.
    pub translate_raw_text: bool,
    /// Skip provider calls when source and target language match.
    pub skip_same_language: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".into(),
            api_key: None,
            timeout_secs: 10,
            max_concurrency: 4,
            max_retries: 2,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 4_000,
            translate_raw_text: false,
            skip_same_language: true,
        }
    }
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request-level settings for the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Used when the caller does not name a target language.
    pub default_target_language: LanguageCode,
    /// Upper bound for a whole request.
    pub request_timeout_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_target_language: LanguageCode::En,
            request_timeout_secs: 120,
        }
    }
}

impl CoordinatorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PipelineConfig {
    /// Load a JSON config file, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&data)?;
        info!(path = %path.display(), "configuration loaded");
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `MENUSCAN_TRANSLATE_URL` / `MENUSCAN_TRANSLATE_API_KEY`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_TRANSLATE_URL).filter(|v| !v.trim().is_empty()) {
            debug!(%url, "translation endpoint overridden from environment");
            self.translation.endpoint = url;
        }
        if let Some(key) = lookup(ENV_TRANSLATE_API_KEY).filter(|v| !v.trim().is_empty()) {
            debug!("translation API key overridden from environment");
            self.translation.api_key = Some(key);
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.recognition.profiles.is_empty() {
            return Err(MenuscanError::NoRecognitionProfiles);
        }
        if self.recognition.timeout_secs == 0 {
            return Err(MenuscanError::Config(
                "recognition.timeout_secs must be at least 1".into(),
            ));
        }
        if self.translation.max_concurrency == 0 {
            return Err(MenuscanError::Config(
                "translation.max_concurrency must be at least 1".into(),
            ));
        }
        if self.translation.timeout_secs == 0 {
            return Err(MenuscanError::Config(
                "translation.timeout_secs must be at least 1".into(),
            ));
        }
        if self.pipeline.request_timeout_secs == 0 {
            return Err(MenuscanError::Config(
                "pipeline.request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.preprocess.max_image_bytes == 0 {
            return Err(MenuscanError::Config(
                "preprocess.max_image_bytes must be positive".into(),
            ));
        }
        if self.preprocess.contrast_factor.is_nan() || self.preprocess.contrast_factor <= 0.0 {
            return Err(MenuscanError::Config(
                "preprocess.contrast_factor must be positive".into(),
            ));
        }
        if self.preprocess.blur_sigma.is_nan() || self.preprocess.blur_sigma <= 0.0 {
            return Err(MenuscanError::Config(
                "preprocess.blur_sigma must be positive".into(),
            ));
        }
        if !(1..=MAX_BLOCK_RADIUS).contains(&self.preprocess.block_radius) {
            return Err(MenuscanError::Config(format!(
                "preprocess.block_radius must be between 1 and {MAX_BLOCK_RADIUS}"
            )));
        }
        Ok(())
    }
}
