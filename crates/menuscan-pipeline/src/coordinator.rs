// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline coordinator: validate -> preprocess -> recognize (all profiles)
// -> select -> detect language -> segment -> translate -> result.
//
// `MenuPipeline::process` never returns an error. Validation, decode and
// unexpected internal failures become a `success: false` result whose error
// string starts with the stage that failed. Recognition, detection and
// translation problems are absorbed further down and degrade the result
// instead of failing it.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use menuscan_core::config::PipelineConfig;
use menuscan_core::error::{MenuscanError, Result};
use menuscan_core::types::{LanguageCode, PipelineResult};
use menuscan_text::{LanguageDetector, MenuSegmenter};
use menuscan_translate::{LibreTranslateClient, TranslationOrchestrator, Translator};
use menuscan_vision::{
    MenuPreprocessor, MultiConfigRecognizer, TesseractRecognizer, TextRecognizer, select_best,
};
use tracing::{debug, info, instrument, warn};

/// Stage named in a failed result's error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validate,
    Decode,
    Recognize,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validate => "validate",
            Self::Decode => "decode",
            Self::Recognize => "recognize",
            Self::Internal => "internal",
        })
    }
}

#[derive(Debug)]
struct StageError {
    stage: Stage,
    error: MenuscanError,
}

impl StageError {
    fn new(stage: Stage, error: MenuscanError) -> Self {
        Self { stage, error }
    }

    /// Preprocessing errors split between bad input and our own failures.
    fn from_preprocess(error: MenuscanError) -> Self {
        let stage = match error {
            MenuscanError::ImageTooLarge { .. } | MenuscanError::UnsupportedFormat(_) => {
                Stage::Validate
            }
            MenuscanError::Decode(_) => Stage::Decode,
            _ => Stage::Internal,
        };
        Self::new(stage, error)
    }

    fn task(err: tokio::task::JoinError) -> Self {
        Self::new(
            Stage::Internal,
            MenuscanError::Internal(format!("worker task failed: {err}")),
        )
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

/// End-to-end menu pipeline.
///
/// Holds only immutable collaborators, so one instance can serve concurrent
/// requests; clones share the recognition engine, detector models and
/// translation provider.
#[derive(Clone)]
pub struct MenuPipeline {
    preprocessor: MenuPreprocessor,
    recognizer: MultiConfigRecognizer,
    detector: LanguageDetector,
    segmenter: MenuSegmenter,
    translations: TranslationOrchestrator,
    default_target: LanguageCode,
    request_timeout: Duration,
}

impl MenuPipeline {
    /// Assemble a pipeline around the given engine and provider.
    pub fn new(
        config: &PipelineConfig,
        engine: Arc<dyn TextRecognizer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            preprocessor: MenuPreprocessor::new(config.preprocess.clone()),
            recognizer: MultiConfigRecognizer::from_config(engine, &config.recognition),
            detector: LanguageDetector::new(&config.detection),
            segmenter: MenuSegmenter::new(config.segmentation.clone()),
            translations: TranslationOrchestrator::new(translator, &config.translation),
            default_target: config.pipeline.default_target_language,
            request_timeout: config.pipeline.request_timeout(),
        }
    }

    /// Production wiring: tesseract for recognition, LibreTranslate for
    /// translation.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let engine = Arc::new(TesseractRecognizer::from_config(&config.recognition));
        let translator = Arc::new(LibreTranslateClient::from_config(&config.translation)?);
        info!(
            tesseract = %config.recognition.tesseract_binary,
            endpoint = %config.translation.endpoint,
            "Menu pipeline configured"
        );
        Ok(Self::new(config, engine, translator))
    }

    pub fn default_target(&self) -> LanguageCode {
        self.default_target
    }

    /// Process one menu photo.
    ///
    /// `target` is a language code such as `"es"`; `None` (or blank) uses
    /// the configured default. Always returns a result, never an error.
    #[instrument(skip(self, image), fields(image_len = image.len()))]
    pub async fn process(&self, image: &[u8], target: Option<&str>) -> PipelineResult {
        let started = Instant::now();

        let target = match self.resolve_target(target) {
            Ok(target) => target,
            Err(err) => {
                let failure = StageError::new(Stage::Validate, err);
                warn!(error = %failure, "Request rejected");
                return PipelineResult::failure(None, failure.to_string());
            }
        };

        let result = match tokio::time::timeout(self.request_timeout, self.run(image, target)).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(failure)) => {
                warn!(error = %failure, "Menu processing failed");
                PipelineResult::failure(Some(target), failure.to_string())
            }
            Err(_) => {
                let failure =
                    StageError::new(Stage::Internal, MenuscanError::Timeout("request".into()));
                warn!(
                    timeout_secs = self.request_timeout.as_secs(),
                    "Menu processing abandoned"
                );
                PipelineResult::failure(Some(target), failure.to_string())
            }
        };

        info!(
            success = result.success,
            items = result.total_items,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Menu request finished"
        );
        result
    }

    fn resolve_target(&self, target: Option<&str>) -> Result<LanguageCode> {
        match target.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => code.parse(),
            None => Ok(self.default_target),
        }
    }

    async fn run(
        &self,
        image: &[u8],
        target: LanguageCode,
    ) -> std::result::Result<PipelineResult, StageError> {
        if image.is_empty() {
            return Err(StageError::new(
                Stage::Validate,
                MenuscanError::Decode("no image data".into()),
            ));
        }

        // Decoding and filtering are CPU-bound.
        let preprocessor = self.preprocessor.clone();
        let data = image.to_vec();
        let prepared = tokio::task::spawn_blocking(move || preprocessor.preprocess(&data))
            .await
            .map_err(StageError::task)?
            .map_err(StageError::from_preprocess)?;

        let attempts = self
            .recognizer
            .recognize_all(&prepared)
            .await
            .map_err(|err| StageError::new(Stage::Recognize, err))?;
        let selected = select_best(&attempts);

        let detector = self.detector.clone();
        let text = selected.text.clone();
        let detection = tokio::task::spawn_blocking(move || detector.detect_source(&text))
            .await
            .map_err(StageError::task)?;
        let detected = detection.language;

        let items = self.segmenter.segment(&selected.text);
        debug!(
            items = items.len(),
            source = %detected,
            source_detected = detection.detected,
            target = %target,
            "Menu text segmented"
        );

        let (items, report) = self
            .translations
            .translate_items(items, detection.source(), target)
            .await;
        if report.fell_back > 0 {
            warn!(
                fell_back = report.fell_back,
                provider = self.translations.provider_name(),
                "Some fields were left untranslated"
            );
        }
        let raw_text_translated = self
            .translations
            .translate_raw(&selected.text, detection.source(), target)
            .await;

        let mut result = PipelineResult::success(detected, target, selected, items);
        result.raw_text_translated = raw_text_translated;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuscan_translate::MockTranslator;
    use menuscan_vision::{MockRecognition, MockRecognizer};

    const SPANISH_MENU: &str = "Sopa del día - con pan casero $5.50\n\
                                Ensalada mixta - lechuga, tomate y cebolla $7\n\
                                Pollo asado con patatas y salsa de la casa $12";

    fn menu_photo() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(64, 48, image::Rgb([240, 235, 220]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn spanish_engine() -> MockRecognizer {
        MockRecognizer::new(MockRecognition::text("S0pa del dia", 40.0))
            .on("single-column", MockRecognition::text(SPANISH_MENU, 88.0))
    }

    fn pipeline_with(
        config: &PipelineConfig,
        engine: MockRecognizer,
        translator: &MockTranslator,
    ) -> (MenuPipeline, Arc<MockRecognizer>) {
        let engine = Arc::new(engine);
        let pipeline = MenuPipeline::new(config, engine.clone(), Arc::new(translator.clone()));
        (pipeline, engine)
    }

    fn pipeline(
        engine: MockRecognizer,
        translator: &MockTranslator,
    ) -> (MenuPipeline, Arc<MockRecognizer>) {
        pipeline_with(&PipelineConfig::default(), engine, translator)
    }

    #[tokio::test]
    async fn spanish_menu_is_translated_to_english() {
        let translator = MockTranslator::working();
        let (pipeline, engine) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), Some("en")).await;

        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(engine.calls(), 3);
        assert_eq!(result.detected_language, Some(LanguageCode::Es));
        assert_eq!(result.target_language, Some(LanguageCode::En));
        assert_eq!(result.confidence, 88.0);
        assert_eq!(result.raw_text, SPANISH_MENU);
        assert_eq!(result.total_items, 3);
        assert_eq!(result.total_items, result.menu_items.len());

        let soup = &result.menu_items[0];
        assert_eq!(soup.name, "Sopa del día");
        assert_eq!(soup.description, "con pan casero");
        assert_eq!(soup.price, "$5.50");
        assert_eq!(soup.name_translated, "[en] Sopa del día");
        assert_eq!(soup.description_translated, "[en] con pan casero");
        assert_eq!(soup.full_text, "Sopa del día - con pan casero $5.50");
        assert_eq!(result.raw_text_translated, None);
    }

    #[tokio::test]
    async fn missing_target_uses_the_default() {
        let translator = MockTranslator::working();
        let (pipeline, _) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), None).await;
        assert!(result.success);
        assert_eq!(result.target_language, Some(pipeline.default_target()));

        let blank = pipeline.process(&menu_photo(), Some("  ")).await;
        assert_eq!(blank.target_language, Some(LanguageCode::En));
    }

    #[tokio::test]
    async fn same_language_menu_is_not_sent_to_the_provider() {
        let translator = MockTranslator::working();
        let engine = MockRecognizer::new(MockRecognition::text(
            "Grilled salmon - served with fresh vegetables and lemon butter $18\n\
             Chocolate cake with vanilla ice cream $7",
            91.0,
        ));
        let (pipeline, _) = pipeline(engine, &translator);

        let result = pipeline.process(&menu_photo(), Some("en")).await;

        assert!(result.success);
        assert_eq!(result.detected_language, Some(LanguageCode::En));
        assert_eq!(translator.calls(), 0);
        for item in &result.menu_items {
            assert_eq!(item.name_translated, item.name);
            assert_eq!(item.description_translated, item.description);
        }
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_at_decode() {
        let translator = MockTranslator::working();
        let (pipeline, engine) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(b"definitely not an image", Some("en")).await;

        assert!(!result.success);
        let error = result.error.as_deref().unwrap();
        assert!(error.starts_with("decode: "), "error: {error}");
        assert_eq!(result.target_language, Some(LanguageCode::En));
        assert_eq!(result.total_items, 0);
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn empty_upload_fails_validation() {
        let translator = MockTranslator::working();
        let (pipeline, engine) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(&[], None).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("validate: "));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_fails_validation() {
        let mut config = PipelineConfig::default();
        config.preprocess.max_image_bytes = 16;
        let translator = MockTranslator::working();
        let (pipeline, engine) = pipeline_with(&config, spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), None).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("validate: "));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_target_fails_before_any_image_work() {
        let translator = MockTranslator::working();
        let (pipeline, engine) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), Some("tlh")).await;

        assert!(!result.success);
        assert_eq!(result.target_language, None);
        let error = result.error.as_deref().unwrap();
        assert!(error.starts_with("validate: "), "error: {error}");
        assert!(error.contains("tlh"));
        assert_eq!(engine.calls(), 0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("target_language").is_none());
    }

    #[tokio::test]
    async fn blank_recognition_is_a_successful_empty_result() {
        let translator = MockTranslator::working();
        let engine = MockRecognizer::new(MockRecognition::text("   ", 95.0))
            .on("uniform-block", MockRecognition::fail("engine crashed"));
        let (pipeline, _) = pipeline(engine, &translator);

        let result = pipeline.process(&menu_photo(), Some("es")).await;

        assert!(result.success);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.raw_text, "");
        assert_eq!(result.total_items, 0);
        assert!(result.menu_items.is_empty());
        assert_eq!(result.detected_language, Some(LanguageCode::En));
        assert_eq!(translator.calls(), 0);
    }

    #[tokio::test]
    async fn undetected_language_lets_the_provider_decide() {
        let translator = MockTranslator::working();
        let engine = MockRecognizer::new(MockRecognition::text("A1 $9\nB2 $7", 80.0));
        let (pipeline, _) = pipeline(engine, &translator);

        // The fallback equals the target, but the menu is still translated.
        let result = pipeline.process(&menu_photo(), Some("en")).await;

        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(result.detected_language, Some(LanguageCode::En));
        assert_eq!(result.total_items, 2);
        assert_eq!(translator.calls(), 2);
        assert_eq!(translator.auto_source_calls(), 2);
        assert_eq!(result.menu_items[0].name_translated, "[en] A1");
    }

    #[tokio::test]
    async fn detected_language_is_passed_to_the_provider() {
        let translator = MockTranslator::working();
        let (pipeline, _) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), Some("en")).await;

        assert!(result.success);
        assert!(translator.calls() > 0);
        assert_eq!(translator.auto_source_calls(), 0);
    }

    #[tokio::test]
    async fn failed_translations_keep_the_original_text() {
        let translator = MockTranslator::fail_on("pan casero");
        let (pipeline, _) = pipeline(spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), Some("en")).await;

        assert!(result.success);
        let soup = &result.menu_items[0];
        assert_eq!(soup.name_translated, "[en] Sopa del día");
        assert_eq!(soup.description_translated, "con pan casero");
        assert_eq!(result.menu_items[1].name_translated, "[en] Ensalada mixta");
    }

    #[tokio::test]
    async fn raw_text_translation_is_included_when_enabled() {
        let mut config = PipelineConfig::default();
        config.translation.translate_raw_text = true;
        let translator = MockTranslator::working();
        let (pipeline, _) = pipeline_with(&config, spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), Some("en")).await;

        let expected = MockTranslator::expected(SPANISH_MENU, LanguageCode::En);
        assert_eq!(result.raw_text_translated.as_deref(), Some(expected.as_str()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["raw_text_translated"], expected.as_str());
    }

    #[tokio::test]
    async fn repeated_requests_give_identical_results() {
        let translator = MockTranslator::working();
        let (pipeline, _) = pipeline(spanish_engine(), &translator);
        let photo = menu_photo();

        let first = pipeline.process(&photo, Some("fr")).await;
        let second = pipeline.process(&photo, Some("fr")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn no_profiles_fails_at_recognize() {
        let mut config = PipelineConfig::default();
        config.recognition.profiles.clear();
        let translator = MockTranslator::working();
        let (pipeline, _) = pipeline_with(&config, spanish_engine(), &translator);

        let result = pipeline.process(&menu_photo(), None).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("recognize: "));
    }

    #[tokio::test]
    async fn slow_requests_are_abandoned() {
        let mut config = PipelineConfig::default();
        config.pipeline.request_timeout_secs = 1;
        let translator = MockTranslator::working();
        let engine = MockRecognizer::new(MockRecognition::Hang);
        let (pipeline, _) = pipeline_with(&config, engine, &translator);

        let result = pipeline.process(&menu_photo(), Some("de")).await;

        assert!(!result.success);
        assert_eq!(result.target_language, Some(LanguageCode::De));
        let error = result.error.as_deref().unwrap();
        assert!(error.starts_with("internal: "), "error: {error}");
        assert!(error.contains("timed out"));
    }
}
