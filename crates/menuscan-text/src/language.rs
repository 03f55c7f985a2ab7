// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source-language detection.
//
// Statistical detection with `lingua`, restricted to the languages the
// pipeline supports. Inconclusive or too-short input never errors out of
// `detect`; it resolves to the configured fallback language.

use std::sync::Arc;

use lingua::{Language, LanguageDetectorBuilder};
use menuscan_core::config::DetectionConfig;
use menuscan_core::error::{MenuscanError, Result};
use menuscan_core::types::LanguageCode;
use tracing::{debug, instrument, warn};

/// Result of detecting the language of one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub language: LanguageCode,
    /// False when `language` is the configured fallback.
    pub detected: bool,
}

impl Detection {
    /// Source language to give a translator. `None` when the language is
    /// only the fallback, so the provider detects it itself.
    pub fn source(&self) -> Option<LanguageCode> {
        self.detected.then_some(self.language)
    }
}

/// Detects which supported language a piece of recognized text is in.
///
/// The underlying models are immutable after construction; clones share
/// them.
#[derive(Clone)]
pub struct LanguageDetector {
    detector: Arc<lingua::LanguageDetector>,
    fallback: LanguageCode,
    min_letters: usize,
}

impl LanguageDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        let languages: Vec<Language> = LanguageCode::ALL.into_iter().map(to_lingua).collect();
        let detector = LanguageDetectorBuilder::from_languages(&languages)
            .with_minimum_relative_distance(config.minimum_relative_distance.clamp(0.0, 0.99))
            .build();
        Self {
            detector: Arc::new(detector),
            fallback: config.fallback_language,
            min_letters: config.min_letters,
        }
    }

    /// Language returned whenever detection is inconclusive.
    pub fn fallback(&self) -> LanguageCode {
        self.fallback
    }

    /// Best-guess language of `text`, or the fallback.
    pub fn detect(&self, text: &str) -> LanguageCode {
        self.detect_source(text).language
    }

    /// Like [`detect`](Self::detect), but records whether the fallback was
    /// used.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn detect_source(&self, text: &str) -> Detection {
        match self.try_detect(text) {
            Ok(language) => {
                debug!(%language, "Source language detected");
                Detection {
                    language,
                    detected: true,
                }
            }
            Err(err) => {
                warn!(error = %err, fallback = %self.fallback, "Language detection inconclusive");
                Detection {
                    language: self.fallback,
                    detected: false,
                }
            }
        }
    }

    /// Detect without falling back.
    ///
    /// # Errors
    ///
    /// [`MenuscanError::Detection`] when the text has too few letters or the
    /// detector cannot separate the candidates.
    pub fn try_detect(&self, text: &str) -> Result<LanguageCode> {
        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if letters < self.min_letters {
            return Err(MenuscanError::Detection(format!(
                "only {} letters, need at least {}",
                letters, self.min_letters
            )));
        }

        self.detector
            .detect_language_of(text)
            .map(from_lingua)
            .ok_or_else(|| MenuscanError::Detection("no language stood out".into()))
    }
}

fn to_lingua(code: LanguageCode) -> Language {
    match code {
        LanguageCode::En => Language::English,
        LanguageCode::Es => Language::Spanish,
        LanguageCode::Fr => Language::French,
        LanguageCode::De => Language::German,
        LanguageCode::It => Language::Italian,
        LanguageCode::Pt => Language::Portuguese,
        LanguageCode::Ru => Language::Russian,
        LanguageCode::Ja => Language::Japanese,
        LanguageCode::Ko => Language::Korean,
        LanguageCode::Zh => Language::Chinese,
        LanguageCode::Ar => Language::Arabic,
        LanguageCode::Hi => Language::Hindi,
    }
}

fn from_lingua(language: Language) -> LanguageCode {
    LanguageCode::ALL
        .into_iter()
        .find(|code| to_lingua(*code) == language)
        .unwrap_or(LanguageCode::En)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> LanguageDetector {
        LanguageDetector::new(&DetectionConfig::default())
    }

    #[test]
    fn detects_common_menu_languages() {
        let detector = detector();
        assert_eq!(
            detector.detect("Grilled salmon served with fresh vegetables and lemon butter sauce"),
            LanguageCode::En
        );
        assert_eq!(
            detector.detect("La sopa del día se sirve con pan casero y aceite de oliva"),
            LanguageCode::Es
        );
        assert_eq!(
            detector.detect("Das Schnitzel wird mit Kartoffelsalat und Preiselbeeren serviert"),
            LanguageCode::De
        );
        assert_eq!(detector.detect("寿司と刺身の盛り合わせ、味噌汁付き"), LanguageCode::Ja);
    }

    #[test]
    fn empty_and_short_input_fall_back() {
        let detector = detector();
        assert_eq!(detector.detect(""), LanguageCode::En);
        assert_eq!(detector.detect("ab"), LanguageCode::En);
        assert_eq!(detector.detect("12345 $6.50"), LanguageCode::En);
        assert!(matches!(
            detector.try_detect("x1"),
            Err(MenuscanError::Detection(_))
        ));
    }

    #[test]
    fn fallback_is_marked_as_undetected() {
        let detector = detector();
        let guessed = detector.detect_source("A1 $9");
        assert_eq!(guessed.language, LanguageCode::En);
        assert!(!guessed.detected);
        assert_eq!(guessed.source(), None);

        let found =
            detector.detect_source("La sopa del día se sirve con pan casero y aceite de oliva");
        assert!(found.detected);
        assert_eq!(found.source(), Some(LanguageCode::Es));
    }

    #[test]
    fn fallback_is_configurable() {
        let detector = LanguageDetector::new(&DetectionConfig {
            fallback_language: LanguageCode::Fr,
            ..DetectionConfig::default()
        });
        assert_eq!(detector.fallback(), LanguageCode::Fr);
        assert_eq!(detector.detect("42"), LanguageCode::Fr);
    }

    #[test]
    fn detection_is_deterministic() {
        let detector = detector();
        let text = "Caesar Salad - Fresh romaine lettuce with parmesan cheese $12.99";
        assert_eq!(detector.detect(text), detector.detect(text));
    }

    #[test]
    fn lingua_mapping_round_trips() {
        for code in LanguageCode::ALL {
            assert_eq!(from_lingua(to_lingua(code)), code);
        }
    }
}
