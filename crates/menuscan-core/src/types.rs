// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Menuscan pipeline.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::MenuscanError;

/// Languages the pipeline can detect and translate into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Ja,
    Ko,
    Zh,
    Ar,
    Hi,
}

impl LanguageCode {
    /// Every supported language, in a stable order.
    pub const ALL: [LanguageCode; 12] = [
        Self::En,
        Self::Es,
        Self::Fr,
        Self::De,
        Self::It,
        Self::Pt,
        Self::Ru,
        Self::Ja,
        Self::Ko,
        Self::Zh,
        Self::Ar,
        Self::Hi,
    ];

    /// ISO 639-1 code, as used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ru => "ru",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Zh => "zh",
            Self::Ar => "ar",
            Self::Hi => "hi",
        }
    }

    /// English display name (for logs and CLI help).
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
            Self::Fr => "French",
            Self::De => "German",
            Self::It => "Italian",
            Self::Pt => "Portuguese",
            Self::Ru => "Russian",
            Self::Ja => "Japanese",
            Self::Ko => "Korean",
            Self::Zh => "Chinese",
            Self::Ar => "Arabic",
            Self::Hi => "Hindi",
        }
    }

    /// Parse a language code, case-insensitively.
    ///
    /// A region suffix (`pt-BR`, `zh_CN`) is accepted and dropped.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.code() == primary)
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = MenuscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| MenuscanError::UnsupportedLanguage(s.to_string()))
    }
}

/// One recognition run under a single page-segmentation profile.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAttempt {
    /// Recognized text (empty when the run failed).
    pub text: String,
    /// Mean word confidence, 0–100.
    pub confidence: f32,
    /// Label of the profile that produced this attempt.
    pub label: String,
}

impl RecognitionAttempt {
    /// Zero-confidence placeholder for a run that failed or timed out.
    pub fn failed(label: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            label: label.into(),
        }
    }
}

/// The attempt chosen for downstream processing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectedText {
    pub text: String,
    pub confidence: f32,
}

/// A single dish extracted from the menu.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
    pub name_translated: String,
    pub description_translated: String,
    pub full_text: String,
}

impl MenuItem {
    /// Build an untranslated item and compute its `full_text`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        let mut item = Self {
            name: name.into(),
            description: description.into(),
            price: price.into(),
            ..Default::default()
        };
        item.refresh_full_text();
        item
    }

    /// Rebuild `full_text` from name, description and price.
    pub fn refresh_full_text(&mut self) {
        let mut full = self.name.clone();
        if !self.description.is_empty() {
            full.push_str(" - ");
            full.push_str(&self.description);
        }
        if !self.price.is_empty() {
            full.push(' ');
            full.push_str(&self.price);
        }
        self.full_text = full;
    }
}

/// Retry classification for external-call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Timeout, dropped connection, rate limit, provider 5xx. Worth retrying.
    Transient,
    /// Unsupported pair, bad request, auth failure. Retrying won't help.
    Permanent,
}

/// The structured answer for one menu image.
///
/// Serialises to the full record on success and to
/// `{ success: false, error }` (plus `target_language` when known) on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub success: bool,
    pub detected_language: Option<LanguageCode>,
    pub target_language: Option<LanguageCode>,
    pub confidence: f32,
    pub raw_text: String,
    /// Only populated when raw-text translation is enabled.
    pub raw_text_translated: Option<String>,
    pub menu_items: Vec<MenuItem>,
    pub total_items: usize,
    pub error: Option<String>,
}

impl PipelineResult {
    /// Successful result; `total_items` is derived from `menu_items`.
    pub fn success(
        detected_language: LanguageCode,
        target_language: LanguageCode,
        selected: SelectedText,
        menu_items: Vec<MenuItem>,
    ) -> Self {
        Self {
            success: true,
            detected_language: Some(detected_language),
            target_language: Some(target_language),
            confidence: selected.confidence,
            raw_text: selected.text,
            raw_text_translated: None,
            total_items: menu_items.len(),
            menu_items,
            error: None,
        }
    }

    /// Failed result carrying a human-readable error.
    pub fn failure(target_language: Option<LanguageCode>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            detected_language: None,
            target_language,
            confidence: 0.0,
            raw_text: String::new(),
            raw_text_translated: None,
            menu_items: Vec::new(),
            total_items: 0,
            error: Some(error.into()),
        }
    }
}

impl Serialize for PipelineResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.success {
            let len = 2 + usize::from(self.target_language.is_some());
            let mut state = serializer.serialize_struct("PipelineResult", len)?;
            state.serialize_field("success", &false)?;
            if let Some(target) = &self.target_language {
                state.serialize_field("target_language", target)?;
            }
            state.serialize_field("error", self.error.as_deref().unwrap_or("unknown error"))?;
            return state.end();
        }

        let len = 7 + usize::from(self.raw_text_translated.is_some());
        let mut state = serializer.serialize_struct("PipelineResult", len)?;
        state.serialize_field("success", &true)?;
        state.serialize_field("detected_language", &self.detected_language)?;
        state.serialize_field("target_language", &self.target_language)?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("raw_text", &self.raw_text)?;
        if let Some(translated) = &self.raw_text_translated {
            state.serialize_field("raw_text_translated", translated)?;
        }
        state.serialize_field("menu_items", &self.menu_items)?;
        state.serialize_field("total_items", &self.total_items)?;
        state.end()
    }
}
