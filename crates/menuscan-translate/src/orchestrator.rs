// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-item translation with bounded concurrency and per-field fallback.
//
// Every item name, and every non-empty description, becomes one provider
// call. Calls run through an ordered, bounded stream so results line up with
// segmentation order no matter which call finishes first. A call that times
// out is retried like any other transient failure; once retries run out the
// field keeps its original text. Nothing in here fails the request.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use menuscan_core::config::TranslationConfig;
use menuscan_core::error::{MenuscanError, Result};
use menuscan_core::types::{LanguageCode, MenuItem};
use tracing::{debug, info, instrument, warn};

use crate::provider::Translator;
use crate::retry::{RetryConfig, RetryDecision, should_retry};

/// What happened to one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    /// The provider could not translate; `original` is used verbatim.
    Fallback { original: String, reason: String },
}

impl TranslationOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Per-request field counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Fields the provider translated.
    pub translated: usize,
    /// Fields that kept their original text after a provider failure.
    pub fell_back: usize,
    /// Fields copied without a provider call (source equals target).
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
}

/// Translates segmented menu items through a [`Translator`].
#[derive(Clone)]
pub struct TranslationOrchestrator {
    translator: Arc<dyn Translator>,
    retry: RetryConfig,
    timeout: Duration,
    max_concurrency: usize,
    skip_same_language: bool,
    translate_raw_text: bool,
}

impl TranslationOrchestrator {
    pub fn new(translator: Arc<dyn Translator>, config: &TranslationConfig) -> Self {
        Self {
            translator,
            retry: RetryConfig::from_config(config),
            timeout: config.timeout(),
            max_concurrency: config.max_concurrency.max(1),
            skip_same_language: config.skip_same_language,
            translate_raw_text: config.translate_raw_text,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.translator.name()
    }

    /// Fill `name_translated` and `description_translated` on every item.
    ///
    /// Items come back in the order they were given. Empty descriptions
    /// stay empty without a provider call. An unknown `source` is never
    /// treated as equal to `target`.
    #[instrument(
        skip_all,
        fields(
            provider = self.translator.name(),
            items = items.len(),
            source = ?source,
            target = %target,
        )
    )]
    pub async fn translate_items(
        &self,
        mut items: Vec<MenuItem>,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> (Vec<MenuItem>, TranslationReport) {
        let mut report = TranslationReport::default();

        if self.skip_same_language && source == Some(target) {
            for item in &mut items {
                item.name_translated = item.name.clone();
                item.description_translated = item.description.clone();
                report.skipped += 1 + usize::from(!item.description.is_empty());
            }
            debug!(fields = report.skipped, "Source equals target, translation skipped");
            return (items, report);
        }

        let jobs: Vec<(usize, Field, String)> = items
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| {
                let name = (idx, Field::Name, item.name.clone());
                let description = (!item.description.is_empty())
                    .then(|| (idx, Field::Description, item.description.clone()));
                std::iter::once(name).chain(description)
            })
            .collect();

        let outcomes: Vec<(usize, Field, TranslationOutcome)> = stream::iter(jobs)
            .map(|(idx, field, text)| async move {
                let outcome = self.translate_text(&text, source, target).await;
                (idx, field, outcome)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        for (idx, field, outcome) in outcomes {
            if outcome.is_fallback() {
                report.fell_back += 1;
            } else {
                report.translated += 1;
            }
            let Some(item) = items.get_mut(idx) else {
                continue;
            };
            match field {
                Field::Name => item.name_translated = outcome.into_text(),
                Field::Description => item.description_translated = outcome.into_text(),
            }
        }

        info!(
            translated = report.translated,
            fell_back = report.fell_back,
            "Menu items translated"
        );
        (items, report)
    }

    /// Translate the whole recognized text when raw-text translation is
    /// enabled; `None` otherwise.
    pub async fn translate_raw(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> Option<String> {
        if !self.translate_raw_text {
            return None;
        }
        if self.skip_same_language && source == Some(target) {
            return Some(text.to_string());
        }
        Some(self.translate_text(text, source, target).await.into_text())
    }

    /// Translate one piece of text, falling back to the original on failure.
    pub async fn translate_text(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> TranslationOutcome {
        if text.trim().is_empty() {
            return TranslationOutcome::Translated(text.to_string());
        }

        match self.call_with_retry(text, source, target).await {
            Ok(translated) if translated.trim().is_empty() => {
                warn!(chars = text.len(), "Provider returned empty text, keeping original");
                TranslationOutcome::Fallback {
                    original: text.to_string(),
                    reason: "provider returned empty text".into(),
                }
            }
            Ok(translated) => TranslationOutcome::Translated(translated),
            Err(err) => {
                warn!(error = %err, chars = text.len(), "Translation failed, keeping original");
                TranslationOutcome::Fallback {
                    original: text.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn call_with_retry(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            let call = self.translator.translate(text, source, target);
            let result = match tokio::time::timeout(self.timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(MenuscanError::Timeout("translation request".into())),
            };

            let err = match result {
                Ok(translated) => return Ok(translated),
                Err(err) => err,
            };
            match should_retry(&err, attempt, &self.retry) {
                RetryDecision::RetryAfter(delay) => {
                    debug!(attempt, error = %err, "Retrying translation");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp | RetryDecision::Exhausted => return Err(err),
            }
        }
    }
}
