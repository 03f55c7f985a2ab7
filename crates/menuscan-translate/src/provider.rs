// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Translation provider seam.

use async_trait::async_trait;
use menuscan_core::error::Result;
use menuscan_core::types::LanguageCode;

/// A machine-translation backend.
///
/// Implementations translate one piece of text per call and report failures
/// as [`menuscan_core::error::MenuscanError`] so the retry policy can tell
/// transient from permanent problems.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`. A `source` of `None` asks the
    /// provider to detect the source language itself.
    async fn translate(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> Result<String>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
