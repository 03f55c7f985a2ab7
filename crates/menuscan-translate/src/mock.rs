// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted translation provider for deterministic tests.
//
// - `MockTranslator::working()` prefixes the text with the target code
// - `MockTranslator::failing()` always fails with a permanent error
// - `MockTranslator::fail_on(..)` fails only for texts containing a marker
// - `MockTranslator::slow(..)` sleeps before answering
// - `MockTranslator::flaky(..)` fails transiently a fixed number of times

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use menuscan_core::error::{MenuscanError, Result};
use menuscan_core::types::LanguageCode;

use crate::provider::Translator;

/// Behavior mode for the mock translator.
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `"[<target>] <text>"`.
    Working,
    /// Always fails with a 400 provider error.
    Failing,
    /// Fails with a 400 provider error when the text contains this marker.
    FailOn(String),
    /// Succeeds after sleeping for the given delay.
    Slow(Duration),
    /// Fails with a 503 for the first `failures` calls, then works.
    Flaky { failures: usize },
}

/// Mock translator that records how it was used.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    auto_source_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            auto_source_calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_on(marker: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailOn(marker.into()))
    }

    pub fn slow(delay: Duration) -> Self {
        Self::new(MockBehavior::Slow(delay))
    }

    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::Flaky { failures })
    }

    /// The translation `Working` produces for `text`.
    pub fn expected(text: &str, target: LanguageCode) -> String {
        format!("[{}] {}", target.code(), text)
    }

    /// Number of `translate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls made without a source language.
    pub fn auto_source_calls(&self) -> usize {
        self.auto_source_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, text: &str, target: LanguageCode, call: usize) -> Result<String> {
        match &self.behavior {
            MockBehavior::Working => Ok(Self::expected(text, target)),
            MockBehavior::Failing => Err(rejected("mock provider always fails")),
            MockBehavior::FailOn(marker) if text.contains(marker.as_str()) => {
                Err(rejected("mock provider rejected this text"))
            }
            MockBehavior::FailOn(_) => Ok(Self::expected(text, target)),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::expected(text, target))
            }
            MockBehavior::Flaky { failures } if call < *failures => Err(MenuscanError::Provider {
                status: 503,
                message: "mock provider temporarily unavailable".into(),
            }),
            MockBehavior::Flaky { .. } => Ok(Self::expected(text, target)),
        }
    }
}

fn rejected(message: &str) -> MenuscanError {
    MenuscanError::Provider {
        status: 400,
        message: message.into(),
    }
}

/// Decrements the in-flight counter when a call ends or is cancelled.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if source.is_none() {
            self.auto_source_calls.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        self.answer(text, target, call).await
    }

    fn name(&self) -> &str {
        "mock"
    }
}
