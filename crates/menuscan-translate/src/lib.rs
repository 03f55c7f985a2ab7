// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// menuscan-translate. Translation side of the Menuscan pipeline.
//
// A provider seam (`Translator`), an HTTP client for LibreTranslate-compatible
// services, a scripted provider for tests, the retry policy for transient
// provider failures, and the orchestrator that translates menu items with
// bounded concurrency and per-field fallback.

pub mod libretranslate;
pub mod mock;
pub mod orchestrator;
pub mod provider;
pub mod retry;

pub use libretranslate::LibreTranslateClient;
pub use mock::{MockBehavior, MockTranslator};
pub use orchestrator::{TranslationOrchestrator, TranslationOutcome, TranslationReport};
pub use provider::Translator;
pub use retry::RetryConfig;
