// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition: the engine seam, the tesseract-backed engine, a
// scripted engine for tests, and best-attempt selection.

pub mod mock;
pub mod recognizer;
pub mod select;
pub mod tesseract;

pub use mock::{MockRecognition, MockRecognizer};
pub use recognizer::{MultiConfigRecognizer, RecognizedText, TextRecognizer};
pub use select::select_best;
pub use tesseract::TesseractRecognizer;
