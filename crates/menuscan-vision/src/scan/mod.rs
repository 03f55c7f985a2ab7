// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Menu photo normalisation: grayscale, denoise, and adaptive binarization
// ahead of text recognition.

pub mod preprocess;

pub use preprocess::{MenuPreprocessor, PreprocessedImage};
