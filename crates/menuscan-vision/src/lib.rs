// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// menuscan-vision. Image side of the Menuscan pipeline.
//
// Provides image decoding and normalisation (grayscale, contrast, blur,
// adaptive binarization), text recognition under several page-segmentation
// profiles, and selection of the most confident recognition attempt.

pub mod image;
pub mod ocr;
pub mod scan;

// Re-export the primary structs so callers can use `menuscan_vision::MenuPreprocessor` etc.
pub use crate::image::processor::ImageProcessor;
pub use crate::ocr::mock::{MockRecognition, MockRecognizer};
pub use crate::ocr::recognizer::{MultiConfigRecognizer, RecognizedText, TextRecognizer};
pub use crate::ocr::select::select_best;
pub use crate::ocr::tesseract::TesseractRecognizer;
pub use crate::scan::preprocess::{MenuPreprocessor, PreprocessedImage};
