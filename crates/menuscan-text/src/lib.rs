// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// menuscan-text. Text side of the Menuscan pipeline: source-language
// detection and segmentation of recognized text into menu items.

pub mod language;
pub mod segment;

pub use language::{Detection, LanguageDetector};
pub use segment::{MenuSegmenter, extract_price, segment_line};
