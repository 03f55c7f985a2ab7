// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Menuscan.

use thiserror::Error;

/// Top-level error type for all Menuscan operations.
#[derive(Debug, Error)]
pub enum MenuscanError {
    // -- Image errors --
    #[error("could not read image: {0}")]
    Decode(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image is {size} bytes, limit is {max}")]
    ImageTooLarge { size: usize, max: usize },

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Recognition errors --
    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("no recognition profiles configured")]
    NoRecognitionProfiles,

    #[error("language detection failed: {0}")]
    Detection(String),

    // -- Translation errors --
    #[error("translation failed: {0}")]
    Translation(String),

    #[error("translation provider responded with {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    // -- Shared --
    #[error("{0} timed out")]
    Timeout(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MenuscanError>;
