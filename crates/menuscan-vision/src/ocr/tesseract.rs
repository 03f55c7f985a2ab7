// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract-backed recognition engine.
//
// Drives the `tesseract` executable in TSV output mode, one process per
// profile. The TSV word rows carry per-word confidences, so a single run
// yields both the text (rebuilt line by line) and an aggregate confidence.
//
// # Setup
//
// Tesseract 4 or newer must be installed with the language data named in
// `recognition.tesseract_languages`:
//
// ```sh
// apt install tesseract-ocr tesseract-ocr-eng
// ```

use std::process::Stdio;

use async_trait::async_trait;
use menuscan_core::config::{RecognitionConfig, RecognitionProfile};
use menuscan_core::error::{MenuscanError, Result};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::ocr::recognizer::{RecognizedText, TextRecognizer};
use crate::scan::preprocess::PreprocessedImage;

/// TSV row level for individual words.
const WORD_LEVEL: &str = "5";

/// Recognition engine that shells out to tesseract.
///
/// The child process is killed if the recognition future is dropped, so a
/// timed-out or cancelled request does not leave stray processes behind.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    languages: String,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }

    /// Build from the `recognition` config section.
    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self::new(
            config.tesseract_binary.clone(),
            config.tesseract_languages.clone(),
        )
    }

    /// Check that the executable can be started.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    #[instrument(skip_all, fields(profile = %profile.label, psm = profile.page_segmentation_mode))]
    async fn recognize(
        &self,
        image: &PreprocessedImage,
        profile: &RecognitionProfile,
    ) -> Result<RecognizedText> {
        let input = tempfile::Builder::new()
            .prefix("menuscan-")
            .suffix(".png")
            .tempfile()?;
        tokio::fs::write(input.path(), &image.png).await?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("--oem")
            .arg(profile.engine_mode.to_string())
            .arg("--psm")
            .arg(profile.page_segmentation_mode.to_string())
            .arg("-l")
            .arg(&self.languages)
            .arg("tsv")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                MenuscanError::Recognition(format!(
                    "failed to run {} (is tesseract installed?): {}",
                    self.binary, err
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MenuscanError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let recognized = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(
            confidence = recognized.confidence,
            lines = recognized.text.lines().count(),
            "Tesseract run parsed"
        );
        Ok(recognized)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Rebuild text and mean confidence from tesseract TSV output.
///
/// Words sharing a (block, paragraph, line) key form one output line; a blank
/// line separates paragraphs. Confidence is the mean over words whose
/// confidence is positive, or 0 when there are none.
pub fn parse_tsv(tsv: &str) -> RecognizedText {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line: Option<(&str, &str, &str)> = None;
    let mut current_paragraph: Option<(&str, &str)> = None;
    let mut confidence_sum = 0.0f64;
    let mut confidence_count = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }

        let word = cols[11..].join("\t");
        let word = word.trim();
        if word.is_empty() {
            continue;
        }

        match cols[10].trim().parse::<f64>() {
            Ok(conf) if conf > 0.0 => {
                confidence_sum += conf;
                confidence_count += 1;
            }
            Ok(_) => {}
            Err(_) => warn!(row, "Unparseable confidence in tesseract output"),
        }

        let paragraph = (cols[2], cols[3]);
        let line = (cols[2], cols[3], cols[4]);
        if current_line == Some(line) {
            if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(word);
            }
            continue;
        }

        if current_paragraph.is_some_and(|p| p != paragraph) {
            lines.push(String::new());
        }
        lines.push(word.to_string());
        current_line = Some(line);
        current_paragraph = Some(paragraph);
    }

    let confidence = if confidence_count == 0 {
        0.0
    } else {
        (confidence_sum / confidence_count as f64) as f32
    };

    RecognizedText {
        text: lines.join("\n"),
        confidence,
    }
}
