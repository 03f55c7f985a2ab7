// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Best-attempt selection across recognition profiles.

use menuscan_core::types::{RecognitionAttempt, SelectedText};
use tracing::debug;

/// Pick the attempt with the strictly highest confidence.
///
/// Attempts with blank text are never chosen. Ties go to the earliest
/// attempt. When no attempt has any text the result is empty with
/// confidence 0.
pub fn select_best(attempts: &[RecognitionAttempt]) -> SelectedText {
    let mut best: Option<&RecognitionAttempt> = None;
    for attempt in attempts.iter().filter(|a| !a.text.trim().is_empty()) {
        if best.is_none_or(|current| attempt.confidence > current.confidence) {
            best = Some(attempt);
        }
    }

    match best {
        Some(winner) => {
            debug!(
                profile = %winner.label,
                confidence = winner.confidence,
                "Selected recognition attempt"
            );
            SelectedText {
                text: winner.text.clone(),
                confidence: winner.confidence,
            }
        }
        None => {
            debug!("No recognition attempt produced text");
            SelectedText::default()
        }
    }
}
