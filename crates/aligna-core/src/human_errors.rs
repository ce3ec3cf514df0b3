// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scanner UI.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity decides whether the UI shows a dismissible warning (the pipeline
// already recovered with a fallback result) or a blocking error.

use crate::error::AlignaError;

/// How the surrounding application should present an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A fallback result was produced; show a non-blocking notice.
    Warning,
    /// The operation cannot continue until the user changes something.
    Blocking,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives presentation in the UI).
    pub severity: Severity,
}

impl HumanError {
    fn warning(message: &str, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity: Severity::Warning,
        }
    }

    fn blocking(message: &str, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity: Severity::Blocking,
        }
    }
}

/// Convert an `AlignaError` into a `HumanError` suitable for display.
pub fn humanize_error(err: &AlignaError) -> HumanError {
    match err {
        // -- Recovered locally with a fallback --
        AlignaError::Detection(_) => HumanError::warning(
            "We couldn't find the document edges.",
            "The whole photo is selected instead. Drag the corners to the edges of your document.",
        ),

        AlignaError::Enhancement(_) => HumanError::warning(
            "The enhancement filter didn't work on this image.",
            "The unenhanced scan is shown instead. Try a different enhancement mode.",
        ),

        AlignaError::Transform(_) => HumanError::warning(
            "The document couldn't be straightened.",
            "The corners may be crossed or lined up. Move them apart so they outline the page.",
        ),

        // -- Geometry errors always stop the operation --
        AlignaError::InvalidCorners { count } => HumanError::blocking(
            "The document outline is incomplete.",
            format!("A document needs exactly four corners, but {count} were given. Run auto-detect again."),
        ),

        AlignaError::InvalidCornerIndex(_) => HumanError::blocking(
            "That corner doesn't exist.",
            "Pick one of the four corner handles.",
        ),

        AlignaError::InvalidRatio { .. } => HumanError::blocking(
            "That aspect ratio isn't valid.",
            "Both the width and the height must be numbers greater than zero.",
        ),

        AlignaError::CornersLocked => HumanError::blocking(
            "The document is locked.",
            "Unlock the document to move its corners.",
        ),

        AlignaError::DocumentNotLocked => HumanError::blocking(
            "Lock the document first.",
            "Aspect ratios can only be changed once the corners are locked in place.",
        ),

        // -- Input and output --
        AlignaError::ImageRead(_) => HumanError::blocking(
            "There's a problem with this image.",
            "The image may be damaged, empty, or in an unusual format. Try saving it as a JPEG or PNG first.",
        ),

        AlignaError::ImageEncode(_) => HumanError::blocking(
            "The scan couldn't be saved in that format.",
            "Try saving it as a PNG or JPEG instead.",
        ),

        AlignaError::Parse(detail) => HumanError::blocking(
            "Some of the input didn't make sense.",
            format!("Check the value and try again. ({detail})"),
        ),

        AlignaError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::blocking(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::blocking(
                "The app doesn't have permission to use that file.",
                "Check the file permissions, or pick a different location.",
            ),
            _ => HumanError::blocking(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your device's storage may be full.",
            ),
        },

        AlignaError::Serialization(_) => HumanError::blocking(
            "The settings file is damaged.",
            "Delete config.json to go back to the default settings.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_fallback_is_a_warning() {
        let human = humanize_error(&AlignaError::Detection("empty image".into()));
        assert_eq!(human.severity, Severity::Warning);
    }

    #[test]
    fn enhancement_fallback_is_a_warning() {
        let human = humanize_error(&AlignaError::Enhancement("zero-size input".into()));
        assert_eq!(human.severity, Severity::Warning);
    }

    #[test]
    fn invalid_corners_block_and_mention_count() {
        let human = humanize_error(&AlignaError::InvalidCorners { count: 3 });
        assert_eq!(human.severity, Severity::Blocking);
        assert!(human.suggestion.contains('3'));
    }

    #[test]
    fn invalid_ratio_blocks() {
        let err = AlignaError::InvalidRatio {
            width: 0.0,
            height: 1.0,
        };
        assert_eq!(humanize_error(&err).severity, Severity::Blocking);
    }

    #[test]
    fn missing_file_is_blocking() {
        let err = AlignaError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Blocking);
        assert!(human.message.contains("couldn't be found"));
    }
}
