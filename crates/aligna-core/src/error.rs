// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Aligna.

use thiserror::Error;

/// Top-level error type for all Aligna operations.
#[derive(Debug, Error)]
pub enum AlignaError {
    // -- Detection / decoding --
    #[error("document detection failed: {0}")]
    Detection(String),

    #[error("image could not be read: {0}")]
    ImageRead(String),

    #[error("image encoding failed: {0}")]
    ImageEncode(String),

    // -- Geometry --
    #[error("expected exactly 4 corner points, got {count}")]
    InvalidCorners { count: usize },

    #[error("corner index {0} is out of range (0..4)")]
    InvalidCornerIndex(usize),

    #[error("invalid aspect ratio {width}:{height} (both sides must be positive)")]
    InvalidRatio { width: f64, height: f64 },

    #[error("perspective transform failed: {0}")]
    Transform(String),

    // -- Enhancement --
    #[error("enhancement failed: {0}")]
    Enhancement(String),

    // -- Session --
    #[error("corners are locked; unlock the document before editing")]
    CornersLocked,

    #[error("the document must be locked before changing the aspect ratio")]
    DocumentNotLocked,

    // -- Input parsing / persistence --
    #[error("could not parse {0}")]
    Parse(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AlignaError>;
