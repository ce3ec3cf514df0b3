// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// aligna-document: image-side processing for the Aligna document scanner.
//
// Provides corner detection, perspective rectification, aspect-ratio
// adjustment, and enhancement filters, built on a pluggable vision backend.

pub mod geometry;
pub mod image;
pub mod scan;
pub mod vision;

// Re-export the primary structs so callers can use `aligna_document::DocumentScanner` etc.
pub use image::processor::ImageProcessor;
pub use scan::{CornerDetector, Detection, DetectionFallback, DocumentScanner, FilterBank, Rectifier};
pub use vision::{ImageprocBackend, VisionBackend, vision_backend};
