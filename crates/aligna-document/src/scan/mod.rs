// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: corner detection, perspective rectification, aspect-ratio
// adjustment, and enhancement filters.

pub mod detect;
pub mod enhance;
pub mod ratio;
pub mod rectify;

pub use detect::{CornerDetector, Detection, DetectionFallback};
pub use enhance::FilterBank;
pub use rectify::Rectifier;

use aligna_core::config::ScanConfig;
use aligna_core::error::Result;
use aligna_core::{AspectRatio, CornerSet, EnhancementMode, Point};
use image::DynamicImage;

use crate::vision::{VisionBackend, vision_backend};

/// Entry point for the whole pipeline.
///
/// Owns the [`VisionBackend`] and the [`ScanConfig`] and hands borrowed views
/// of both to the detector, rectifier, and filter bank on each call. A
/// scanner is `Send + Sync` and can be shared between threads.
///
/// ```ignore
/// let scanner = DocumentScanner::new(ScanConfig::default());
/// let corners = scanner.detect(&photo)?;
/// let page = scanner.rectify(&photo, &corners, None, None)?;
/// let page = scanner.enhance(&page, EnhancementMode::Magic);
/// ```
pub struct DocumentScanner {
    backend: Box<dyn VisionBackend>,
    config: ScanConfig,
}

impl DocumentScanner {
    /// Scanner using the default backend.
    pub fn new(config: ScanConfig) -> Self {
        Self::with_backend(vision_backend(), config)
    }

    pub fn with_backend(backend: Box<dyn VisionBackend>, config: ScanConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn VisionBackend {
        self.backend.as_ref()
    }

    // -- Detection --------------------------------------------------------------

    /// Document corners, or the image bounds when nothing is found.
    pub fn detect(&self, image: &DynamicImage) -> Result<CornerSet> {
        self.detect_with_report(image).map(|detection| detection.corners)
    }

    /// Like [`DocumentScanner::detect`], but also reports whether the result is
    /// a fallback.
    pub fn detect_with_report(&self, image: &DynamicImage) -> Result<Detection> {
        CornerDetector::new(self.backend(), &self.config.detection).detect(image)
    }

    // -- Rectification ----------------------------------------------------------

    pub fn rectify(
        &self,
        image: &DynamicImage,
        corners: &CornerSet,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<DynamicImage> {
        Rectifier::new(self.backend(), &self.config.rectify).rectify(image, corners, width, height)
    }

    pub fn rectify_points(
        &self,
        image: &DynamicImage,
        points: &[Point],
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<DynamicImage> {
        Rectifier::new(self.backend(), &self.config.rectify)
            .rectify_points(image, points, width, height)
    }

    // -- Aspect ratio -----------------------------------------------------------

    pub fn apply_ratio(&self, corners: &CornerSet, ratio: AspectRatio) -> Result<CornerSet> {
        ratio::apply_ratio(corners, ratio)
    }

    /// Fit a rectified image to `ratio` using the configured canvas fit.
    pub fn apply_ratio_to_image(
        &self,
        image: &DynamicImage,
        ratio: AspectRatio,
    ) -> Result<DynamicImage> {
        ratio::apply_ratio_to_image(image, ratio, self.config.ratio.canvas_fit)
    }

    /// Straighten `corners` when opposite edges differ by more than the
    /// configured skew tolerance.
    pub fn normalize_perspective(&self, corners: &CornerSet) -> CornerSet {
        ratio::normalize_perspective(corners, self.config.ratio.skew_tolerance)
    }

    pub fn detected_ratio(&self, corners: &CornerSet) -> (u32, u32) {
        ratio::detected_ratio(corners)
    }

    // -- Enhancement ------------------------------------------------------------

    pub fn enhance(&self, image: &DynamicImage, mode: EnhancementMode) -> DynamicImage {
        FilterBank::new(self.backend(), &self.config.enhance).enhance(image, mode)
    }

    pub fn try_enhance(&self, image: &DynamicImage, mode: EnhancementMode) -> Result<DynamicImage> {
        FilterBank::new(self.backend(), &self.config.enhance).try_enhance(image, mode)
    }
}

impl Default for DocumentScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
