// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner detection: finds the dominant quadrilateral in a photo or scan and
// returns its four corners in [top-left, top-right, bottom-right, bottom-left]
// order.

use aligna_core::config::DetectionConfig;
use aligna_core::error::{AlignaError, Result};
use aligna_core::{CornerSet, Point};
use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::geometry::{Quadrant, distance, polygon_area};
use crate::vision::{Contour, VisionBackend};

/// Why the detector returned the image bounds instead of a traced outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionFallback {
    /// The binary mask contained no contours at all.
    NoContours,
    /// Every contour was degenerate (zero area).
    NoDocumentContour,
    /// The largest outline was the image frame: the page fills the photo.
    FullFrame,
    /// The chosen contour left at least one quadrant without a point.
    EmptyQuadrant,
}

/// Result of a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub corners: CornerSet,
    /// Set when the corners are the image bounds rather than a traced outline.
    pub fallback: Option<DetectionFallback>,
}

impl Detection {
    fn found(corners: CornerSet) -> Self {
        Self {
            corners,
            fallback: None,
        }
    }

    fn image_bounds(width: u32, height: u32, reason: DetectionFallback) -> Self {
        Self {
            corners: CornerSet::from_bounds(width as f64, height as f64),
            fallback: Some(reason),
        }
    }
}

/// Locates a document by tracing the outline of the largest region in an
/// Otsu-binarized copy of the image.
///
/// ## Pipeline
///
/// 1. Convert to grayscale
/// 2. Gaussian blur (5x5 by default) for noise reduction
/// 3. Otsu global binarization
/// 4. Trace outer and hole borders of every region
/// 5. Keep the contour with the largest enclosed area
/// 6. Split its points into quadrants around the centre of its minimum-area
///    rectangle and keep the point farthest from the centre in each
///
/// Every failure path degrades to the image's own bounding rectangle.
pub struct CornerDetector<'a> {
    backend: &'a dyn VisionBackend,
    config: &'a DetectionConfig,
}

impl<'a> CornerDetector<'a> {
    pub fn new(backend: &'a dyn VisionBackend, config: &'a DetectionConfig) -> Self {
        Self { backend, config }
    }

    /// Detect the document corners.
    ///
    /// Only a zero-size image is reported as an error, since not even the
    /// bounding-rectangle fallback exists for it.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<Detection> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(AlignaError::Detection(format!(
                "image has zero size ({width}x{height})"
            )));
        }
        info!(backend = self.backend.name(), "Starting document detection");

        let gray = self.backend.grayscale(image);
        let blurred = self.backend.gaussian_blur(&gray, self.config.blur_kernel);
        let level = self.backend.otsu_level(&blurred);
        let mask = self.backend.threshold(&blurred, level);
        debug!(level, "Otsu threshold computed");

        let contours = self.backend.find_contours(&mask);
        debug!(count = contours.len(), "Contours traced");
        if contours.is_empty() {
            warn!("No contours found; using image bounds");
            return Ok(Detection::image_bounds(
                width,
                height,
                DetectionFallback::NoContours,
            ));
        }

        let Some((contour, area)) = select_document_contour(
            &contours,
            width,
            height,
            self.config.ignore_frame_contours,
            self.config.min_document_fraction,
        ) else {
            warn!("No contour with positive area; using image bounds");
            return Ok(Detection::image_bounds(
                width,
                height,
                DetectionFallback::NoDocumentContour,
            ));
        };
        if self.config.ignore_frame_contours && touches_frame(&contour.points, width, height) {
            info!("Page fills the frame; using image bounds");
            return Ok(Detection::image_bounds(
                width,
                height,
                DetectionFallback::FullFrame,
            ));
        }
        debug!(
            area,
            points = contour.points.len(),
            is_hole = contour.is_hole,
            "Document contour selected"
        );

        match self.corners_from_contour(&contour.points) {
            Some(corners) => {
                info!(
                    top_left = ?corners.top_left(),
                    top_right = ?corners.top_right(),
                    bottom_right = ?corners.bottom_right(),
                    bottom_left = ?corners.bottom_left(),
                    "Document corners detected"
                );
                Ok(Detection::found(corners))
            }
            None => {
                warn!("Not all corners detected; using image bounds");
                Ok(Detection::image_bounds(
                    width,
                    height,
                    DetectionFallback::EmptyQuadrant,
                ))
            }
        }
    }

    /// Pick the farthest point from the contour centre in each quadrant.
    ///
    /// Returns `None` if any quadrant has no point.
    fn corners_from_contour(&self, points: &[Point]) -> Option<CornerSet> {
        let center = self.backend.min_area_rect_center(points)?;

        let mut best: [Option<(Point, f64)>; 4] = [None; 4];
        for &point in points {
            let Some(quadrant) = Quadrant::classify(point, center) else {
                continue;
            };
            let dist = distance(point, center);
            let slot = &mut best[quadrant.corner_index()];
            if slot.is_none_or(|(_, best_dist)| dist > best_dist) {
                *slot = Some((point, dist));
            }
        }

        let [top_left, top_right, bottom_right, bottom_left] = best;
        Some(CornerSet::new([
            top_left?.0,
            top_right?.0,
            bottom_right?.0,
            bottom_left?.0,
        ]))
    }
}

/// The contour with the largest enclosed area, with that area.
///
/// When `ignore_frame` is set, contours touching all four image borders give
/// way to the largest interior contour, provided it encloses at least
/// `min_fraction` of the image. A frame contour usually outlines the
/// background around the document; when nothing sizeable lies inside it, the
/// page itself fills the frame and the frame contour is returned.
fn select_document_contour(
    contours: &[Contour],
    width: u32,
    height: u32,
    ignore_frame: bool,
    min_fraction: f64,
) -> Option<(&Contour, f64)> {
    let largest = |frame: Option<bool>| {
        contours
            .iter()
            .filter(|contour| {
                frame.is_none_or(|frame| touches_frame(&contour.points, width, height) == frame)
            })
            .map(|contour| (contour, polygon_area(&contour.points)))
            .filter(|(_, area)| *area > 0.0)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    };

    if !ignore_frame {
        return largest(None);
    }
    let min_area = min_fraction * width as f64 * height as f64;
    match largest(Some(false)) {
        Some(inner) if inner.1 >= min_area => Some(inner),
        inner => largest(Some(true)).or(inner),
    }
}

/// Whether the points reach every edge of a `width` x `height` image.
fn touches_frame(points: &[Point], width: u32, height: u32) -> bool {
    let (right, bottom) = ((width - 1) as f64, (height - 1) as f64);
    let mut edges = [false; 4];
    for p in points {
        edges[0] |= p.x <= 0.0;
        edges[1] |= p.y <= 0.0;
        edges[2] |= p.x >= right;
        edges[3] |= p.y >= bottom;
    }
    edges.iter().all(|&touched| touched)
}
