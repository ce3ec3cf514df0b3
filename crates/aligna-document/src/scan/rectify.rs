// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: maps the quadrilateral bounded by four corners
// onto an upright rectangle.

use aligna_core::config::RectifyConfig;
use aligna_core::error::{AlignaError, Result};
use aligna_core::{CornerSet, Point};
use image::DynamicImage;
use tracing::{debug, info, instrument};

use crate::geometry::document_size;
use crate::image::MAX_DIMENSION;
use crate::vision::VisionBackend;

/// Warps a document region to a top-down rectangle.
pub struct Rectifier<'a> {
    backend: &'a dyn VisionBackend,
    config: &'a RectifyConfig,
}

impl<'a> Rectifier<'a> {
    pub fn new(backend: &'a dyn VisionBackend, config: &'a RectifyConfig) -> Self {
        Self { backend, config }
    }

    /// Output dimensions for `corners`.
    ///
    /// Missing dimensions default to the longer of each pair of opposite
    /// edges. Both are rounded and clamped to the configured minimum. Sizes
    /// above [`MAX_DIMENSION`] are a `Transform` error.
    pub fn output_size(
        &self,
        corners: &CornerSet,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<(u32, u32)> {
        let (doc_w, doc_h) = document_size(corners);
        let min = self.config.min_dimension.max(1) as f64;
        let w = width.map_or(doc_w, f64::from).max(min).round();
        let h = height.map_or(doc_h, f64::from).max(min).round();
        let limit = MAX_DIMENSION as f64;
        if w > limit || h > limit {
            return Err(AlignaError::Transform(format!(
                "output size {w}x{h} exceeds the {MAX_DIMENSION} pixel limit"
            )));
        }
        Ok((w as u32, h as u32))
    }

    /// Rectify `image` to an upright rectangle bounded by `corners`.
    ///
    /// The output is RGBA. Destination pixels that sample outside the source
    /// are transparent black.
    #[instrument(skip(self, image), fields(src_w = image.width(), src_h = image.height()))]
    pub fn rectify(
        &self,
        image: &DynamicImage,
        corners: &CornerSet,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<DynamicImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AlignaError::ImageRead(
                "cannot rectify an image with zero size".into(),
            ));
        }
        if corners
            .points()
            .iter()
            .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(AlignaError::Transform("corner coordinates must be finite".into()));
        }

        let (out_w, out_h) = self.output_size(corners, width, height)?;
        info!(out_w, out_h, "Rectifying document");

        // Corner order as fed to the solver: TL, TR, BL, BR.
        let c = corners.points();
        let from = [c[0], c[1], c[3], c[2]];
        let (w, h) = (out_w as f64, out_h as f64);
        let to = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(0.0, h),
            Point::new(w, h),
        ];

        let warped = self
            .backend
            .warp_perspective(&image.to_rgba8(), from, to, out_w, out_h)
            .ok_or_else(|| {
                AlignaError::Transform("corners do not define a valid perspective transform".into())
            })?;
        debug!("Perspective warp complete");
        Ok(DynamicImage::ImageRgba8(warped))
    }

    /// Like [`Rectifier::rectify`], but takes a raw point list that must hold
    /// exactly four points.
    pub fn rectify_points(
        &self,
        image: &DynamicImage,
        points: &[Point],
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<DynamicImage> {
        let corners = CornerSet::from_points(points)?;
        self.rectify(image, &corners, width, height)
    }
}
