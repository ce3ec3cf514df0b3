// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Aspect-ratio adjustment of corner sets and rectified images, plus
// perspective straightening.

use aligna_core::config::CanvasFit;
use aligna_core::error::{AlignaError, Result};
use aligna_core::{AspectRatio, CornerSet, Point};
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::geometry::{EdgeLengths, centroid, document_size, simplify_ratio};
use crate::image::ImageProcessor;

/// Reshape `corners` into an axis-aligned rectangle of the requested ratio.
///
/// The result keeps the centroid and the area (longer-edge width times
/// longer-edge height) of the input. [`AspectRatio::Auto`] returns the
/// corners unchanged.
#[instrument]
pub fn apply_ratio(corners: &CornerSet, ratio: AspectRatio) -> Result<CornerSet> {
    let Some(r) = ratio.value()? else {
        return Ok(*corners);
    };

    let center = centroid(corners.points());
    let (width, height) = document_size(corners);
    let area = width * height;
    let new_width = (area * r).sqrt();
    let new_height = new_width / r;
    if !new_width.is_finite() || !new_height.is_finite() {
        return Err(AlignaError::Transform(format!(
            "corners cannot be reshaped to {ratio}"
        )));
    }
    debug!(new_width, new_height, "Corners reshaped to ratio");

    Ok(CornerSet::centered(center, new_width, new_height))
}

/// Fit an already-rectified image to `ratio` without resampling its content.
///
/// `Auto` returns an unmodified copy.
pub fn apply_ratio_to_image(
    image: &DynamicImage,
    ratio: AspectRatio,
    fit: CanvasFit,
) -> Result<DynamicImage> {
    let Some(r) = ratio.value()? else {
        return Ok(image.clone());
    };
    Ok(ImageProcessor::from_dynamic(image.clone())
        .fit_to_ratio(r, fit)?
        .into_dynamic())
}

/// Whether opposite edges differ by more than `tolerance`, relative to their
/// mean length.
pub fn is_perspective_distorted(corners: &CornerSet, tolerance: f64) -> bool {
    let edges = EdgeLengths::of(corners);
    let skewed = |a: f64, b: f64| {
        let mean = (a + b) / 2.0;
        mean > 0.0 && (a - b).abs() / mean > tolerance
    };
    skewed(edges.top, edges.bottom) || skewed(edges.left, edges.right)
}

/// Replace a visibly skewed quadrilateral with a rectangle of the same mean
/// size, rotated to the mean direction of its top and bottom edges.
///
/// Corners within `tolerance` are returned unchanged.
pub fn normalize_perspective(corners: &CornerSet, tolerance: f64) -> CornerSet {
    if !is_perspective_distorted(corners, tolerance) {
        return *corners;
    }

    let edges = EdgeLengths::of(corners);
    let half_w = (edges.top + edges.bottom) / 4.0;
    let half_h = (edges.left + edges.right) / 4.0;

    let top = (
        corners.top_right().x - corners.top_left().x,
        corners.top_right().y - corners.top_left().y,
    );
    let bottom = (
        corners.bottom_right().x - corners.bottom_left().x,
        corners.bottom_right().y - corners.bottom_left().y,
    );
    let angle = ((top.1 + bottom.1) / 2.0).atan2((top.0 + bottom.0) / 2.0);
    let (sin, cos) = angle.sin_cos();
    let center = centroid(corners.points());

    let place = |dx: f64, dy: f64| {
        Point::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    };
    debug!(half_w, half_h, angle, "Straightened skewed corners");

    CornerSet::new([
        place(-half_w, -half_h),
        place(half_w, -half_h),
        place(half_w, half_h),
        place(-half_w, half_h),
    ])
}

/// Simplest integer ratio of the document bounded by `corners`, e.g. `(4, 3)`.
pub fn detected_ratio(corners: &CornerSet) -> (u32, u32) {
    let (width, height) = document_size(corners);
    simplify_ratio(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "Expected {b}, got {a}");
    }

    fn assert_point_close(a: Point, b: Point) {
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
    }

    #[test]
    fn auto_leaves_corners_untouched() {
        let corners = CornerSet::new([
            Point::new(3.0, 7.0),
            Point::new(91.0, 2.0),
            Point::new(99.0, 88.0),
            Point::new(1.0, 80.0),
        ]);
        assert_eq!(apply_ratio(&corners, AspectRatio::Auto).unwrap(), corners);
    }

    #[test]
    fn square_keeps_centre_and_area() {
        let corners = CornerSet::from_bounds(200.0, 50.0);
        let out = apply_ratio(&corners, AspectRatio::Square).unwrap();
        let (w, h) = document_size(&out);
        assert_close(w, 100.0);
        assert_close(h, 100.0);
        assert_point_close(centroid(out.points()), Point::new(100.0, 25.0));
        assert_close(out.top_left().y, out.top_right().y);
        assert_close(out.top_left().x, out.bottom_left().x);
    }

    #[test]
    fn custom_two_to_one_on_square() {
        let corners = CornerSet::from_bounds(100.0, 100.0);
        let ratio = AspectRatio::Custom {
            width: 2.0,
            height: 1.0,
        };
        let out = apply_ratio(&corners, ratio).unwrap();
        let (w, h) = document_size(&out);
        assert!((w - 141.42).abs() < 0.01, "width {w}");
        assert!((h - 70.71).abs() < 0.01, "height {h}");
        assert_point_close(centroid(out.points()), Point::new(50.0, 50.0));
    }

    #[test]
    fn invalid_custom_ratio_is_rejected() {
        let corners = CornerSet::from_bounds(10.0, 10.0);
        let ratio = AspectRatio::Custom {
            width: 0.0,
            height: 1.0,
        };
        let err = apply_ratio(&corners, ratio).unwrap_err();
        assert!(matches!(err, AlignaError::InvalidRatio { .. }));
    }

    #[test]
    fn square_on_trapezoid_keeps_edge_area_and_is_axis_aligned() {
        // Top edge 60, bottom edge 100, slanted sides sqrt(20^2 + 80^2).
        let corners = CornerSet::new([
            Point::new(20.0, 0.0),
            Point::new(80.0, 0.0),
            Point::new(100.0, 80.0),
            Point::new(0.0, 80.0),
        ]);
        let (in_w, in_h) = document_size(&corners);
        assert_close(in_w, 100.0);

        let out = apply_ratio(&corners, AspectRatio::Square).unwrap();
        let (w, h) = document_size(&out);
        assert_close(w, h);
        assert_close(w * h, in_w * in_h);
        assert_close(out.top_left().y, out.top_right().y);
        assert_close(out.bottom_left().y, out.bottom_right().y);
        assert_close(out.top_left().x, out.bottom_left().x);
        assert_close(out.top_right().x, out.bottom_right().x);
        assert_point_close(centroid(out.points()), Point::new(50.0, 40.0));
    }

    #[test]
    fn extreme_ratios_fail_cleanly() {
        let corners = CornerSet::from_bounds(100.0, 100.0);
        let overflow = AspectRatio::Custom {
            width: 1e300,
            height: 1e-300,
        };
        assert!(matches!(
            apply_ratio(&corners, overflow),
            Err(AlignaError::InvalidRatio { .. })
        ));

        let img = DynamicImage::ImageRgba8(RgbaImage::new(30, 20));
        let wide = AspectRatio::Custom {
            width: 1e12,
            height: 1.0,
        };
        let err = apply_ratio_to_image(&img, wide, CanvasFit::Pad).unwrap_err();
        assert!(matches!(err, AlignaError::Transform(_)));
    }

    #[test]
    fn image_ratio_pads_by_default_config() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 300, Rgba([0, 0, 0, 255])));
        let out = apply_ratio_to_image(&img, AspectRatio::FourThree, CanvasFit::default()).unwrap();
        assert_eq!((out.width(), out.height()), (400, 300));

        let same = apply_ratio_to_image(&img, AspectRatio::Auto, CanvasFit::Crop).unwrap();
        assert_eq!(same, img);
    }

    #[test]
    fn straightens_trapezoid() {
        // Top edge 60, bottom edge 100, sides ~82.5.
        let corners = CornerSet::new([
            Point::new(20.0, 0.0),
            Point::new(80.0, 0.0),
            Point::new(100.0, 80.0),
            Point::new(0.0, 80.0),
        ]);
        assert!(is_perspective_distorted(&corners, 0.2));

        let out = normalize_perspective(&corners, 0.2);
        let edges = EdgeLengths::of(&out);
        assert_close(edges.top, 80.0);
        assert_close(edges.bottom, 80.0);
        assert_close(edges.left, edges.right);
        assert_close(out.top_left().y, out.top_right().y);
        assert_point_close(centroid(out.points()), centroid(corners.points()));
    }

    #[test]
    fn mild_skew_is_left_alone() {
        let corners = CornerSet::new([
            Point::new(2.0, 0.0),
            Point::new(98.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        assert!(!is_perspective_distorted(&corners, 0.2));
        assert_eq!(normalize_perspective(&corners, 0.2), corners);
    }

    #[test]
    fn straightening_follows_page_rotation() {
        // Skewed page rotated by 90 degrees: top edge points straight down.
        let corners = CornerSet::new([
            Point::new(100.0, 20.0),
            Point::new(100.0, 80.0),
            Point::new(20.0, 100.0),
            Point::new(20.0, 0.0),
        ]);
        let out = normalize_perspective(&corners, 0.2);
        assert_close(out.top_left().x, out.top_right().x);
        assert!(out.top_right().y > out.top_left().y);
    }

    #[test]
    fn ratio_of_a4_like_page() {
        assert_eq!(detected_ratio(&CornerSet::from_bounds(1200.0, 900.0)), (4, 3));
        assert_eq!(detected_ratio(&CornerSet::from_bounds(0.0, 900.0)), (0, 0));
    }
}
