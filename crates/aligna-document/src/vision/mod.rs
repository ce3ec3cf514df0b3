// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vision backend abstraction.
//
// The detector, rectifier, and filter bank never reach for a global image
// library handle. They receive a `VisionBackend` and call the primitive
// operations they need through it, so an alternative implementation (GPU,
// a native library binding, a test double) can be swapped in.

pub mod imageproc_backend;

use aligna_core::Point;
use image::{DynamicImage, GrayImage, RgbaImage};

pub use imageproc_backend::ImageprocBackend;

/// A closed boundary traced around a connected region of a binary mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point>,
    /// `true` for the inner border of a hole, `false` for an outer border.
    pub is_hole: bool,
}

/// Low-level image operations the scan pipeline is built from.
pub trait VisionBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Convert any supported pixel layout to 8-bit luma.
    fn grayscale(&self, image: &DynamicImage) -> GrayImage;

    /// Gaussian blur with a square kernel of exactly `kernel_size` (odd)
    /// pixels.
    fn gaussian_blur(&self, gray: &GrayImage, kernel_size: u32) -> GrayImage;

    /// Global threshold chosen by Otsu's method.
    fn otsu_level(&self, gray: &GrayImage) -> u8;

    /// Binary threshold: pixels strictly above `level` become 255, the rest 0.
    fn threshold(&self, gray: &GrayImage, level: u8) -> GrayImage;

    /// Adaptive threshold against a Gaussian-weighted local mean over a
    /// `block_size` neighbourhood, minus `offset`.
    fn adaptive_threshold(&self, gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage;

    /// Morphological closing with a square structuring element.
    fn close(&self, binary: &GrayImage, kernel_size: u32) -> GrayImage;

    /// 3x3 Laplacian, saturated to `[0, 255]`.
    fn laplacian(&self, gray: &GrayImage) -> GrayImage;

    /// Outer and hole borders of every foreground (non-zero) region.
    fn find_contours(&self, binary: &GrayImage) -> Vec<Contour>;

    /// Centre of the minimum-area rectangle enclosing `points`, or `None`
    /// when there are no points.
    fn min_area_rect_center(&self, points: &[Point]) -> Option<Point>;

    /// Warp `image` through the projective transform that maps `from` onto
    /// `to`, producing a `width` x `height` image. Pixels sampled outside the
    /// source are transparent black. Returns `None` for a singular transform.
    fn warp_perspective(
        &self,
        image: &RgbaImage,
        from: [Point; 4],
        to: [Point; 4],
        width: u32,
        height: u32,
    ) -> Option<RgbaImage>;

    /// Edge-preserving smoothing over a `diameter`-wide window. Alpha is
    /// passed through unchanged.
    fn bilateral_filter(
        &self,
        image: &RgbaImage,
        diameter: u32,
        sigma_color: f32,
        sigma_space: f32,
    ) -> RgbaImage;

    /// Gaussian blur of every channel with an explicit sigma.
    fn gaussian_blur_rgba(&self, image: &RgbaImage, sigma: f32) -> RgbaImage;
}

/// The default backend for this build.
pub fn vision_backend() -> Box<dyn VisionBackend> {
    Box::new(ImageprocBackend)
}

/// Gaussian sigma implied by a kernel size when no sigma is given, matching
/// the convention of common vision libraries.
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian with exactly `kernel_size` taps (rounded up to
/// the next odd size), weighted by [`sigma_for_kernel`].
pub fn gaussian_kernel(kernel_size: u32) -> Vec<f32> {
    let radius = (kernel_size / 2) as i32;
    let sigma = sigma_for_kernel(kernel_size);
    let weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}
