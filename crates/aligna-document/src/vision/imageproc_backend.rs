// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `VisionBackend` implemented on the `image` and `imageproc` crates.

use aligna_core::Point;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};
use imageproc::contours::{self, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::filter::{gaussian_blur_f32, separable_filter_equal};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::min_area_rect;
use imageproc::morphology;
use imageproc::point::Point as PixelPoint;

use super::{Contour, VisionBackend, gaussian_kernel};

/// Pure-Rust backend built on `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocBackend;

/// Second-derivative kernel with diagonal taps (aperture 3).
const LAPLACIAN_3X3: [[i32; 3]; 3] = [[2, 0, 2], [0, -8, 0], [2, 0, 2]];

impl VisionBackend for ImageprocBackend {
    fn name(&self) -> &str {
        "imageproc"
    }

    fn grayscale(&self, image: &DynamicImage) -> GrayImage {
        image.to_luma8()
    }

    fn gaussian_blur(&self, gray: &GrayImage, kernel_size: u32) -> GrayImage {
        if kernel_size <= 1 {
            return gray.clone();
        }
        separable_filter_equal(gray, &gaussian_kernel(kernel_size))
    }

    fn otsu_level(&self, gray: &GrayImage) -> u8 {
        otsu_threshold(gray)
    }

    fn threshold(&self, gray: &GrayImage, level: u8) -> GrayImage {
        let (width, height) = gray.dimensions();
        ImageBuffer::from_fn(width, height, |x, y| {
            let val = gray.get_pixel(x, y).0[0];
            Luma([if val > level { 255u8 } else { 0u8 }])
        })
    }

    fn adaptive_threshold(&self, gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
        let local_mean = self.gaussian_blur(gray, block_size);
        let (width, height) = gray.dimensions();
        ImageBuffer::from_fn(width, height, |x, y| {
            let val = gray.get_pixel(x, y).0[0] as i32;
            let threshold = local_mean.get_pixel(x, y).0[0] as i32 - offset;
            Luma([if val > threshold { 255u8 } else { 0u8 }])
        })
    }

    fn close(&self, binary: &GrayImage, kernel_size: u32) -> GrayImage {
        let radius = (kernel_size / 2).min(u8::MAX as u32) as u8;
        if radius == 0 {
            return binary.clone();
        }
        // An L-infinity ball of radius r is a (2r+1) square.
        morphology::close(binary, Norm::LInf, radius)
    }

    fn laplacian(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        ImageBuffer::from_fn(width, height, |x, y| {
            let mut acc = 0i32;
            for (ky, row) in LAPLACIAN_3X3.iter().enumerate() {
                for (kx, &weight) in row.iter().enumerate() {
                    if weight == 0 {
                        continue;
                    }
                    let sx = reflect_101(x as i64 + kx as i64 - 1, width);
                    let sy = reflect_101(y as i64 + ky as i64 - 1, height);
                    acc += weight * gray.get_pixel(sx, sy).0[0] as i32;
                }
            }
            Luma([acc.clamp(0, 255) as u8])
        })
    }

    fn find_contours(&self, binary: &GrayImage) -> Vec<Contour> {
        let traced: Vec<contours::Contour<i32>> = contours::find_contours(binary);
        traced
            .into_iter()
            .map(|contour| Contour {
                is_hole: contour.border_type == BorderType::Hole,
                points: contour
                    .points
                    .into_iter()
                    .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                    .collect(),
            })
            .collect()
    }

    fn min_area_rect_center(&self, points: &[Point]) -> Option<Point> {
        if points.is_empty() {
            return None;
        }
        let pixels: Vec<PixelPoint<i32>> = points
            .iter()
            .map(|p| PixelPoint::new(p.x.round() as i32, p.y.round() as i32))
            .collect();
        let rect = min_area_rect(&pixels);
        let (sx, sy) = rect.iter().fold((0.0, 0.0), |(sx, sy), p| {
            (sx + f64::from(p.x), sy + f64::from(p.y))
        });
        Some(Point::new(sx / 4.0, sy / 4.0))
    }

    fn warp_perspective(
        &self,
        image: &RgbaImage,
        from: [Point; 4],
        to: [Point; 4],
        width: u32,
        height: u32,
    ) -> Option<RgbaImage> {
        if has_collinear_triple(&from) || has_collinear_triple(&to) {
            return None;
        }
        let projection =
            Projection::from_control_points(from.map(Point::to_f32_pair), to.map(Point::to_f32_pair))?;
        let mut output = RgbaImage::new(width, height);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgba([0u8, 0, 0, 0]),
            &mut output,
        );
        Some(output)
    }

    fn bilateral_filter(
        &self,
        image: &RgbaImage,
        diameter: u32,
        sigma_color: f32,
        sigma_space: f32,
    ) -> RgbaImage {
        let (width, height) = image.dimensions();
        let radius = (diameter / 2).max(1) as i64;
        let space_coeff = -0.5 / (sigma_space * sigma_space);
        let color_coeff = -0.5 / (sigma_color * sigma_color);

        // Circular window of precomputed spatial weights.
        let mut window = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let r2 = (dx * dx + dy * dy) as f32;
                if r2 > (radius * radius) as f32 {
                    continue;
                }
                window.push((dx, dy, (r2 * space_coeff).exp()));
            }
        }

        ImageBuffer::from_fn(width, height, |x, y| {
            let center = image.get_pixel(x, y).0;
            let mut sum = [0f32; 3];
            let mut weight_sum = 0f32;

            for &(dx, dy, spatial) in &window {
                let sx = x as i64 + dx;
                let sy = y as i64 + dy;
                if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
                    continue;
                }
                let sample = image.get_pixel(sx as u32, sy as u32).0;
                let color_dist: f32 = (0..3)
                    .map(|c| (sample[c] as f32 - center[c] as f32).abs())
                    .sum();
                let weight = spatial * (color_dist * color_dist * color_coeff).exp();
                for c in 0..3 {
                    sum[c] += weight * sample[c] as f32;
                }
                weight_sum += weight;
            }

            // The centre tap always contributes weight 1.
            let channel = |c: usize| (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            Rgba([channel(0), channel(1), channel(2), center[3]])
        })
    }

    fn gaussian_blur_rgba(&self, image: &RgbaImage, sigma: f32) -> RgbaImage {
        if sigma <= 0.0 {
            return image.clone();
        }
        gaussian_blur_f32(image, sigma)
    }
}

/// Whether any three of the four control points are (nearly) collinear, in
/// which case no projective transform between the quads exists.
fn has_collinear_triple(points: &[Point; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let (pa, pb, pc) = (points[a], points[b], points[c]);
        let cross = (pb.x - pa.x) * (pc.y - pa.y) - (pb.y - pa.y) * (pc.x - pa.x);
        cross.abs() < 1e-6 || !cross.is_finite()
    })
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge pixel (`dcb|abcd|cba`).
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len <= 1 {
        return 0;
    }
    let mut i = index;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * len - 2 - i;
    }
    i.clamp(0, len - 1) as u32
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Finds the threshold value that maximises the between-class variance of the
/// dark and light pixel groups. Pixels `<= threshold` form the dark class.
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(width: u32, height: u32, dark: u8, light: u8) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            Luma([if x < width / 2 { dark } else { light }])
        })
    }

    #[test]
    fn otsu_separates_two_tones() {
        let img = two_tone(40, 10, 30, 220);
        let level = ImageprocBackend.otsu_level(&img);
        assert!((30..220).contains(&level), "level {level} not between tones");

        let binary = ImageprocBackend.threshold(&img, level);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(39, 0).0[0], 255);
    }

    #[test]
    fn otsu_of_empty_image_is_midpoint() {
        assert_eq!(otsu_threshold(&GrayImage::new(0, 0)), 128);
    }

    /// A vertical line spreads sideways by exactly half the kernel size.
    #[test]
    fn blur_footprint_matches_kernel_size() {
        let mut line = GrayImage::new(31, 9);
        for y in 0..9 {
            line.put_pixel(15, y, Luma([255u8]));
        }
        for size in [3u32, 5, 11] {
            let blurred = ImageprocBackend.gaussian_blur(&line, size);
            let reach = size / 2;
            assert!(blurred.get_pixel(15 + reach, 4).0[0] > 0, "kernel {size}");
            assert!(blurred.get_pixel(15 - reach, 4).0[0] > 0, "kernel {size}");
            assert_eq!(blurred.get_pixel(15 + reach + 1, 4).0[0], 0, "kernel {size}");
            assert_eq!(blurred.get_pixel(15 - reach - 1, 4).0[0], 0, "kernel {size}");
        }
    }

    #[test]
    fn adaptive_threshold_keeps_flat_regions_white() {
        let flat = GrayImage::from_pixel(20, 20, Luma([90u8]));
        let binary = ImageprocBackend.adaptive_threshold(&flat, 11, 2);
        assert!(binary.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn adaptive_threshold_marks_thin_dark_stroke() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([230u8]));
        for y in 5..25 {
            img.put_pixel(15, y, Luma([20u8]));
        }
        let binary = ImageprocBackend.adaptive_threshold(&img, 11, 2);
        assert_eq!(binary.get_pixel(15, 15).0[0], 0);
        assert_eq!(binary.get_pixel(5, 15).0[0], 255);
    }

    #[test]
    fn closing_fills_pinhole() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([255u8]));
        img.put_pixel(4, 4, Luma([0u8]));
        let closed = ImageprocBackend.close(&img, 3);
        assert_eq!(closed.get_pixel(4, 4).0[0], 255);
    }

    #[test]
    fn laplacian_of_flat_image_is_zero() {
        let flat = GrayImage::from_pixel(8, 8, Luma([128u8]));
        let lap = ImageprocBackend.laplacian(&flat);
        assert!(lap.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn laplacian_responds_to_dark_dot() {
        let mut img = GrayImage::from_pixel(7, 7, Luma([200u8]));
        img.put_pixel(3, 3, Luma([0u8]));
        let lap = ImageprocBackend.laplacian(&img);
        // Around a dark dot the second derivative is strongly positive.
        assert_eq!(lap.get_pixel(3, 3).0[0], 255);
        assert_eq!(lap.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn collinear_control_points_are_rejected() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 5.0),
        ];
        assert!(has_collinear_triple(&line));
        let square = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        assert!(!has_collinear_triple(&square));
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn contours_of_filled_square() {
        let mut img = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        let contours = ImageprocBackend.find_contours(&img);
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].is_hole);
        assert!(contours[0].points.contains(&Point::new(5.0, 5.0)));
        assert!(contours[0].points.contains(&Point::new(14.0, 14.0)));
    }

    #[test]
    fn min_area_rect_center_of_axis_aligned_box() {
        let points = [
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(30.0, 20.0),
            Point::new(10.0, 20.0),
            Point::new(20.0, 15.0),
        ];
        let center = ImageprocBackend.min_area_rect_center(&points).unwrap();
        assert!((center.x - 20.0).abs() < 0.5 && (center.y - 15.0).abs() < 0.5);
        assert!(ImageprocBackend.min_area_rect_center(&[]).is_none());
    }

    #[test]
    fn identity_warp_preserves_interior() {
        let img = RgbaImage::from_fn(16, 12, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 77, 255]));
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(16.0, 0.0),
            Point::new(0.0, 12.0),
            Point::new(16.0, 12.0),
        ];
        let warped = ImageprocBackend
            .warp_perspective(&img, corners, corners, 16, 12)
            .unwrap();
        assert_eq!(warped.dimensions(), (16, 12));
        for y in 1..11 {
            for x in 1..15 {
                let (a, b) = (img.get_pixel(x, y).0, warped.get_pixel(x, y).0);
                for c in 0..4 {
                    assert!((a[c] as i32 - b[c] as i32).abs() <= 1, "pixel ({x},{y}) differs");
                }
            }
        }
    }

    #[test]
    fn bilateral_filter_keeps_flat_color_and_alpha() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([100, 150, 200, 42]));
        let out = ImageprocBackend.bilateral_filter(&img, 9, 75.0, 75.0);
        assert!(out.pixels().all(|p| p.0 == [100, 150, 200, 42]));
    }
}
