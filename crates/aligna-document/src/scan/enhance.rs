// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement filter bank: turns a rectified page into its final look
// (untouched, "magic" text-cleanup, black & white, or colour boost).

use aligna_core::config::{ColorPipeline, EnhanceConfig};
use aligna_core::error::{AlignaError, Result};
use aligna_core::EnhancementMode;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::vision::VisionBackend;

/// Bilateral window used by the detailed colour pipeline.
const DETAIL_BILATERAL_DIAMETER: u32 = 9;
const DETAIL_BILATERAL_SIGMA: f32 = 75.0;
/// Gain applied after smoothing in the detailed colour pipeline.
const DETAIL_GAIN: f32 = 1.1;
/// Unsharp mask: `1.5 * img - 0.5 * gaussian(img, 3.0)`.
const UNSHARP_SIGMA: f32 = 3.0;
const UNSHARP_WEIGHT: f32 = 1.5;
const UNSHARP_BLUR_WEIGHT: f32 = -0.5;

/// Applies one of the [`EnhancementMode`] filters to a page image.
///
/// [`FilterBank::enhance`] never fails: if a filter errors, the failure is
/// logged and an unmodified copy of the input is returned. Use
/// [`FilterBank::try_enhance`] to observe the error instead.
pub struct FilterBank<'a> {
    backend: &'a dyn VisionBackend,
    config: &'a EnhanceConfig,
}

impl<'a> FilterBank<'a> {
    pub fn new(backend: &'a dyn VisionBackend, config: &'a EnhanceConfig) -> Self {
        Self { backend, config }
    }

    /// Enhance `image`, falling back to a copy of it on failure.
    pub fn enhance(&self, image: &DynamicImage, mode: EnhancementMode) -> DynamicImage {
        match self.try_enhance(image, mode) {
            Ok(enhanced) => enhanced,
            Err(err) => {
                warn!(%err, %mode, "Enhancement failed, returning unchanged");
                image.clone()
            }
        }
    }

    /// Enhance `image`, reporting failures to the caller.
    ///
    /// `Original` returns an identical copy. `Magic` and `BlackAndWhite`
    /// produce single-channel output; `Color` keeps the input's channels.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn try_enhance(&self, image: &DynamicImage, mode: EnhancementMode) -> Result<DynamicImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AlignaError::Enhancement(
                "cannot enhance an image with zero size".into(),
            ));
        }
        info!(%mode, "Applying enhancement");

        match mode {
            EnhancementMode::Original => Ok(image.clone()),
            EnhancementMode::Magic => self.magic(image),
            EnhancementMode::BlackAndWhite => Ok(self.black_and_white(image)),
            EnhancementMode::Color => Ok(self.color(image)),
        }
    }

    // -- Filters ----------------------------------------------------------------

    /// Text cleanup for photographed pages.
    ///
    /// 1. Grayscale and a light Gaussian blur
    /// 2. Adaptive threshold against the Gaussian local mean
    /// 3. Morphological closing to fill pinholes in strokes
    /// 4. Laplacian sharpening: `1.5 * closed - 0.5 * laplacian(closed)`
    fn magic(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let cfg = self.config;
        if cfg.magic_block_size < 3 || cfg.magic_block_size % 2 == 0 {
            return Err(AlignaError::Enhancement(format!(
                "adaptive block size must be odd and at least 3, got {}",
                cfg.magic_block_size
            )));
        }

        let gray = self.backend.grayscale(image);
        let blurred = self.backend.gaussian_blur(&gray, cfg.magic_blur_kernel);
        let binary =
            self.backend
                .adaptive_threshold(&blurred, cfg.magic_block_size, cfg.magic_offset);
        let closed = self.backend.close(&binary, cfg.close_kernel);
        let laplacian = self.backend.laplacian(&closed);
        debug!("Magic filter: threshold, close and laplacian done");

        let sharpened = weighted_sum(
            &closed,
            cfg.sharpen_weight,
            &laplacian,
            cfg.laplacian_weight,
        );
        Ok(DynamicImage::ImageLuma8(sharpened))
    }

    /// Global Otsu binarization.
    fn black_and_white(&self, image: &DynamicImage) -> DynamicImage {
        let gray = self.backend.grayscale(image);
        let level = self.backend.otsu_level(&gray);
        debug!(level, "Otsu threshold computed");
        DynamicImage::ImageLuma8(self.backend.threshold(&gray, level))
    }

    fn color(&self, image: &DynamicImage) -> DynamicImage {
        match self.config.color_pipeline {
            ColorPipeline::Contrast => ImageProcessor::from_dynamic(image.clone())
                .adjust_contrast_brightness(self.config.color_contrast, self.config.color_brightness)
                .into_dynamic(),
            ColorPipeline::Detailed => self.color_detailed(image),
        }
    }

    /// Edge-preserving smoothing, a mild gain, then an unsharp mask.
    fn color_detailed(&self, image: &DynamicImage) -> DynamicImage {
        let smoothed = self.backend.bilateral_filter(
            &image.to_rgba8(),
            DETAIL_BILATERAL_DIAMETER,
            DETAIL_BILATERAL_SIGMA,
            DETAIL_BILATERAL_SIGMA,
        );
        let gained = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(smoothed))
            .scale_intensity(DETAIL_GAIN)
            .into_dynamic()
            .to_rgba8();
        let blurred = self.backend.gaussian_blur_rgba(&gained, UNSHARP_SIGMA);

        let sharpened = RgbaImage::from_fn(gained.width(), gained.height(), |x, y| {
            let Rgba(src) = *gained.get_pixel(x, y);
            let Rgba(blur) = *blurred.get_pixel(x, y);
            let mix = |i: usize| {
                saturate(UNSHARP_WEIGHT * src[i] as f32 + UNSHARP_BLUR_WEIGHT * blur[i] as f32)
            };
            Rgba([mix(0), mix(1), mix(2), src[3]])
        });
        DynamicImage::ImageRgba8(sharpened)
    }
}

/// Per-pixel `wa * a + wb * b`, rounded and saturated to `[0, 255]`.
fn weighted_sum(a: &GrayImage, wa: f32, b: &GrayImage, wb: f32) -> GrayImage {
    ImageBuffer::from_fn(a.width(), a.height(), |x, y| {
        let va = a.get_pixel(x, y).0[0] as f32;
        let vb = b.get_pixel(x, y).0[0] as f32;
        Luma([saturate(wa * va + wb * vb)])
    })
}

fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
