// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, per-channel tone adjustment, canvas fitting to
// an aspect ratio, and encoding. Operates on in-memory images using the
// `image` crate.

use aligna_core::config::CanvasFit;
use aligna_core::error::AlignaError;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use tracing::{debug, info, instrument};

/// Largest width or height, in pixels, of any image the pipeline allocates.
pub const MAX_DIMENSION: u32 = 16_384;

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let png = ImageProcessor::open("scan.jpg")?
///     .adjust_contrast_brightness(1.2, 10.0)
///     .fit_to_ratio(4.0 / 3.0, CanvasFit::Pad)?
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, AlignaError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            AlignaError::ImageRead(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, AlignaError> {
        let img = image::load_from_memory(data)
            .map_err(|err| AlignaError::ImageRead(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Apply `contrast * (v - 128) + 128 + brightness` to the R, G and B
    /// channels, clamped to `[0, 255]`. Alpha is left untouched. A contrast of
    /// 1.0 and brightness of 0.0 is a no-op.
    ///
    /// Results round half to even, as a clamped 8-bit canvas buffer does.
    #[instrument(skip(self))]
    pub fn adjust_contrast_brightness(self, contrast: f32, brightness: f32) -> Self {
        info!(contrast, brightness, "Adjusting contrast and brightness");
        self.map_rgb(|channel| contrast * (channel - 128.0) + 128.0 + brightness)
    }

    /// Multiply the R, G and B channels by `gain`, saturating at 255.
    #[instrument(skip(self))]
    pub fn scale_intensity(self, gain: f32) -> Self {
        debug!(gain, "Scaling intensity");
        self.map_rgb(|channel| (gain * channel).abs())
    }

    /// Adapt the canvas to a width/height `ratio`, keeping the image centred.
    ///
    /// With [`CanvasFit::Pad`] the short dimension grows and the new area is
    /// filled with opaque white; with [`CanvasFit::Crop`] the long dimension is
    /// trimmed. Images already at the ratio are returned unchanged. A padded
    /// canvas larger than [`MAX_DIMENSION`] is a `Transform` error.
    #[instrument(skip(self))]
    pub fn fit_to_ratio(self, ratio: f64, fit: CanvasFit) -> Result<Self, AlignaError> {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 || !ratio.is_finite() || ratio <= 0.0 {
            return Ok(self);
        }

        let (new_w, new_h) = fitted_dimensions(w, h, ratio, fit).ok_or_else(|| {
            AlignaError::Transform(format!(
                "fitting {w}x{h} to ratio {ratio} exceeds the {MAX_DIMENSION} pixel limit"
            ))
        })?;
        if (new_w, new_h) == (w, h) {
            return Ok(self);
        }
        info!(from_w = w, from_h = h, new_w, new_h, ?fit, "Fitting canvas to ratio");

        let image = match fit {
            CanvasFit::Pad => {
                let mut canvas = RgbaImage::from_pixel(new_w, new_h, Rgba([255u8, 255, 255, 255]));
                let offset_x = (new_w - w) / 2;
                let offset_y = (new_h - h) / 2;
                imageops::overlay(
                    &mut canvas,
                    &self.image.to_rgba8(),
                    offset_x as i64,
                    offset_y as i64,
                );
                DynamicImage::ImageRgba8(canvas)
            }
            CanvasFit::Crop => {
                let offset_x = (w - new_w) / 2;
                let offset_y = (h - new_h) / 2;
                self.image.crop_imm(offset_x, offset_y, new_w, new_h)
            }
        };
        Ok(Self { image })
    }

    fn map_rgb(self, f: impl Fn(f32) -> f32) -> Self {
        let mut rgba = self.image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let adjust =
                |channel: u8| -> u8 { f(channel as f32).round_ties_even().clamp(0.0, 255.0) as u8 };
            *pixel = Rgba([adjust(r), adjust(g), adjust(b), a]);
        }
        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, AlignaError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    ///
    /// JPEG has no alpha channel, so JPEG targets are written from an RGB copy.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), AlignaError> {
        let path = path.as_ref();
        let is_jpeg = matches!(ImageFormat::from_path(path), Ok(ImageFormat::Jpeg));
        let result = if is_jpeg {
            DynamicImage::ImageRgb8(self.image.to_rgb8()).save(path)
        } else {
            self.image.save(path)
        };
        result.map_err(|err| {
            AlignaError::ImageEncode(format!(
                "failed to save image to {}: {}",
                path.display(),
                err
            ))
        })
    }
}

/// Canvas size after fitting a `w` x `h` image to `ratio` (width / height),
/// or `None` if a padded side would exceed [`MAX_DIMENSION`].
fn fitted_dimensions(w: u32, h: u32, ratio: f64, fit: CanvasFit) -> Option<(u32, u32)> {
    let (wf, hf) = (w as f64, h as f64);
    let too_wide = wf / hf > ratio;
    let (new_w, new_h) = match (fit, too_wide) {
        (CanvasFit::Pad, true) => (wf, (wf / ratio).round()),
        (CanvasFit::Pad, false) => ((hf * ratio).round(), hf),
        (CanvasFit::Crop, true) => ((hf * ratio).round(), hf),
        (CanvasFit::Crop, false) => (wf, (wf / ratio).round()),
    };
    let new_w = new_w.max(1.0);
    let new_h = new_h.max(1.0);
    match fit {
        // Rounding must never shrink a padded canvas below the image.
        CanvasFit::Pad => {
            let limit = (MAX_DIMENSION.max(w).max(h)) as f64;
            if new_w > limit || new_h > limit {
                return None;
            }
            Some(((new_w as u32).max(w), (new_h as u32).max(h)))
        }
        CanvasFit::Crop => Some(((new_w as u32).min(w), (new_h as u32).min(h))),
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, AlignaError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| AlignaError::ImageEncode(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
