// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for every stage of the scan pipeline.
///
/// The defaults reproduce the reference behaviour; a persisted `config.json`
/// may override any subset of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detection: DetectionConfig,
    pub rectify: RectifyConfig,
    pub ratio: RatioConfig,
    pub enhance: EnhanceConfig,
    pub session: SessionConfig,
}

impl ScanConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

/// Corner detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gaussian kernel size (odd) applied before Otsu binarization.
    pub blur_kernel: u32,
    /// Skip contours that touch all four image borders. Those trace the
    /// background around the document rather than the document itself.
    pub ignore_frame_contours: bool,
    /// Share of the image area an interior contour must enclose before a
    /// frame contour is skipped in its favour. Below it the page is taken to
    /// fill the whole frame.
    pub min_document_fraction: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            ignore_frame_contours: true,
            min_document_fraction: 0.1,
        }
    }
}

/// Perspective rectification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Lower bound for each output dimension, in pixels.
    pub min_dimension: u32,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self { min_dimension: 100 }
    }
}

/// How a rectified canvas is adapted to a target ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasFit {
    /// Grow one dimension and fill the new area with white.
    #[default]
    Pad,
    /// Trim one dimension, keeping the centre.
    Crop,
}

/// Aspect-ratio adjustment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioConfig {
    /// Relative difference between opposite edges above which a quadrilateral
    /// counts as perspective-distorted.
    pub skew_tolerance: f64,
    pub canvas_fit: CanvasFit,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self {
            skew_tolerance: 0.2,
            canvas_fit: CanvasFit::Pad,
        }
    }
}

/// Which pipeline backs [`EnhancementMode::Color`](crate::EnhancementMode::Color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPipeline {
    /// Plain per-channel contrast/brightness adjustment.
    #[default]
    Contrast,
    /// Bilateral smoothing, gain, then unsharp masking.
    Detailed,
}

/// Enhancement filter bank settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub magic_blur_kernel: u32,
    /// Neighbourhood size of the adaptive threshold (odd).
    pub magic_block_size: u32,
    /// Constant subtracted from the local mean.
    pub magic_offset: i32,
    /// Side of the square structuring element used for closing (odd).
    pub close_kernel: u32,
    pub sharpen_weight: f32,
    pub laplacian_weight: f32,
    pub color_contrast: f32,
    pub color_brightness: f32,
    pub color_pipeline: ColorPipeline,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            magic_blur_kernel: 3,
            magic_block_size: 11,
            magic_offset: 2,
            close_kernel: 3,
            sharpen_weight: 1.5,
            laplacian_weight: -0.5,
            color_contrast: 1.2,
            color_brightness: 10.0,
            color_pipeline: ColorPipeline::Contrast,
        }
    }
}

/// Interactive session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last corner move before re-rendering.
    pub debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { debounce_ms: 150 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{ "rectify": { "min_dimension": 64 } }"#).unwrap();
        assert_eq!(config.rectify.min_dimension, 64);
        assert_eq!(config.detection, DetectionConfig::default());
        assert_eq!(config.enhance.magic_block_size, 11);
    }

    #[test]
    fn color_pipeline_uses_snake_case() {
        let json = serde_json::to_string(&ColorPipeline::Detailed).unwrap();
        assert_eq!(json, "\"detailed\"");
    }
}
