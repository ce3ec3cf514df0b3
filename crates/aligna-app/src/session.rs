// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session: one captured image moving through corner editing, locking
// (rectification), and final rendering.
//
// While unlocked the user edits corners. Locking rectifies the page; after
// that only the aspect ratio and enhancement mode change. Every mutation bumps
// a revision counter so results computed for an older state can be dropped.

use aligna_core::error::{AlignaError, Result};
use aligna_core::{AspectRatio, CornerSet, EnhancementMode, Point, SessionId};
use aligna_document::{DetectionFallback, DocumentScanner};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

/// A rendered page tagged with the session revision it was produced from.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub revision: u64,
    pub image: DynamicImage,
}

/// State of one document scan.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    id: SessionId,
    captured_at: DateTime<Utc>,
    original: DynamicImage,
    detected: CornerSet,
    detection_fallback: Option<DetectionFallback>,
    corners: CornerSet,
    locked: bool,
    mode: EnhancementMode,
    ratio: AspectRatio,
    /// Explicit rectified width and height; `None` sizes from the corners.
    output_size: (Option<u32>, Option<u32>),
    rectified: Option<DynamicImage>,
    revision: u64,
}

impl DocumentSession {
    /// Start a session for `image`, seeding the corners from auto-detection.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn capture(scanner: &DocumentScanner, image: DynamicImage) -> Result<Self> {
        let detection = scanner.detect_with_report(&image)?;
        let id = SessionId::new();
        info!(session = %id, fallback = ?detection.fallback, "Session started");
        Ok(Self {
            id,
            captured_at: Utc::now(),
            original: image,
            detected: detection.corners,
            detection_fallback: detection.fallback,
            corners: detection.corners,
            locked: false,
            mode: EnhancementMode::default(),
            ratio: AspectRatio::default(),
            output_size: (None, None),
            rectified: None,
            revision: 0,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    /// Corners found by auto-detection. Never changed by edits.
    pub fn detected_corners(&self) -> CornerSet {
        self.detected
    }

    /// Set when auto-detection fell back to the image bounds.
    pub fn detection_fallback(&self) -> Option<DetectionFallback> {
        self.detection_fallback
    }

    pub fn corners(&self) -> CornerSet {
        self.corners
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn mode(&self) -> EnhancementMode {
        self.mode
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether `page` reflects the current state of the session.
    pub fn is_current(&self, page: &RenderedPage) -> bool {
        page.revision == self.revision
    }

    // -- Corner editing (unlocked) --------------------------------------------

    /// Move one corner. `index` follows [`CornerSet`] order.
    pub fn move_corner(&mut self, index: usize, point: Point) -> Result<u64> {
        self.ensure_unlocked()?;
        let corners = self.corners.with_corner(index, point)?;
        Ok(self.replace_corners(corners))
    }

    /// Replace all four corners, e.g. with a debounced drag result.
    pub fn set_corners(&mut self, corners: CornerSet) -> Result<u64> {
        self.ensure_unlocked()?;
        Ok(self.replace_corners(corners))
    }

    /// Discard edits and return to the auto-detected corners.
    pub fn reset_to_detected(&mut self) -> Result<u64> {
        self.ensure_unlocked()?;
        Ok(self.replace_corners(self.detected))
    }

    /// Run detection again, replacing both the detected and working corners.
    pub fn redetect(&mut self, scanner: &DocumentScanner) -> Result<u64> {
        self.ensure_unlocked()?;
        let detection = scanner.detect_with_report(&self.original)?;
        self.detected = detection.corners;
        self.detection_fallback = detection.fallback;
        Ok(self.replace_corners(detection.corners))
    }

    /// Square up the working corners if they look perspective-skewed.
    pub fn straighten(&mut self, scanner: &DocumentScanner) -> Result<u64> {
        self.ensure_unlocked()?;
        let straightened = scanner.normalize_perspective(&self.corners);
        Ok(self.replace_corners(straightened))
    }

    /// Fix the rectified page size instead of deriving it from the corners.
    pub fn set_output_size(&mut self, width: Option<u32>, height: Option<u32>) -> Result<u64> {
        self.ensure_unlocked()?;
        self.output_size = (width, height);
        Ok(self.bump())
    }

    // -- Locking --------------------------------------------------------------

    /// Freeze the corners and rectify the page.
    ///
    /// If the corners do not form a usable quadrilateral the page falls back
    /// to the unrectified original, matching what the user already sees.
    #[instrument(skip_all, fields(session = %self.id))]
    pub fn lock(&mut self, scanner: &DocumentScanner) -> Result<u64> {
        if self.locked {
            return Ok(self.revision);
        }
        let (width, height) = self.output_size;
        let rectified = match scanner.rectify(&self.original, &self.corners, width, height) {
            Ok(page) => page,
            Err(AlignaError::Transform(reason)) => {
                warn!(%reason, "Rectification failed, using the unrectified image");
                self.original.clone()
            }
            Err(err) => return Err(err),
        };
        debug!(width = rectified.width(), height = rectified.height(), "Page rectified");
        self.rectified = Some(rectified);
        self.locked = true;
        Ok(self.bump())
    }

    /// Return to corner editing. The rectified page is dropped.
    pub fn unlock(&mut self) -> u64 {
        if !self.locked {
            return self.revision;
        }
        self.locked = false;
        self.rectified = None;
        self.bump()
    }

    // -- Output settings ------------------------------------------------------

    /// Change the output aspect ratio. Only allowed once locked.
    pub fn set_ratio(&mut self, ratio: AspectRatio) -> Result<u64> {
        if !self.locked {
            return Err(AlignaError::DocumentNotLocked);
        }
        ratio.value()?;
        self.ratio = ratio;
        Ok(self.bump())
    }

    pub fn set_mode(&mut self, mode: EnhancementMode) -> u64 {
        self.mode = mode;
        self.bump()
    }

    /// Working corners reshaped to the selected ratio, for overlay previews.
    pub fn ratio_preview(&self, scanner: &DocumentScanner) -> Result<CornerSet> {
        scanner.apply_ratio(&self.corners, self.ratio)
    }

    /// Produce the final page: rectified, fitted to the ratio, enhanced.
    #[instrument(skip_all, fields(session = %self.id, revision = self.revision))]
    pub fn render(&self, scanner: &DocumentScanner) -> Result<RenderedPage> {
        let rectified = match (&self.rectified, self.locked) {
            (Some(page), true) => page,
            _ => return Err(AlignaError::DocumentNotLocked),
        };
        let fitted = scanner.apply_ratio_to_image(rectified, self.ratio)?;
        let image = scanner.enhance(&fitted, self.mode);
        info!(
            mode = %self.mode,
            ratio = %self.ratio,
            width = image.width(),
            height = image.height(),
            "Page rendered"
        );
        Ok(RenderedPage {
            revision: self.revision,
            image,
        })
    }

    // -- Internals ------------------------------------------------------------

    fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            Err(AlignaError::CornersLocked)
        } else {
            Ok(())
        }
    }

    fn replace_corners(&mut self, corners: CornerSet) -> u64 {
        self.corners = corners;
        self.bump()
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn sheet_photo() -> DynamicImage {
        let mut img = GrayImage::from_pixel(300, 240, Luma([20u8]));
        for y in 30..210 {
            for x in 50..250 {
                img.put_pixel(x, y, Luma([235u8]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    fn session() -> (DocumentScanner, DocumentSession) {
        let scanner = DocumentScanner::default();
        let session = DocumentSession::capture(&scanner, sheet_photo()).unwrap();
        (scanner, session)
    }

    #[test]
    fn capture_seeds_corners_from_detection() {
        let (_, session) = session();
        assert_eq!(session.corners(), session.detected_corners());
        assert_eq!(session.detection_fallback(), None);
        assert!(!session.is_locked());
        assert_eq!(session.mode(), EnhancementMode::Magic);
        assert_eq!(session.ratio(), AspectRatio::Auto);
    }

    #[test]
    fn reset_restores_detected_corners() {
        let (_, mut session) = session();
        let detected = session.detected_corners();
        session.move_corner(0, Point::new(5.0, 5.0)).unwrap();
        session.move_corner(2, Point::new(290.0, 230.0)).unwrap();
        assert_ne!(session.corners(), detected);

        session.reset_to_detected().unwrap();
        assert_eq!(session.corners(), detected);
        assert_eq!(session.detected_corners(), detected);
    }

    #[test]
    fn edits_fail_while_locked() {
        let (scanner, mut session) = session();
        session.lock(&scanner).unwrap();

        let err = session.move_corner(1, Point::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, AlignaError::CornersLocked));
        assert!(matches!(
            session.reset_to_detected(),
            Err(AlignaError::CornersLocked)
        ));

        session.unlock();
        assert!(session.move_corner(1, Point::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn ratio_requires_lock() {
        let (scanner, mut session) = session();
        assert!(matches!(
            session.set_ratio(AspectRatio::Square),
            Err(AlignaError::DocumentNotLocked)
        ));
        assert!(matches!(
            session.render(&scanner),
            Err(AlignaError::DocumentNotLocked)
        ));

        session.lock(&scanner).unwrap();
        session.set_ratio(AspectRatio::Square).unwrap();
        let bad = AspectRatio::Custom {
            width: -1.0,
            height: 2.0,
        };
        assert!(matches!(
            session.set_ratio(bad),
            Err(AlignaError::InvalidRatio { .. })
        ));
        assert_eq!(session.ratio(), AspectRatio::Square);
    }

    #[test]
    fn render_applies_ratio_and_mode() {
        let (scanner, mut session) = session();
        session.lock(&scanner).unwrap();
        session.set_ratio(AspectRatio::Square).unwrap();
        session.set_mode(EnhancementMode::BlackAndWhite);

        let page = session.render(&scanner).unwrap();
        assert_eq!(page.image.width(), page.image.height());
        assert!(session.is_current(&page));

        session.set_mode(EnhancementMode::Original);
        assert!(!session.is_current(&page));
    }

    #[test]
    fn output_size_overrides_corner_size() {
        let (scanner, mut session) = session();
        session.set_output_size(Some(420), None).unwrap();
        session.set_mode(EnhancementMode::Original);
        session.lock(&scanner).unwrap();
        assert_eq!(session.render(&scanner).unwrap().image.width(), 420);
    }

    #[test]
    fn degenerate_corners_fall_back_to_original() {
        let (scanner, mut session) = session();
        let p = Point::new(10.0, 10.0);
        session.set_corners(CornerSet::new([p; 4])).unwrap();
        session.lock(&scanner).unwrap();
        session.set_mode(EnhancementMode::Original);

        let page = session.render(&scanner).unwrap();
        assert_eq!(page.image, *session.original());
    }

    #[test]
    fn revisions_increase_on_every_change() {
        let (scanner, mut session) = session();
        let r0 = session.revision();
        let r1 = session.move_corner(3, Point::new(40.0, 200.0)).unwrap();
        let r2 = session.straighten(&scanner).unwrap();
        let r3 = session.lock(&scanner).unwrap();
        let r4 = session.set_mode(EnhancementMode::Color);
        assert!(r0 < r1 && r1 < r2 && r2 < r3 && r3 < r4);
        assert_eq!(session.revision(), r4);
    }

    #[test]
    fn ratio_preview_reshapes_corners() {
        let (scanner, mut session) = session();
        session.lock(&scanner).unwrap();
        session.set_ratio(AspectRatio::Square).unwrap();
        let preview = session.ratio_preview(&scanner).unwrap();
        let width = preview.top_right().x - preview.top_left().x;
        let height = preview.bottom_left().y - preview.top_left().y;
        assert!((width - height).abs() < 1e-6);
    }
}
