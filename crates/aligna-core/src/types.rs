// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Aligna document scanner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AlignaError, Result};

/// Unique identifier for a scanning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in source-image pixel coordinates (not normalised).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point as an `(x, y)` pair in single precision, the form the warp
    /// routines expect.
    pub fn to_f32_pair(self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Index of a corner inside a [`CornerSet`].
pub const TOP_LEFT: usize = 0;
pub const TOP_RIGHT: usize = 1;
pub const BOTTOM_RIGHT: usize = 2;
pub const BOTTOM_LEFT: usize = 3;

/// The four corners of a document quadrilateral.
///
/// Always ordered `[top-left, top-right, bottom-right, bottom-left]`, walking
/// the quadrilateral clockwise from the corner nearest the image origin. The
/// rectifier relies on this order when it maps corners onto the output
/// rectangle.
///
/// A `CornerSet` is an immutable value: edits produce a new set via
/// [`CornerSet::with_corner`], so a session can always go back to the
/// originally detected corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet([Point; 4]);

impl CornerSet {
    pub const fn new(points: [Point; 4]) -> Self {
        Self(points)
    }

    /// Build a corner set from an arbitrary list of points.
    ///
    /// Fails with [`AlignaError::InvalidCorners`] unless exactly four points
    /// are supplied.
    pub fn from_points(points: &[Point]) -> Result<Self> {
        let array: [Point; 4] = points
            .try_into()
            .map_err(|_| AlignaError::InvalidCorners {
                count: points.len(),
            })?;
        Ok(Self(array))
    }

    /// The axis-aligned rectangle `(0,0) (w,0) (w,h) (0,h)`.
    pub fn from_bounds(width: f64, height: f64) -> Self {
        Self([
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    /// An axis-aligned rectangle centred on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self([
            Point::new(center.x - hw, center.y - hh),
            Point::new(center.x + hw, center.y - hh),
            Point::new(center.x + hw, center.y + hh),
            Point::new(center.x - hw, center.y + hh),
        ])
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn top_left(&self) -> Point {
        self.0[TOP_LEFT]
    }

    pub fn top_right(&self) -> Point {
        self.0[TOP_RIGHT]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[BOTTOM_RIGHT]
    }

    pub fn bottom_left(&self) -> Point {
        self.0[BOTTOM_LEFT]
    }

    /// Return a copy with the corner at `index` moved to `point`.
    pub fn with_corner(&self, index: usize, point: Point) -> Result<Self> {
        if index >= 4 {
            return Err(AlignaError::InvalidCornerIndex(index));
        }
        let mut points = self.0;
        points[index] = point;
        Ok(Self(points))
    }
}

impl TryFrom<Vec<Point>> for CornerSet {
    type Error = AlignaError;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::from_points(&points)
    }
}

impl FromStr for CornerSet {
    type Err = AlignaError;

    /// Parse `"x,y;x,y;x,y;x,y"`.
    fn from_str(s: &str) -> Result<Self> {
        let points = s
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                let (x, y) = part
                    .split_once(',')
                    .ok_or_else(|| AlignaError::Parse(format!("corner point '{part}'")))?;
                let x = x
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| AlignaError::Parse(format!("x coordinate '{x}'")))?;
                let y = y
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| AlignaError::Parse(format!("y coordinate '{y}'")))?;
                Ok(Point::new(x, y))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_points(&points)
    }
}

/// Which enhancement pipeline the filter bank runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementMode {
    /// Unmodified copy of the rectified image.
    Original,
    /// Adaptive threshold + closing + Laplacian sharpening, tuned for text.
    #[default]
    Magic,
    /// Grayscale + global Otsu binarization.
    BlackAndWhite,
    /// Per-channel contrast/brightness boost.
    Color,
}

impl fmt::Display for EnhancementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Original => "original",
            Self::Magic => "magic",
            Self::BlackAndWhite => "bw",
            Self::Color => "color",
        };
        f.write_str(name)
    }
}

impl FromStr for EnhancementMode {
    type Err = AlignaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" | "none" => Ok(Self::Original),
            "magic" => Ok(Self::Magic),
            "bw" | "black-and-white" | "blackandwhite" => Ok(Self::BlackAndWhite),
            "color" | "colour" => Ok(Self::Color),
            other => Err(AlignaError::Parse(format!("enhancement mode '{other}'"))),
        }
    }
}

/// Target aspect ratio (width:height) for the document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// Keep the geometry as detected/edited.
    #[default]
    Auto,
    Square,
    FourThree,
    SixteenNine,
    ThreeTwo,
    Custom { width: f64, height: f64 },
}

impl AspectRatio {
    /// Numeric width/height value, or `None` for [`AspectRatio::Auto`].
    ///
    /// Custom ratios with a non-positive or non-finite side, or whose
    /// quotient overflows or underflows, are rejected.
    pub fn value(&self) -> Result<Option<f64>> {
        let value = match *self {
            Self::Auto => return Ok(None),
            Self::Square => 1.0,
            Self::FourThree => 4.0 / 3.0,
            Self::SixteenNine => 16.0 / 9.0,
            Self::ThreeTwo => 3.0 / 2.0,
            Self::Custom { width, height } => {
                let valid = |side: f64| side.is_finite() && side > 0.0;
                if !valid(width) || !valid(height) || !valid(width / height) {
                    return Err(AlignaError::InvalidRatio { width, height });
                }
                width / height
            }
        };
        Ok(Some(value))
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Square => f.write_str("1:1"),
            Self::FourThree => f.write_str("4:3"),
            Self::SixteenNine => f.write_str("16:9"),
            Self::ThreeTwo => f.write_str("3:2"),
            Self::Custom { width, height } => write!(f, "{width}:{height}"),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = AlignaError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().to_ascii_lowercase();
        match trimmed.as_str() {
            "auto" => return Ok(Self::Auto),
            "square" | "1:1" => return Ok(Self::Square),
            "4:3" => return Ok(Self::FourThree),
            "16:9" => return Ok(Self::SixteenNine),
            "3:2" => return Ok(Self::ThreeTwo),
            _ => {}
        }

        let (w, h) = trimmed
            .split_once(':')
            .ok_or_else(|| AlignaError::Parse(format!("aspect ratio '{s}'")))?;
        let width = w
            .trim()
            .parse::<f64>()
            .map_err(|_| AlignaError::Parse(format!("aspect ratio width '{w}'")))?;
        let height = h
            .trim()
            .parse::<f64>()
            .map_err(|_| AlignaError::Parse(format!("aspect ratio height '{h}'")))?;

        let ratio = Self::Custom { width, height };
        ratio.value()?;
        Ok(ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_set_requires_four_points() {
        let three = vec![Point::new(0.0, 0.0); 3];
        let err = CornerSet::from_points(&three).unwrap_err();
        assert!(matches!(err, AlignaError::InvalidCorners { count: 3 }));

        let five = vec![Point::new(0.0, 0.0); 5];
        assert!(CornerSet::try_from(five).is_err());
    }

    #[test]
    fn with_corner_leaves_original_untouched() {
        let original = CornerSet::from_bounds(100.0, 50.0);
        let edited = original
            .with_corner(BOTTOM_RIGHT, Point::new(90.0, 45.0))
            .unwrap();

        assert_eq!(original.bottom_right(), Point::new(100.0, 50.0));
        assert_eq!(edited.bottom_right(), Point::new(90.0, 45.0));
        assert!(original.with_corner(4, Point::default()).is_err());
    }

    #[test]
    fn corner_set_parses_from_cli_form() {
        let corners: CornerSet = "10,20; 110,20; 110,220; 10,220".parse().unwrap();
        assert_eq!(corners.top_left(), Point::new(10.0, 20.0));
        assert_eq!(corners.bottom_left(), Point::new(10.0, 220.0));

        assert!("1,2;3,4".parse::<CornerSet>().is_err());
        assert!("a,b;1,1;2,2;3,3".parse::<CornerSet>().is_err());
    }

    #[test]
    fn aspect_ratio_values() {
        assert_eq!(AspectRatio::Auto.value().unwrap(), None);
        assert_eq!(AspectRatio::Square.value().unwrap(), Some(1.0));
        let sixteen_nine = AspectRatio::SixteenNine.value().unwrap().unwrap();
        assert!((sixteen_nine - 16.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn custom_ratio_rejects_non_positive_sides() {
        let zero = AspectRatio::Custom {
            width: 0.0,
            height: 1.0,
        };
        assert!(matches!(
            zero.value(),
            Err(AlignaError::InvalidRatio { .. })
        ));

        let negative = AspectRatio::Custom {
            width: 2.0,
            height: -1.0,
        };
        assert!(negative.value().is_err());
        assert!("0:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn custom_ratio_rejects_unrepresentable_quotient() {
        let overflow = AspectRatio::Custom {
            width: 1e300,
            height: 1e-300,
        };
        assert!(matches!(
            overflow.value(),
            Err(AlignaError::InvalidRatio { .. })
        ));
        let underflow = AspectRatio::Custom {
            width: 1e-300,
            height: 1e300,
        };
        assert!(underflow.value().is_err());
    }

    #[test]
    fn aspect_ratio_parses_presets_and_custom() {
        assert_eq!("4:3".parse::<AspectRatio>().unwrap(), AspectRatio::FourThree);
        assert_eq!("auto".parse::<AspectRatio>().unwrap(), AspectRatio::Auto);
        assert_eq!(
            "2:1".parse::<AspectRatio>().unwrap(),
            AspectRatio::Custom {
                width: 2.0,
                height: 1.0
            }
        );
        assert!("wide".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn enhancement_mode_round_trips_through_display() {
        for mode in [
            EnhancementMode::Original,
            EnhancementMode::Magic,
            EnhancementMode::BlackAndWhite,
            EnhancementMode::Color,
        ] {
            assert_eq!(mode.to_string().parse::<EnhancementMode>().unwrap(), mode);
        }
        assert_eq!(
            "none".parse::<EnhancementMode>().unwrap(),
            EnhancementMode::Original
        );
    }
}
