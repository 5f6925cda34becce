use std::fmt::Display;

/// Axis-aligned rectangle, stored by its corners.
///
/// For normalized face boxes the origin is bottom-left, so `(min_x, min_y)` is
/// the bottom-left corner of the box; in pixel space it is the top-left one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// Rectangle position used for chaining constructors.
pub struct RectPosition {
    pub x: f32,
    pub y: f32,
}

impl RectPosition {
    /// Makes a rectangle with the given size.
    pub fn with_size(&self, width: f32, height: f32) -> Rect {
        self.ending_at(self.x + width, self.y + height)
    }

    /// Makes a rectangle with the given end point.
    pub fn ending_at(&self, x: f32, y: f32) -> Rect {
        Rect {
            min_x: self.x,
            min_y: self.y,
            max_x: x,
            max_y: y,
        }
    }
}

impl Rect {
    /// Starts a rectangle with the given position.
    pub fn at(x: f32, y: f32) -> RectPosition {
        RectPosition { x, y }
    }

    /// Width of the rectangle. Negative when the corners are swapped.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle. Negative when the corners are swapped.
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Area of the rectangle. Degenerate rectangles have zero area.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Whether all four corners are finite.
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// Whether the rectangle is finite and encloses a positive area.
    pub fn is_proper(&self) -> bool {
        self.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    /// Intersects two rectangles.
    ///
    /// # Arguments
    ///
    /// * `other` - Other rectangle to intersect with.
    ///
    /// # Returns
    ///
    /// * `Rect` - Intersected rectangle. Width or height is negative when the
    ///   rectangles don't overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }

    /// Clamps the rectangle to `[0, width] x [0, height]`.
    /// If the rectangle is larger than the given size, it will be shrunk.
    ///
    /// # Arguments
    ///
    /// * `width` - Width to clamp to.
    /// * `height` - Height to clamp to.
    pub fn clamp(&self, width: f32, height: f32) -> Rect {
        Rect {
            min_x: self.min_x.clamp(0.0, width),
            min_y: self.min_y.clamp(0.0, height),
            max_x: self.max_x.clamp(0.0, width),
            max_y: self.max_y.clamp(0.0, height),
        }
    }

    /// Calculates the intersection over union of two rectangles.
    ///
    /// # Arguments
    ///
    /// * `other` - Other rectangle to calculate the intersection over union with.
    ///
    /// # Returns
    ///
    /// * `f32` - Intersection over union. Zero when either rectangle is
    ///   degenerate.
    pub fn iou(&self, other: &Rect) -> f32 {
        let area_self = self.area();
        let area_other = other.area();
        if area_self <= 0.0 || area_other <= 0.0 {
            return 0.0;
        }

        let intersection = self.intersection(other).area();
        let union = area_self + area_other - intersection;
        if union <= 0.0 {
            return 0.0;
        }

        intersection / union
    }

    /// Scales the rectangle.
    pub fn scale(&self, x_scale: f32, y_scale: f32) -> Rect {
        Rect {
            min_x: self.min_x * x_scale,
            min_y: self.min_y * y_scale,
            max_x: self.max_x * x_scale,
            max_y: self.max_y * y_scale,
        }
    }

    /// Mirrors the rectangle vertically inside a frame of the given height.
    ///
    /// Converts between a top-left origin and a bottom-left origin.
    pub fn flip_y(&self, frame_height: f32) -> Rect {
        Rect {
            min_x: self.min_x,
            min_y: frame_height - self.max_y,
            max_x: self.max_x,
            max_y: frame_height - self.min_y,
        }
    }

    /// Gets the rectangle as a tuple of (min x, min y, max x, max y).
    pub fn to_min_max(&self) -> (f32, f32, f32, f32) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{min: ({}, {}), max: ({}, {})}}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Rect::at(0.0, 0.0).ending_at(1.0, 1.0), Rect::at(0.0, 0.0).ending_at(1.0, 1.0), 1.0)]
    #[case(Rect::at(0.0, 0.0).ending_at(2.0, 1.0), Rect::at(1.0, 0.0).ending_at(3.0, 1.0), 1.0 / 3.0)]
    #[case(Rect::at(0.0, 0.0).ending_at(1.0, 1.0), Rect::at(2.0, 2.0).ending_at(3.0, 3.0), 0.0)]
    #[case(Rect::at(0.0, 0.0).ending_at(1.0, 1.0), Rect::at(1.0, 0.0).ending_at(2.0, 1.0), 0.0)]
    fn test_iou(#[case] a: Rect, #[case] b: Rect, #[case] expected: f32) {
        assert!((a.iou(&b) - expected).abs() < 1e-6);
        assert!((b.iou(&a) - expected).abs() < 1e-6);
    }

    #[rstest]
    fn test_iou_degenerate_is_zero() {
        let point = Rect::at(0.5, 0.5).with_size(0.0, 0.0);
        let flat = Rect::at(0.0, 0.5).with_size(1.0, 0.0);
        let unit = Rect::at(0.0, 0.0).with_size(1.0, 1.0);

        assert_eq!(point.iou(&unit), 0.0);
        assert_eq!(unit.iou(&flat), 0.0);
        assert_eq!(point.iou(&point), 0.0);
    }

    #[rstest]
    fn test_clamp() {
        let rect = Rect::at(-2.0, 3.0).ending_at(5.0, 12.0).clamp(4.0, 10.0);
        assert_eq!(rect.to_min_max(), (0.0, 3.0, 4.0, 10.0));
    }

    #[rstest]
    fn test_is_proper() {
        assert!(Rect::at(0.0, 0.0).ending_at(1.0, 1.0).is_proper());
        assert!(!Rect::at(0.0, 1.0).ending_at(1.0, 1.0).is_proper());
        assert!(!Rect::at(0.0, 0.0).ending_at(f32::INFINITY, 1.0).is_proper());
    }

    #[rstest]
    fn test_flip_y() {
        let rect = Rect::at(4.0, 2.0).with_size(4.0, 3.0).flip_y(16.0);
        assert_eq!(rect.to_min_max(), (4.0, 11.0, 8.0, 14.0));
    }
}
