use super::point::Point2;

/// Face bounding box as delivered by the landmark source: two corners in
/// video pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: Point2,
    pub bottom_right: Point2,
}

impl BoundingBox {
    pub fn new(top_left: Point2, bottom_right: Point2) -> BoundingBox {
        BoundingBox {
            top_left,
            bottom_right,
        }
    }

    pub fn width(&self) -> f32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f32 {
        self.bottom_right.y - self.top_left.y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.top_left.x + self.bottom_right.x) / 2.,
            (self.top_left.y + self.bottom_right.y) / 2.,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0. || self.height() <= 0.
    }

    /// Restricts the box to `[0, max_x] x [0, max_y]`. Detections near the
    /// frame edge routinely extend past the buffer; cropping with an
    /// unclamped box would read garbage pixels.
    pub fn clamped(&self, max_x: f32, max_y: f32) -> BoundingBox {
        BoundingBox {
            top_left: Point2::new(
                self.top_left.x.clamp(0., max_x),
                self.top_left.y.clamp(0., max_y),
            ),
            bottom_right: Point2::new(
                self.bottom_right.x.clamp(0., max_x),
                self.bottom_right.y.clamp(0., max_y),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extents() {
        let b = BoundingBox::new(Point2::new(10., 20.), Point2::new(110., 140.));

        assert_eq!(b.width(), 100.);
        assert_eq!(b.height(), 120.);
        assert_eq!(b.center(), Point2::new(60., 80.));
        assert!(!b.is_empty());
    }

    #[test]
    fn test_clamped_inside_is_unchanged() {
        let b = BoundingBox::new(Point2::new(10., 20.), Point2::new(110., 140.));

        assert_eq!(b.clamped(640., 480.), b);
    }

    #[test]
    fn test_clamped_overhang() {
        let b = BoundingBox::new(Point2::new(-30., -10.), Point2::new(700., 300.));
        let clamped = b.clamped(640., 480.);

        assert_eq!(clamped.top_left, Point2::new(0., 0.));
        assert_eq!(clamped.bottom_right, Point2::new(640., 300.));
        assert!(clamped.width() <= b.width());
        assert!(clamped.height() <= b.height());
    }

    #[test]
    fn test_clamped_fully_outside_is_empty() {
        let b = BoundingBox::new(Point2::new(700., 500.), Point2::new(800., 600.));
        let clamped = b.clamped(640., 480.);

        assert!(clamped.is_empty());
    }
}
