//! Geometry module - points and axis-aligned tile footprints

/// 2D position in board space (y grows upward)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle described by its center and size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub center: Point,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a square footprint centered on `center`
    pub fn square(center: Point, size: f32) -> Self {
        Self {
            center,
            width: size,
            height: size,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.center.x - self.width / 2.0
    }

    pub fn max_x(&self) -> f32 {
        self.center.x + self.width / 2.0
    }

    pub fn min_y(&self) -> f32 {
        self.center.y - self.height / 2.0
    }

    pub fn max_y(&self) -> f32 {
        self.center.y + self.height / 2.0
    }

    /// Inclusive overlap test: touching edges count as overlapping
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_inclusive() {
        let a = Rect::square(Point::new(0.0, 0.0), 10.0);
        let touching = Rect::square(Point::new(10.0, 0.0), 10.0);
        let apart = Rect::square(Point::new(10.5, 0.0), 10.0);
        assert!(a.overlaps(&touching));
        assert!(touching.overlaps(&a));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_overlap_needs_both_axes() {
        let a = Rect::square(Point::new(0.0, 0.0), 10.0);
        let b = Rect::square(Point::new(5.0, 20.0), 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::square(Point::new(5.0, 5.0), 10.0)));
    }
}
