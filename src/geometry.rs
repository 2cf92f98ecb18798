/// Axis-aligned rectangle in world coordinates. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_center(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    /// Rectangle whose top edge midpoint sits at `(cx, top)`.
    pub fn from_midtop(cx: f64, top: f64, w: f64, h: f64) -> Self {
        Self::new(cx - w / 2.0, top, w, h)
    }

    /// Rectangle whose bottom edge midpoint sits at `(cx, bottom)`.
    pub fn from_midbottom(cx: f64, bottom: f64, w: f64, h: f64) -> Self {
        Self::new(cx - w / 2.0, bottom - h, w, h)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.h / 2.0
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors() {
        let r = Rect::from_midtop(100.0, 400.0, 50.0, 200.0);
        assert_eq!((r.left(), r.top(), r.center_x()), (75.0, 400.0, 100.0));

        let r = Rect::from_midbottom(100.0, 100.0, 50.0, 200.0);
        assert_eq!((r.top(), r.bottom()), (-100.0, 100.0));

        let r = Rect::from_center(10.0, 20.0, 4.0, 6.0);
        assert_eq!((r.center_x(), r.center_y()), (10.0, 20.0));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(9.5, 9.5, 10.0, 10.0);
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }
}
