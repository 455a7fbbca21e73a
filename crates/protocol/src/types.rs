use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Whether the horizontal coordinate falls inside the rect.
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x && x < self.right()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.contains_x(p.x) && p.y >= self.y && p.y < self.bottom()
    }
}

/// The region a view renders into, in logical units.
///
/// `y` is the vertical scroll offset of the region's content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            dpr: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_hit_testing() {
        let r = Rect::new(10.0, 0.0, 20.0, 5.0);
        assert!(r.contains(Point::new(10.0, 0.0)));
        assert!(r.contains(Point::new(29.9, 4.9)));
        assert!(!r.contains(Point::new(30.0, 1.0)));
        assert!(!r.contains_x(9.0));
    }
}
