//! Pixel geometry for tooltip placement.

/// A point in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An element's bounding box in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..self
        }
    }
}

/// Visible area of the page plus its scroll offset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub const fn scrolled(self, scroll_x: f64, scroll_y: f64) -> Self {
        Self {
            scroll_x,
            scroll_y,
            ..self
        }
    }
}

/// Computes the panel's top-left corner in client coordinates.
///
/// The panel sits `offset` pixels below and right of the pointer. When that
/// would overflow the right edge it is pulled left so its right edge lands at
/// `viewport.width - offset`; when it would overflow the bottom it flips above
/// the pointer. There is no further vertical clamp, so a very short viewport
/// can still clip the top.
pub fn place_panel(pointer: Point, panel: Size, viewport: Viewport, offset: f64) -> Point {
    let mut left = pointer.x + offset;
    let mut top = pointer.y + offset;

    if left + panel.width > viewport.width {
        left = viewport.width - offset - panel.width;
    }
    if top + panel.height > viewport.height {
        top = pointer.y - panel.height - offset;
    }

    Point::new(left, top)
}
