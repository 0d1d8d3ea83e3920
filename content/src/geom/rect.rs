/// Axis-aligned pixel rectangle, `x`/`y` is the top-left corner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(self)   -> i32 { self.x }
    pub fn top(self)    -> i32 { self.y }
    /// Exclusive.
    pub fn right(self)  -> i32 { self.x + self.width }
    /// Exclusive.
    pub fn bottom(self) -> i32 { self.y + self.height }

    /// True when `other` lies fully inside `self`. Empty rectangles count as
    /// inside as long as their origin is within the closed bounds.
    pub fn contains_rect(self, other: Rect) -> bool {
        other.left() >= self.left()
            && other.top() >= self.top()
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}
