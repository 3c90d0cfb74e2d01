// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell geometry: rectangles, margins, and published-rectangle selection.

/// A rectangle of terminal cells: origin plus size.
///
/// Coordinates are signed so that intermediate layout results (for example a
/// negative requested offset) can be represented before they are clipped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Column of the left edge.
    pub x: i32,
    /// Row of the top edge.
    pub y: i32,
    /// Width in cells.
    pub w: i32,
    /// Height in cells.
    pub h: i32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Create a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// First column past the right edge.
    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    /// First row past the bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Returns `true` if the rectangle covers no cells.
    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    ///
    /// Empty rectangles are contained as long as their origin is.
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Shrink by `margins` on each side.
    ///
    /// The result may have a non-positive size when the margins do not fit.
    pub const fn inset(&self, margins: Margins) -> Self {
        Self {
            x: self.x + margins.left,
            y: self.y + margins.top,
            w: self.w - margins.left - margins.right,
            h: self.h - margins.top - margins.bottom,
        }
    }

    /// Convert to a [`kurbo::Rect`] in the same cell space.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }
}

/// Decoration margins carved from a tile's external rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Margins {
    /// Rows reserved at the top.
    pub top: i32,
    /// Rows reserved at the bottom.
    pub bottom: i32,
    /// Columns reserved on the left.
    pub left: i32,
    /// Columns reserved on the right.
    pub right: i32,
}

impl Margins {
    /// No decoration.
    pub const ZERO: Self = Self::uniform(0);

    /// The same margin on all four sides.
    pub const fn uniform(n: i32) -> Self {
        Self {
            top: n,
            bottom: n,
            left: n,
            right: n,
        }
    }

    /// Returns `true` if no side reserves any space.
    pub const fn is_zero(&self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }
}

/// Which rectangle of a redirect source a tile lays itself out against.
///
/// See [`Tiles::redirect_geometry`](crate::Tiles::redirect_geometry).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Publish {
    /// The source's interior rectangle (inside its margins).
    Interior,
    /// The source's external rectangle (including its margins).
    Exterior,
}
