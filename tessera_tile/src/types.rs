// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the tile tree: identifiers, families, and placement flags.

/// Identifier for a tile in the tree (generational).
///
/// A handle to a removed tile stays stale forever, even when its slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TileId(pub(crate) u32, pub(crate) u32);

impl TileId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Structural family of a tile; constrains what may parent what.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Family {
    /// Layout containers: may parent anything.
    Container,
    /// Windows: may parent containers and widgets, but not other windows.
    Window,
    /// Leaf widgets: may not parent anything.
    Widget,
}

impl Family {
    /// Returns `true` if a tile of this family may parent a tile of `child` family.
    pub const fn can_parent(self, child: Self) -> bool {
        match self {
            Self::Container => true,
            Self::Window => !matches!(child, Self::Window),
            Self::Widget => false,
        }
    }
}

bitflags::bitflags! {
    /// Placement, visibility, and focus flags of a tile.
    ///
    /// Only [`TileFlags::USER_SETTABLE`] bits may be changed through
    /// [`Tiles::set_flags`](crate::Tiles::set_flags) and
    /// [`Tiles::clear_flags`](crate::Tiles::clear_flags). The rest belong to the
    /// tile's kind or to dedicated entry points such as [`Tiles::hide`](crate::Tiles::hide).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TileFlags: u32 {
        /// Not drawn and not focusable.
        const HIDDEN        = 1 << 0;
        /// Takes the parent's full width.
        const MAXIMIZED_H   = 1 << 1;
        /// Takes the parent's full height.
        const MAXIMIZED_V   = 1 << 2;
        /// Centered horizontally in the parent.
        const CENTERED_H    = 1 << 3;
        /// Centered vertically in the parent.
        const CENTERED_V    = 1 << 4;
        /// Stretches to the parent's right edge.
        const FILL_H        = 1 << 5;
        /// Stretches to the parent's bottom edge.
        const FILL_V        = 1 << 6;
        /// External rectangle is written by the parent's child-geometry hook.
        const GEOM_FORCED   = 1 << 7;
        /// Ignores the parent's hidden state.
        const FLOAT         = 1 << 8;
        /// No backing surface.
        const NO_CANVAS     = 1 << 9;
        /// Interactive descendants form a navigable group.
        const FOCUS_GROUP   = 1 << 10;
        /// May take focus.
        const INTERACTIVE   = 1 << 11;
        /// Tombstone: removed on the next delete sweep.
        const DELETED       = 1 << 12;
        /// Has non-zero decoration margins.
        const DECORATED     = 1 << 13;
        /// Drawn in inverse video.
        const INVERSE       = 1 << 14;

        /// Maximized on both axes.
        const MAXIMIZED = Self::MAXIMIZED_H.bits() | Self::MAXIMIZED_V.bits();
        /// Centered on both axes.
        const CENTERED = Self::CENTERED_H.bits() | Self::CENTERED_V.bits();
        /// Filling on both axes.
        const FILL = Self::FILL_H.bits() | Self::FILL_V.bits();

        /// Bits the application may toggle on any tile.
        const USER_SETTABLE = Self::MAXIMIZED.bits()
            | Self::CENTERED.bits()
            | Self::FILL.bits()
            | Self::FLOAT.bits()
            | Self::INVERSE.bits();
    }
}

impl Default for TileFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_compatibility_table() {
        use Family::*;
        for child in [Container, Window, Widget] {
            assert!(Container.can_parent(child), "containers parent anything");
            assert!(!Widget.can_parent(child), "widgets parent nothing");
        }
        assert!(Window.can_parent(Container));
        assert!(Window.can_parent(Widget));
        assert!(!Window.can_parent(Window));
    }

    #[test]
    fn kind_internal_bits_are_not_user_settable() {
        for bit in [
            TileFlags::HIDDEN,
            TileFlags::GEOM_FORCED,
            TileFlags::NO_CANVAS,
            TileFlags::FOCUS_GROUP,
            TileFlags::INTERACTIVE,
            TileFlags::DELETED,
            TileFlags::DECORATED,
        ] {
            assert!(!TileFlags::USER_SETTABLE.intersects(bit), "{bit:?} leaked");
        }
    }
}
