// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind behavior tables and the draw context handed to them.

use alloc::boxed::Box;
use core::any::Any;

use crate::backend::{Backend, Style};
use crate::event::{Key, Outcome};
use crate::frame::FrameContext;
use crate::geometry::Rect;
use crate::tree::{Node, Tiles};
use crate::types::{TileFlags, TileId};

bitflags::bitflags! {
    /// Behavior slots a [`Driver`] actually provides.
    ///
    /// Read once when a tile is created and cached on the tile; the engine only calls
    /// the slots listed here. A kind without [`Capabilities::DRAW`] gets no canvas.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// [`Driver::draw`] paints the tile each frame.
        const DRAW           = 1 << 0;
        /// [`Driver::update_children_geometry`] lays out the tile's children.
        const CHILD_GEOMETRY = 1 << 1;
        /// [`Driver::event`] handles keys.
        const EVENTS         = 1 << 2;
        /// [`Driver::focus`] reacts to focus changes.
        const FOCUS          = 1 << 3;
        /// [`Driver::destroy_data`] releases private data.
        const DESTROY_DATA   = 1 << 4;
    }
}

/// Behavior table of a tile kind.
///
/// One value is shared by every tile of the kind (tiles hold a `&'static dyn Driver`),
/// so kind state belongs in the tile's private data, not in the driver. A new widget
/// kind is a type implementing this trait plus, optionally, a private data type; the
/// engine needs no changes to support it.
///
/// ```rust
/// use tessera_tile::{Backend, Capabilities, Config, DrawCx, Driver, Family, Rect, TileSpec, Tiles};
///
/// struct Counter;
///
/// impl<B: Backend> Driver<B> for Counter {
///     fn capabilities(&self) -> Capabilities {
///         Capabilities::DRAW
///     }
///
///     fn draw(&self, cx: &mut DrawCx<'_, B>) {
///         let frame = cx.frame().frame;
///         cx.print(0, 0, cx.style(), &frame.to_string());
///     }
/// }
///
/// let mut tiles = Tiles::new(Config::default());
/// let root = tiles.root();
/// let counter = tiles
///     .create(
///         root,
///         &Counter,
///         TileSpec {
///             family: Family::Widget,
///             rect: Rect::new(0, 0, 8, 1),
///             ..TileSpec::default()
///         },
///     )
///     .unwrap();
/// tiles.draw();
/// assert_eq!(tiles.backend().row(0).trim_end(), "0");
/// # let _ = counter;
/// ```
pub trait Driver<B: Backend> {
    /// Slots implemented by this kind.
    fn capabilities(&self) -> Capabilities;

    /// Paint the tile's interior (and decoration, if any).
    ///
    /// Runs for every visible, live tile once per frame. Must not change tree structure.
    fn draw(&self, cx: &mut DrawCx<'_, B>) {
        let _ = cx;
    }

    /// Lay out the children of `id` against its now-final interior rectangle.
    ///
    /// Typical implementations call [`Tiles::force_geometry`] or
    /// [`Tiles::set_rect`] on children; the engine lays every child out right after
    /// this hook returns.
    fn update_children_geometry(&self, tiles: &mut Tiles<B>, id: TileId) {
        let _ = (tiles, id);
    }

    /// Handle a key delivered to `id`.
    fn event(&self, tiles: &mut Tiles<B>, id: TileId, key: Key) -> Outcome {
        let _ = (tiles, id, key);
        Outcome::Unhandled
    }

    /// React to `id` entering (`true`) or leaving (`false`) the focus path.
    fn focus(&self, tiles: &mut Tiles<B>, id: TileId, focused: bool) {
        let _ = (tiles, id, focused);
    }

    /// Release the tile's private data during teardown.
    fn destroy_data(&self, data: Box<dyn Any>) {
        drop(data);
    }
}

/// Everything a [`Driver::draw`] call may touch: one tile and its surfaces.
pub struct DrawCx<'a, B: Backend> {
    pub(crate) id: TileId,
    pub(crate) node: &'a mut Node<B>,
    pub(crate) backend: &'a mut B,
    pub(crate) frame: FrameContext,
    pub(crate) has_focus: bool,
}

impl<B: Backend> core::fmt::Debug for DrawCx<'_, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DrawCx")
            .field("id", &self.id)
            .field("interior", &self.node.interior)
            .field("frame", &self.frame)
            .field("has_focus", &self.has_focus)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> DrawCx<'_, B> {
    /// The tile being drawn.
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Per-frame counters.
    pub fn frame(&self) -> FrameContext {
        self.frame
    }

    /// Interior rectangle in screen coordinates.
    pub fn interior(&self) -> Rect {
        self.node.interior
    }

    /// External rectangle in screen coordinates.
    pub fn external(&self) -> Rect {
        self.node.external
    }

    /// Debug name of the tile.
    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }

    /// Application id of the tile.
    pub fn user_id(&self) -> Option<i32> {
        self.node.user_id
    }

    /// Style token of the tile.
    pub fn style(&self) -> Style {
        self.node.style
    }

    /// Flags of the tile.
    pub fn flags(&self) -> TileFlags {
        self.node.flags
    }

    /// Returns `true` if the tile is on the focus path.
    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Returns `true` if the content was invalidated since the last draw, see
    /// [`Tiles::changed`].
    pub fn content_invalid(&self) -> bool {
        self.node.content_invalid
    }

    /// Private data of the tile, if it has data of type `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.node.data.as_deref()?.downcast_ref()
    }

    /// Mutable private data of the tile, if it has data of type `T`.
    pub fn data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.node.data.as_deref_mut()?.downcast_mut()
    }

    /// Write `text` at interior-relative `(x, y)`.
    ///
    /// Text starting outside the interior is dropped; text running past the right
    /// edge is cut by the surface.
    pub fn print(&mut self, x: i32, y: i32, style: Style, text: &str) {
        let Some(surface) = self.node.surface else {
            return;
        };
        let Rect { w, h, .. } = self.node.interior;
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        self.backend.print(surface, x, y, style, text);
    }

    /// Write `text` at external-relative `(x, y)` into the decoration surface.
    ///
    /// Does nothing for tiles without decoration margins.
    pub fn print_decoration(&mut self, x: i32, y: i32, style: Style, text: &str) {
        let Some(surface) = self.node.deco_surface else {
            return;
        };
        let Rect { w, h, .. } = self.node.external;
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        self.backend.print(surface, x, y, style, text);
    }

    /// Fill the whole interior with the background of `style`.
    pub fn fill(&mut self, style: Style) {
        if let Some(surface) = self.node.surface {
            self.backend.fill(surface, style);
        }
    }
}
