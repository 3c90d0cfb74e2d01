// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering surface service and style tokens.

use crate::geometry::Rect;

/// Opaque style token, resolved to attributes and colors by the backend.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style(pub u16);

impl Style {
    /// No style: the tile background is left untouched.
    pub const NONE: Self = Self(0);
    /// Style used by the debug overlay.
    pub const DEBUG: Self = Self(u16::MAX);

    /// Returns `true` for [`Style::NONE`].
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Handle of a backing surface owned by a [`Backend`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// The rendering surface service.
///
/// Each tile with a canvas owns exactly one surface covering its interior
/// rectangle. The engine allocates it on the tile's first visible layout pass,
/// resizes and moves it on every later pass, flushes it after each draw, and
/// frees it when the tile is torn down. [`Backend::present`] is called once per
/// frame, after every tile has been drawn.
///
/// Failure is not part of this contract: a backend that cannot provide a
/// surface cannot present a usable UI and should abort.
pub trait Backend: 'static {
    /// Allocate a surface covering `rect` (screen coordinates).
    fn alloc(&mut self, rect: Rect) -> SurfaceId;
    /// Change a surface's size.
    fn resize(&mut self, surface: SurfaceId, w: i32, h: i32);
    /// Move a surface's origin.
    fn move_to(&mut self, surface: SurfaceId, x: i32, y: i32);
    /// Switch inverse video for everything later written to the surface.
    fn set_inverse(&mut self, surface: SurfaceId, inverse: bool);
    /// Clear a surface.
    fn erase(&mut self, surface: SurfaceId);
    /// Fill a surface's whole area with the background of `style`.
    fn fill(&mut self, surface: SurfaceId, style: Style);
    /// Write `text` at surface-local `(x, y)`; anything past the edge is dropped.
    fn print(&mut self, surface: SurfaceId, x: i32, y: i32, style: Style, text: &str);
    /// Release a surface.
    fn free(&mut self, surface: SurfaceId);
    /// Queue a surface for the next [`Backend::present`].
    fn flush(&mut self, surface: SurfaceId);
    /// Push all queued surfaces to the terminal.
    fn present(&mut self);
    /// The screen changed size; called by [`Tiles::resize_screen`](crate::Tiles::resize_screen).
    fn screen_resized(&mut self, w: i32, h: i32) {
        let _ = (w, h);
    }
}
