// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in tile kinds.
//!
//! - [`Screen`]: the root tile `Tiles` creates for itself.
//! - [`Plain`]: a layout-only container with no canvas.
//! - [`Frame`]: a window that is its own focus group and draws a border and title
//!   in its decoration margins.

use alloc::string::String;

use crate::backend::Backend;
use crate::driver::{Capabilities, DrawCx, Driver};
use crate::error::Result;
use crate::geometry::{Margins, Rect};
use crate::tree::{TileSpec, Tiles};
use crate::types::{Family, TileFlags, TileId};

/// Kind of the root tile.
#[derive(Copy, Clone, Debug, Default)]
pub struct Screen;

impl<B: Backend> Driver<B> for Screen {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }
}

/// A container that only groups and places its children.
#[derive(Copy, Clone, Debug, Default)]
pub struct Plain;

impl Plain {
    /// Create a plain container under `parent`.
    pub fn create<B: Backend>(tiles: &mut Tiles<B>, parent: TileId, rect: Rect) -> Result<TileId> {
        tiles.create(parent, &Plain, TileSpec::new(Family::Container, rect))
    }
}

impl<B: Backend> Driver<B> for Plain {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }
}

/// A bordered, titled window.
#[derive(Copy, Clone, Debug, Default)]
pub struct Frame;

const SINGLE: [char; 6] = ['┌', '─', '┐', '│', '└', '┘'];
const DOUBLE: [char; 6] = ['╔', '═', '╗', '║', '╚', '╝'];

impl Frame {
    /// Creation parameters for a frame titled `title`.
    pub fn spec(rect: Rect, title: &str) -> TileSpec {
        TileSpec::new(Family::Window, rect)
            .with_margins(Margins::uniform(1))
            .with_flags(TileFlags::FOCUS_GROUP | TileFlags::INTERACTIVE)
            .with_name(title)
    }

    /// Create a frame under `parent`.
    pub fn create<B: Backend>(
        tiles: &mut Tiles<B>,
        parent: TileId,
        rect: Rect,
        title: &str,
    ) -> Result<TileId> {
        tiles.create(parent, &Frame, Self::spec(rect, title))
    }
}

impl<B: Backend> Driver<B> for Frame {
    fn capabilities(&self) -> Capabilities {
        Capabilities::DRAW
    }

    fn draw(&self, cx: &mut DrawCx<'_, B>) {
        let Rect { w, h, .. } = cx.external();
        if w < 2 || h < 2 {
            return;
        }
        // Focused frames get a double border.
        let [tl, hz, tr, vt, bl, br] = if cx.has_focus() { DOUBLE } else { SINGLE };
        let style = cx.style();
        let span = usize::try_from(w - 2).unwrap_or(0);

        let mut row = String::with_capacity(span + 2);
        row.push(tl);
        row.extend(core::iter::repeat_n(hz, span));
        row.push(tr);
        cx.print_decoration(0, 0, style, &row);

        row.clear();
        row.push(bl);
        row.extend(core::iter::repeat_n(hz, span));
        row.push(br);
        cx.print_decoration(0, h - 1, style, &row);

        let mut side = [0_u8; 4];
        let side = vt.encode_utf8(&mut side);
        for y in 1..h - 1 {
            cx.print_decoration(0, y, style, side);
            cx.print_decoration(w - 1, y, style, side);
        }

        if let Some(name) = cx.name() {
            let title: String = name.chars().take(span.saturating_sub(2)).collect();
            cx.print_decoration(2, 0, style, &title);
        }
    }
}
