// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory backend and scripted input, for tests and demos.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::backend::{Backend, Style, SurfaceId};
use crate::event::Key;
use crate::frame::{Input, InputSource};
use crate::geometry::Rect;

/// One character cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Character shown.
    pub ch: char,
    /// Style token it was written with.
    pub style: Style,
    /// Drawn in inverse video.
    pub inverse: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::NONE,
            inverse: false,
        }
    }
}

#[derive(Clone, Debug)]
struct Surface {
    rect: Rect,
    inverse: bool,
    cells: Vec<Cell>,
}

impl Surface {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            inverse: false,
            cells: vec![Cell::default(); area(rect.w, rect.h)],
        }
    }

    fn blank(&self, style: Style) -> Cell {
        Cell {
            ch: ' ',
            style,
            inverse: self.inverse,
        }
    }
}

/// Number of cells in a `w` x `h` grid; zero for degenerate sizes.
fn area(w: i32, h: i32) -> usize {
    usize::try_from(w.max(0)).unwrap_or(0) * usize::try_from(h.max(0)).unwrap_or(0)
}

/// Offset of `(x, y)` in a grid of width `w`, if the cell lies inside `w` x `h`.
fn offset(w: i32, h: i32, x: i32, y: i32) -> Option<usize> {
    if x < 0 || y < 0 || x >= w || y >= h {
        return None;
    }
    usize::try_from(y * w + x).ok()
}

/// A [`Backend`] that keeps every surface as a grid of [`Cell`]s and composites the
/// flushed ones into a screen grid on [`Backend::present`].
///
/// ```rust
/// use tessera_tile::{Backend, Headless, Rect, Style};
///
/// let mut screen = Headless::new(10, 2);
/// let s = screen.alloc(Rect::new(2, 1, 5, 1));
/// screen.print(s, 0, 0, Style::NONE, "hello world");
/// screen.flush(s);
/// screen.present();
/// assert_eq!(screen.row(1), "  hello   ");
/// ```
#[derive(Clone, Debug)]
pub struct Headless {
    width: i32,
    height: i32,
    screen: Vec<Cell>,
    surfaces: Vec<Option<Surface>>,
    free: Vec<usize>,
    queue: Vec<SurfaceId>,
    presents: u64,
}

impl Headless {
    /// A blank `width` x `height` screen.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            screen: vec![Cell::default(); area(width, height)],
            surfaces: Vec::new(),
            free: Vec::new(),
            queue: Vec::new(),
            presents: 0,
        }
    }

    /// Screen row `y` as of the last present, one char per cell.
    pub fn row(&self, y: i32) -> String {
        (0..self.width)
            .map(|x| self.cell(x, y).map_or(' ', |c| c.ch))
            .collect()
    }

    /// Screen cell at `(x, y)` as of the last present.
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        let i = offset(self.width, self.height, x, y)?;
        self.screen.get(i).copied()
    }

    /// Number of [`Backend::present`] calls so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Number of allocated surfaces.
    pub fn live_surfaces(&self) -> usize {
        self.surfaces.iter().filter(|s| s.is_some()).count()
    }

    /// Current screen rectangle of a surface.
    pub fn surface_rect(&self, surface: SurfaceId) -> Option<Rect> {
        Some(self.surface(surface)?.rect)
    }

    fn surface(&self, surface: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(usize::try_from(surface.0).ok()?)?.as_ref()
    }

    fn surface_mut(&mut self, surface: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(usize::try_from(surface.0).ok()?)?.as_mut()
    }
}

impl Backend for Headless {
    fn alloc(&mut self, rect: Rect) -> SurfaceId {
        let surface = Some(Surface::new(rect));
        let idx = match self.free.pop() {
            Some(idx) => {
                self.surfaces[idx] = surface;
                idx
            }
            None => {
                self.surfaces.push(surface);
                self.surfaces.len() - 1
            }
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "SurfaceId indices are 32-bit."
        )]
        SurfaceId(idx as u32)
    }

    fn resize(&mut self, surface: SurfaceId, w: i32, h: i32) {
        if let Some(s) = self.surface_mut(surface)
            && (s.rect.w, s.rect.h) != (w, h)
        {
            s.rect.w = w;
            s.rect.h = h;
            s.cells = vec![s.blank(Style::NONE); area(w, h)];
        }
    }

    fn move_to(&mut self, surface: SurfaceId, x: i32, y: i32) {
        if let Some(s) = self.surface_mut(surface) {
            s.rect.x = x;
            s.rect.y = y;
        }
    }

    fn set_inverse(&mut self, surface: SurfaceId, inverse: bool) {
        if let Some(s) = self.surface_mut(surface) {
            s.inverse = inverse;
        }
    }

    fn erase(&mut self, surface: SurfaceId) {
        self.fill(surface, Style::NONE);
    }

    fn fill(&mut self, surface: SurfaceId, style: Style) {
        if let Some(s) = self.surface_mut(surface) {
            let blank = s.blank(style);
            s.cells.fill(blank);
        }
    }

    fn print(&mut self, surface: SurfaceId, x: i32, y: i32, style: Style, text: &str) {
        let Some(s) = self.surface_mut(surface) else {
            return;
        };
        let Rect { w, h, .. } = s.rect;
        for (cx, ch) in (x..).zip(text.chars()) {
            let Some(i) = offset(w, h, cx, y) else {
                break;
            };
            s.cells[i] = Cell {
                ch,
                style,
                inverse: s.inverse,
            };
        }
    }

    fn free(&mut self, surface: SurfaceId) {
        let Ok(idx) = usize::try_from(surface.0) else {
            return;
        };
        if let Some(slot) = self.surfaces.get_mut(idx)
            && slot.take().is_some()
        {
            self.free.push(idx);
            self.queue.retain(|&q| q != surface);
        }
    }

    fn flush(&mut self, surface: SurfaceId) {
        self.queue.push(surface);
    }

    fn present(&mut self) {
        self.screen.fill(Cell::default());
        for surface in core::mem::take(&mut self.queue) {
            let Some(s) = self.surface(surface) else {
                continue;
            };
            let mut writes = Vec::new();
            for sy in 0..s.rect.h {
                for sx in 0..s.rect.w {
                    let (Some(src), Some(dst)) = (
                        offset(s.rect.w, s.rect.h, sx, sy),
                        offset(self.width, self.height, s.rect.x + sx, s.rect.y + sy),
                    ) else {
                        continue;
                    };
                    writes.push((dst, s.cells[src]));
                }
            }
            for (dst, cell) in writes {
                self.screen[dst] = cell;
            }
        }
        self.presents += 1;
    }

    fn screen_resized(&mut self, w: i32, h: i32) {
        self.width = w;
        self.height = h;
        self.screen = vec![Cell::default(); area(w, h)];
    }
}

/// An [`InputSource`] that replays a fixed script, then reports [`Input::Closed`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    script: VecDeque<Input>,
}

impl ScriptedInput {
    /// A script of key presses.
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            script: keys.into_iter().map(Input::Key).collect(),
        }
    }

    /// Append an idle frame.
    pub fn idle(mut self) -> Self {
        self.script.push_back(Input::Idle);
        self
    }

    /// Append a key press.
    pub fn key(mut self, key: Key) -> Self {
        self.script.push_back(Input::Key(key));
        self
    }

    /// Inputs not yet read.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl InputSource for ScriptedInput {
    fn read_key(&mut self) -> Input {
        self.script.pop_front().unwrap_or(Input::Closed)
    }
}
