// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::format;
use alloc::string::String;

use crate::backend::Backend;
use crate::tree::Tiles;
use crate::types::{TileFlags, TileId};

impl<B: Backend> Tiles<B> {
    /// One-line description of a tile for the debug overlay.
    ///
    /// `d:` external `x,y/wxh`, interior `x,y/wxh`, a focus marker (`*` focused,
    /// `+` on the focus path, blank otherwise), the letters `M` (maximized), `H`
    /// (hidden), `F` (geometry forced), `G` (focus group), `I` (interactive), and
    /// `D` (decorated) for the flags that are set, then the name.
    pub fn debug_label(&self, id: TileId) -> Option<String> {
        let node = self.node_opt(id)?;
        let (e, i) = (node.external, node.interior);
        let marker = if self.is_focused(id) {
            "*"
        } else if self.has_focus(id) {
            "+"
        } else {
            " "
        };
        let mut letters = String::new();
        for (flag, letter) in [
            (TileFlags::MAXIMIZED, 'M'),
            (TileFlags::HIDDEN, 'H'),
            (TileFlags::GEOM_FORCED, 'F'),
            (TileFlags::FOCUS_GROUP, 'G'),
            (TileFlags::INTERACTIVE, 'I'),
            (TileFlags::DECORATED, 'D'),
        ] {
            if node.flags.intersects(flag) {
                letters.push(letter);
            }
        }
        Some(format!(
            "d:{},{}/{}x{} {},{}/{}x{}{marker}{letters} {}",
            e.x,
            e.y,
            e.w,
            e.h,
            i.x,
            i.y,
            i.w,
            i.h,
            node.name.as_deref().unwrap_or(""),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::kinds::{Frame, Plain};
    use crate::{Config, Rect, TileFlags, Tiles};

    #[test]
    fn label_reports_focus_and_flags() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let desk = Plain::create(&mut tiles, root, Rect::new(0, 0, 80, 24)).unwrap();
        tiles.set_flags(desk, TileFlags::MAXIMIZED_H).unwrap();
        tiles.set_name(desk, "desk");
        let win = Frame::create(&mut tiles, desk, Rect::new(1, 1, 20, 6), "main").unwrap();
        tiles.focus(win).unwrap();

        assert_eq!(tiles.debug_label(root).unwrap(), "d:0,0/80x24 0,0/80x24+G screen");
        assert_eq!(tiles.debug_label(desk).unwrap(), "d:0,0/80x24 0,0/80x24+M desk");
        assert_eq!(tiles.debug_label(win).unwrap(), "d:1,1/20x6 2,2/18x4*GID main");
        tiles.hide(win);
        assert_eq!(tiles.debug_label(win).unwrap(), "d:1,1/20x6 2,2/18x4*HGID main");
    }
}
