// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

use crate::geometry::Rect;

/// Settings fixed when a [`Tiles`](crate::Tiles) tree is created.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Screen rectangle published to the root tile.
    pub screen: Rect,
    /// Target frame rate, reported to draw calls through
    /// [`FrameContext::fps`](crate::FrameContext::fps).
    pub fps: u32,
    /// Print each non-widget tile's geometry, focus state, and flags on top of it.
    pub debug_overlay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen: Rect::new(0, 0, 80, 24),
            fps: 30,
            debug_overlay: false,
        }
    }
}

impl Config {
    /// Use a `w` x `h` screen.
    pub fn with_screen(mut self, w: i32, h: i32) -> Self {
        self.screen = Rect::new(0, 0, w, h);
        self
    }

    /// Set the target frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Turn the debug overlay on or off.
    pub fn with_debug_overlay(mut self, on: bool) -> Self {
        self.debug_overlay = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tiles;

    #[test]
    fn defaults_and_builders() {
        let config = Config::default();
        assert_eq!(config.screen, Rect::new(0, 0, 80, 24));
        assert_eq!(config.fps, 30);
        assert!(!config.debug_overlay);

        let tiles = Tiles::new(Config::default().with_screen(40, 12).with_fps(60));
        assert_eq!(tiles.external_rect(tiles.root()), Some(Rect::new(0, 0, 40, 12)));
        assert_eq!(tiles.frame_context().fps, 60);
        assert_eq!(tiles.backend().row(0).len(), 40);
    }
}
