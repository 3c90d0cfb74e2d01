// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw pass and the per-frame loop.
//!
//! One loop iteration reads one input, routes it along the focus path, sweeps
//! deleted tiles, draws every visible tile top-down, and presents the result.
//! The sweep always runs before the draw pass, so drawing never sees a tombstone.

use alloc::vec::Vec;

use crate::backend::{Backend, Style};
use crate::driver::{Capabilities, DrawCx};
use crate::event::Key;
use crate::tree::{Tiles, node_in};
use crate::types::{Family, TileFlags, TileId};

/// Per-frame counters handed to every draw call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameContext {
    /// Number of completed frames.
    pub frame: u64,
    /// Target frame rate from the configuration.
    pub fps: u32,
}

/// One read from an [`InputSource`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Input {
    /// A decoded key.
    Key(Key),
    /// Nothing arrived within the frame period.
    Idle,
    /// The input is gone; the loop should stop.
    Closed,
}

/// Source of decoded keys, read once per frame.
pub trait InputSource {
    /// Wait for the next key, at most one frame period.
    fn read_key(&mut self) -> Input;
}

impl<B: Backend> Tiles<B> {
    /// Counters for the frame being drawn.
    pub fn frame_context(&self) -> FrameContext {
        FrameContext {
            frame: self.frame,
            fps: self.config.fps,
        }
    }

    /// Draw every visible, live tile, parents before children, then present.
    ///
    /// Subtrees of deleted tiles are skipped entirely. Hidden tiles are skipped,
    /// but their children are still visited so floating tiles show.
    pub fn draw(&mut self) {
        let root = self.root();
        if !self.is_alive(root) {
            return;
        }
        let path = self.focus_path();
        let frame = self.frame_context();

        let mut stack = Vec::from([root]);
        while let Some(id) = stack.pop() {
            let Some(node) = self.node_opt(id) else {
                continue;
            };
            if node.flags.contains(TileFlags::DELETED) {
                continue;
            }
            stack.extend(node.children.iter().rev().copied());
            if node.flags.contains(TileFlags::HIDDEN) {
                continue;
            }
            self.draw_tile(id, path.contains(&id), frame);
        }
        self.backend.present();
    }

    fn draw_tile(&mut self, id: TileId, has_focus: bool, frame: FrameContext) {
        let accepts = self.node_opt(id).is_some_and(|n| n.accept_updates);
        if accepts
            && let Some(mut handler) = self.node_opt_mut(id).and_then(|n| n.update_handler.take())
        {
            handler(self, id);
            if let Some(n) = self.node_opt_mut(id)
                && n.update_handler.is_none()
            {
                n.update_handler = Some(handler);
            }
        }

        let label = if self.config.debug_overlay {
            self.node_opt(id)
                .filter(|n| n.family != Family::Widget)
                .and_then(|_| self.debug_label(id))
        } else {
            None
        };

        let Some(node) = node_in(&mut self.nodes, id) else {
            return;
        };
        let backend = &mut self.backend;

        if let Some(deco) = node.deco_surface {
            backend.erase(deco);
        }
        if let Some(surface) = node.surface {
            if node.style.is_none() {
                backend.erase(surface);
            } else {
                backend.fill(surface, node.style);
            }
        }

        if node.caps.contains(Capabilities::DRAW) {
            let driver = node.driver;
            let mut cx = DrawCx {
                id,
                node: &mut *node,
                backend: &mut *backend,
                frame,
                has_focus,
            };
            driver.draw(&mut cx);
        }

        if let Some(label) = label {
            // Bottom decoration row, else top decoration row, else last interior row.
            let target = match node.deco_surface {
                Some(deco) if node.margins.bottom > 0 => Some((deco, node.external.h - 1)),
                Some(deco) if node.margins.top > 0 => Some((deco, 0)),
                _ => node.surface.map(|s| (s, node.interior.h - 1)),
            };
            if let Some((surface, y)) = target {
                let len = i32::try_from(label.chars().count()).unwrap_or(i32::MAX);
                let x = (node.interior.w - len).max(0);
                backend.print(surface, x, y, Style::DEBUG, &label);
            }
        }

        if let Some(deco) = node.deco_surface {
            backend.flush(deco);
        }
        if let Some(surface) = node.surface {
            backend.flush(surface);
        }
        node.geometry_changed = false;
        node.content_invalid = false;
    }

    /// Run one loop iteration: read and route one input, sweep deletes, draw,
    /// present, and advance the frame counter. Returns the input that was read.
    pub fn run_frame(&mut self, input: &mut impl InputSource) -> Input {
        let read = input.read_key();
        match read {
            Input::Key(key) => {
                let _ = self.dispatch_key(key);
            }
            Input::Idle => {}
            Input::Closed => self.running = false,
        }
        self.sweep_deletes();
        self.draw();
        self.frame += 1;
        tracing::trace!(frame = self.frame, ?read, "frame done");
        read
    }

    /// Run frames until [`Tiles::quit`] is called or the input closes.
    pub fn run(&mut self, input: &mut impl InputSource) {
        self.running = true;
        tracing::debug!(fps = self.config.fps, "loop started");
        while self.running {
            if self.run_frame(input) == Input::Closed {
                break;
            }
        }
        self.running = false;
        tracing::debug!(frames = self.frame, "loop stopped");
    }

    /// Ask [`Tiles::run`] to stop after the current frame.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Returns `true` while [`Tiles::run`] is looping.
    pub fn is_running(&self) -> bool {
        self.running
    }
}
