// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key events and their propagation through tiles.
//!
//! A key delivered to a tile is offered, in order, to:
//!
//! 1. the application key handler set with [`Tiles::set_key_handler`],
//! 2. the kind's [`Driver::event`](crate::Driver::event) slot,
//! 3. the tile's focus group routing ([`Tiles::focus_group_key`]) if it is a focus group.
//!
//! The first `Handled` stops propagation. [`Tiles::dispatch_key`] delivers a key to the
//! focus path, deepest tile first.

use crate::backend::Backend;
use crate::driver::Capabilities;
use crate::tree::Tiles;
use crate::types::{TileFlags, TileId};

/// A decoded key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// A character pressed with Control.
    Ctrl(char),
    /// Function key `F(n)`.
    F(u8),
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Tab.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Enter.
    Enter,
    /// Escape.
    Esc,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Insert.
    Insert,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
}

/// Result of offering an event to a handler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The event was consumed; stop propagation.
    Handled,
    /// The event was not consumed; keep going.
    Unhandled,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Handled`].
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

impl<B: Backend> Tiles<B> {
    /// Offer `key` to a single tile.
    ///
    /// Stale tiles, deleted tiles, and tiles below a deleted one never handle
    /// anything.
    pub fn handle_key(&mut self, id: TileId, key: Key) -> Outcome {
        if self.is_deleted(id) {
            return Outcome::Unhandled;
        }
        let Some(node) = self.node_opt_mut(id) else {
            return Outcome::Unhandled;
        };

        if let Some(mut handler) = node.key_handler.take() {
            let outcome = handler(self, id, key);
            if let Some(node) = self.node_opt_mut(id)
                && node.key_handler.is_none()
            {
                node.key_handler = Some(handler);
            }
            if outcome.is_handled() {
                tracing::trace!(?id, ?key, "key taken by application handler");
                return outcome;
            }
        }

        let Some(node) = self.node_opt(id) else {
            return Outcome::Unhandled;
        };
        if node.caps.contains(Capabilities::EVENTS) {
            let driver = node.driver;
            if driver.event(self, id, key).is_handled() {
                tracing::trace!(?id, ?key, "key taken by driver");
                return Outcome::Handled;
            }
        }

        if self
            .flags(id)
            .is_some_and(|f| f.contains(TileFlags::FOCUS_GROUP))
        {
            return self.focus_group_key(id, key);
        }
        Outcome::Unhandled
    }

    /// Deliver `key` along the focus path, deepest tile first, until one handles it.
    pub fn dispatch_key(&mut self, key: Key) -> Outcome {
        let path = self.focus_path();
        for &id in path.iter().rev() {
            if self.handle_key(id, key).is_handled() {
                return Outcome::Handled;
            }
        }
        tracing::trace!(?key, "key unhandled");
        Outcome::Unhandled
    }
}
