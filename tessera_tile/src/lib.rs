// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Tile: the core of a terminal tile toolkit.
//!
//! Everything on screen is a *tile*: a rectangular region with a parent, ordered
//! children, a kind, and an optional canvas. This crate owns the tile tree and the
//! machinery around it:
//!
//! - A generational tile arena ([`Tiles`]) with family rules ([`Family`]), deferred
//!   deletion, and teardown that releases canvases and private data.
//! - A deterministic layout engine that fits each tile's requested rectangle into
//!   the rectangle its parent publishes, honoring maximize, center, fill, float,
//!   forced geometry, and redirection (see [`place`] and [`Tiles::relayout`]).
//! - Per-kind behavior through the [`Driver`] trait, whose declared
//!   [`Capabilities`] decide which slots the engine calls.
//! - Focus groups, the focus path, focus keys, and spatial/sequential navigation
//!   built on [`tessera_focus`].
//! - Key routing along the focus path and a frame loop that sweeps deleted tiles,
//!   draws top-down, and presents once per frame.
//!
//! Rendering goes through the [`Backend`] trait. [`Headless`] keeps every surface in
//! memory and is what the tests and demos use; a real terminal backend implements the
//! same ten calls.
//!
//! ## Minimal example
//!
//! ```rust
//! use tessera_tile::kinds::{Frame, Plain};
//! use tessera_tile::{Config, Key, Rect, ScriptedInput, Tiles};
//!
//! let mut tiles = Tiles::new(Config::default().with_screen(40, 10));
//! let root = tiles.root();
//! let desk = Plain::create(&mut tiles, root, Rect::new(0, 0, 40, 10)).unwrap();
//! let win = Frame::create(&mut tiles, desk, Rect::new(2, 1, 20, 5), "hello").unwrap();
//! tiles.focus(win).unwrap();
//!
//! // The window's interior sits inside its one-cell border.
//! assert_eq!(tiles.interior_rect(win), Some(Rect::new(3, 2, 18, 3)));
//!
//! let mut input = ScriptedInput::new([Key::Tab]);
//! tiles.run(&mut input);
//! assert_eq!(tiles.backend().row(1).trim_end(), "  ╔═hello════════════╗");
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for lifecycle and focus changes,
//! `trace` for per-tile layout, `warn` for rejected structural operations) and
//! never installs a subscriber.
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`, `tessera_focus`, and `tracing`.
//! - `libm`: enables `no_std` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backend;
mod config;
mod debug;
mod driver;
mod error;
mod event;
mod focus;
mod frame;
mod geometry;
mod headless;
mod layout;
mod tree;
mod types;

pub mod kinds;

pub use backend::{Backend, Style, SurfaceId};
pub use config::Config;
pub use driver::{Capabilities, DrawCx, Driver};
pub use error::{Result, TileError};
pub use event::{Key, Outcome};
pub use focus::FocusPath;
pub use frame::{FrameContext, Input, InputSource};
pub use geometry::{Margins, Publish, Rect};
pub use headless::{Cell, Headless, ScriptedInput};
pub use layout::place;
pub use tessera_focus::Navigation;
pub use tree::{ChangeHandler, KeyHandler, TileSpec, Tiles, UpdateHandler};
pub use types::{Family, TileFlags, TileId};
