// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two windows of counters driven by a scripted key sequence.
//!
//! Enter or `+` bumps the focused counter, `-` lowers it, Tab cycles inside a
//! window, arrows move between counters and between windows, digit keys jump to
//! a counter directly, and Esc quits. The final screen is printed to stdout.
//!
//! Run with `RUST_LOG=tessera_tile=debug` to see lifecycle and focus events.

use tessera_tile::kinds::{Frame, Plain};
use tessera_tile::{
    Backend, Capabilities, Config, DrawCx, Driver, Family, Key, Outcome, Rect, Result,
    ScriptedInput, TileFlags, TileId, TileSpec, Tiles,
};
use tracing_subscriber::EnvFilter;

/// A focusable number.
struct Counter;

impl Counter {
    fn create(tiles: &mut Tiles, parent: TileId, y: i32, name: &str, key: char) -> Result<TileId> {
        let spec = TileSpec::new(Family::Widget, Rect::new(0, y, 18, 1))
            .with_name(name)
            .with_flags(TileFlags::INTERACTIVE);
        let id = tiles.create_with_data(parent, &Counter, spec, Box::new(0_i64))?;
        tiles.set_focus_key(id, Some(Key::Char(key)))?;
        Ok(id)
    }
}

impl<B: Backend> Driver<B> for Counter {
    fn capabilities(&self) -> Capabilities {
        Capabilities::DRAW | Capabilities::EVENTS
    }

    fn draw(&self, cx: &mut DrawCx<'_, B>) {
        let value = cx.data::<i64>().copied().unwrap_or_default();
        let marker = if cx.has_focus() { '>' } else { ' ' };
        let text = format!("{marker} {}: {value}", cx.name().unwrap_or("?"));
        let style = cx.style();
        cx.print(0, 0, style, &text);
    }

    fn event(&self, tiles: &mut Tiles<B>, id: TileId, key: Key) -> Outcome {
        let delta = match key {
            Key::Enter | Key::Char('+') => 1,
            Key::Char('-') => -1,
            _ => return Outcome::Unhandled,
        };
        if let Some(value) = tiles.data_mut::<i64>(id) {
            *value += delta;
        }
        tiles.changed(id);
        Outcome::Handled
    }
}

/// A desk holding two framed windows of two counters each.
fn build(tiles: &mut Tiles) -> Result<Vec<TileId>> {
    let root = tiles.root();
    let desk = Plain::create(tiles, root, Rect::new(0, 0, 48, 10))?;
    tiles.set_name(desk, "desk");

    let mut windows = Vec::new();
    for (x, title, keys) in [(1, "left", ['1', '2']), (25, "right", ['3', '4'])] {
        let win = Frame::create(tiles, desk, Rect::new(x, 1, 22, 6), title)?;
        Counter::create(tiles, win, 0, &format!("{title} a"), keys[0])?;
        Counter::create(tiles, win, 2, &format!("{title} b"), keys[1])?;
        windows.push(win);
    }
    Ok(windows)
}

fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera_tile=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mut tiles = Tiles::new(Config::default().with_screen(48, 10));
    let windows = match build(&mut tiles) {
        Ok(windows) => windows,
        Err(err) => {
            tracing::error!(%err, "cannot build the screen");
            return;
        }
    };

    let root = tiles.root();
    tiles.set_key_handler(root, |tiles, _, key| {
        if key == Key::Esc {
            tiles.quit();
            Outcome::Handled
        } else {
            Outcome::Unhandled
        }
    });
    if let Some(&first) = windows.first() {
        let _ = tiles.focus(first);
    }

    let mut input = ScriptedInput::new([
        Key::Enter,
        Key::Down,
        Key::Char('+'),
        Key::Char('+'),
        Key::Right,
        Key::Char('4'),
        Key::Char('-'),
        Key::Esc,
        Key::Enter,
    ]);
    tiles.run(&mut input);
    tracing::info!(unread = input.remaining(), "script finished");

    for y in 0..10 {
        println!("{}", tiles.backend().row(y).trim_end());
    }
}
