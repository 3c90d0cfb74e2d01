// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus path, focus groups, and keyboard navigation.
//!
//! Every tile holds a weak "focused child" handle. Starting at the root and
//! following those handles gives the focus path; its last element is the focused
//! tile. Tiles flagged [`TileFlags::INTERACTIVE`] are members of the nearest
//! enclosing [`TileFlags::FOCUS_GROUP`], in creation order. Navigation inside a
//! group is delegated to [`tessera_focus::DefaultPolicy`] over a snapshot of the
//! group's members.

use alloc::vec::Vec;

use smallvec::SmallVec;
use tessera_focus::{DefaultPolicy, FocusEntry, FocusPolicy, FocusSpace, Navigation};

use crate::backend::Backend;
use crate::driver::Capabilities;
use crate::error::{Result, TileError};
use crate::event::{Key, Outcome};
use crate::tree::Tiles;
use crate::types::{TileFlags, TileId};

/// The focus path, root first.
pub type FocusPath = SmallVec<[TileId; 8]>;

impl<B: Backend> Tiles<B> {
    /// The focus path from the root to the focused tile.
    ///
    /// Empty only once the tree has been shut down.
    pub fn focus_path(&self) -> FocusPath {
        let mut path = FocusPath::new();
        let mut cur = self.root();
        if !self.is_alive(cur) {
            return path;
        }
        path.push(cur);
        while let Some(next) = self.node_opt(cur).and_then(|n| n.focused_child) {
            if !self.is_alive(next) {
                break;
            }
            path.push(next);
            cur = next;
        }
        path
    }

    /// The deepest tile on the focus path.
    pub fn focused(&self) -> Option<TileId> {
        self.focus_path().last().copied()
    }

    /// Returns `true` if `id` is on the focus path.
    pub fn has_focus(&self, id: TileId) -> bool {
        self.focus_path().contains(&id)
    }

    /// Returns `true` if `id` is the deepest tile on the focus path.
    pub fn is_focused(&self, id: TileId) -> bool {
        self.focused() == Some(id)
    }

    /// The member of `group` its focused-child chain leads to, even if the group
    /// itself is not on the focus path right now.
    pub fn focused_member(&self, group: TileId) -> Option<TileId> {
        let mut cur = self.node_opt(group)?.focused_child;
        while let Some(t) = cur {
            let node = self.node_opt(t)?;
            if node.group == Some(group) {
                return Some(t);
            }
            cur = node.focused_child;
        }
        None
    }

    /// Returns `true` if `id` may take focus: live, interactive, visible, and not
    /// inside a subtree marked deleted.
    pub fn is_focusable(&self, id: TileId) -> bool {
        self.flags(id).is_some_and(|f| {
            f.contains(TileFlags::INTERACTIVE) && !f.contains(TileFlags::HIDDEN)
        }) && !self.is_deleted(id)
    }

    fn first_focusable_member(&self, group: TileId) -> Option<TileId> {
        self.node_opt(group)?
            .members
            .iter()
            .copied()
            .find(|&m| self.is_focusable(m))
    }

    /// Make `id` the focused tile.
    ///
    /// Links every ancestor's focused child toward `id`; if `id` is a focus group,
    /// focus continues into it (to its remembered member when that is still
    /// focusable, else to its first focusable member) and so on down. Tiles leaving
    /// the path are notified deepest first, tiles entering it outermost first.
    ///
    /// Focusing a tile marked deleted, or one below a tile marked deleted, does
    /// nothing.
    pub fn focus(&mut self, id: TileId) -> Result<()> {
        if !self.is_alive(id) {
            return Err(TileError::StaleTile(id));
        }
        if self.is_deleted(id) {
            return Ok(());
        }
        let old = self.focus_path();

        self.link_path(None, id);
        let mut deepest = id;
        while self
            .flags(deepest)
            .is_some_and(|f| f.contains(TileFlags::FOCUS_GROUP))
        {
            let target = self
                .focused_member(deepest)
                .filter(|&m| self.is_focusable(m))
                .or_else(|| self.first_focusable_member(deepest));
            let Some(member) = target else {
                break;
            };
            self.link_path(Some(deepest), member);
            deepest = member;
        }
        if let Some(n) = self.node_opt_mut(deepest) {
            n.focused_child = None;
        }

        let new = self.focus_path();
        if old != new {
            tracing::debug!(focused = ?deepest, "focus moved");
            self.notify_focus(&old, &new);
        }
        Ok(())
    }

    /// Point each ancestor of `id` at the child leading to `id`, stopping after
    /// `until` (or at the root).
    fn link_path(&mut self, until: Option<TileId>, id: TileId) {
        let mut child = id;
        while let Some(parent) = self.parent_of(child) {
            if let Some(p) = self.node_opt_mut(parent) {
                p.focused_child = Some(child);
            }
            if Some(parent) == until {
                break;
            }
            child = parent;
        }
    }

    fn notify_focus(&mut self, old: &[TileId], new: &[TileId]) {
        let leaving: Vec<TileId> = old.iter().rev().filter(|t| !new.contains(t)).copied().collect();
        let entering: Vec<TileId> = new.iter().filter(|t| !old.contains(t)).copied().collect();
        for (tiles, focused) in [(leaving, false), (entering, true)] {
            for t in tiles {
                let Some(node) = self.node_opt(t) else {
                    continue;
                };
                if node.caps.contains(Capabilities::FOCUS) {
                    let driver = node.driver;
                    driver.focus(self, t, focused);
                }
            }
        }
    }

    /// Repair the focus path after tiles went away.
    ///
    /// If the path runs into a removed or deleted tile, the path is cut there and
    /// focus is resolved again from the nearest surviving focus group that has
    /// something to focus (falling back to the root). Does nothing when the path
    /// is intact.
    pub fn refocus(&mut self) {
        let mut cur = self.root();
        if !self.is_alive(cur) {
            return;
        }
        loop {
            let Some(next) = self.node_opt(cur).and_then(|n| n.focused_child) else {
                return;
            };
            let gone = self
                .flags(next)
                .is_none_or(|f| f.contains(TileFlags::DELETED));
            if gone {
                if let Some(n) = self.node_opt_mut(cur) {
                    n.focused_child = None;
                }
                break;
            }
            cur = next;
        }

        let mut anchor = cur;
        loop {
            let is_group = self
                .flags(anchor)
                .is_some_and(|f| f.contains(TileFlags::FOCUS_GROUP));
            if is_group
                && (self.first_focusable_member(anchor).is_some() || self.is_focusable(anchor))
            {
                break;
            }
            match self.parent_of(anchor) {
                Some(p) => anchor = p,
                None => break,
            }
        }
        tracing::debug!(?anchor, "refocusing");
        let _ = self.focus(anchor);
    }

    /// Move focus inside `group` along its membership order.
    ///
    /// Accepts [`Navigation::Next`], [`Navigation::Prev`], [`Navigation::First`],
    /// and [`Navigation::Last`]; `Next`/`Prev` wrap around once. Returns the newly
    /// focused member, or `None` when nothing changed.
    pub fn navigate_sequential(&mut self, group: TileId, direction: Navigation) -> Option<TileId> {
        if direction.is_spatial() {
            return None;
        }
        self.navigate(group, direction)
    }

    /// Move focus inside `group` to the nearest member in an arrow direction.
    ///
    /// Candidates must lie further along the movement axis and overlap the focused
    /// member on the other axis. The closest center wins; on equal distance a later
    /// candidate takes over only when its overlap exceeds half of the best one's, so
    /// twice the overlap wins in either member order.
    /// Returns the newly focused member, or `None` when nothing changed.
    pub fn navigate_spatial(&mut self, group: TileId, direction: Navigation) -> Option<TileId> {
        if !direction.is_spatial() {
            return None;
        }
        self.navigate(group, direction)
    }

    fn navigate(&mut self, group: TileId, direction: Navigation) -> Option<TileId> {
        let members = &self.node_opt(group)?.members;
        let entries: Vec<FocusEntry<TileId>> = members
            .iter()
            .filter_map(|&m| {
                Some(FocusEntry {
                    id: m,
                    rect: self.node_opt(m)?.external.to_kurbo(),
                    enabled: self.is_focusable(m),
                })
            })
            .collect();
        let origin = self.focused_member(group);
        let space = FocusSpace { nodes: &entries };
        let target = DefaultPolicy::default().next(origin, direction, &space)?;
        if Some(target) == origin {
            return None;
        }
        self.focus(target).ok()?;
        Some(target)
    }

    /// Bind (or with `None`, unbind) a key that focuses `id` directly while its
    /// focus group routes keys.
    pub fn set_focus_key(&mut self, id: TileId, key: Option<Key>) -> Result<()> {
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        let old = core::mem::replace(&mut node.focus_key, key);
        let Some(group) = node.group else {
            return Ok(());
        };
        if let Some(g) = self.node_opt_mut(group) {
            if let Some(old) = old
                && g.bindings.get(&old) == Some(&id)
            {
                g.bindings.remove(&old);
            }
            if let Some(key) = key {
                g.bindings.insert(key, id);
            }
        }
        Ok(())
    }

    /// Route a key through `group`'s focus handling: focus-key bindings, then
    /// Tab/BackTab, then the arrow keys.
    pub fn focus_group_key(&mut self, group: TileId, key: Key) -> Outcome {
        let bound = self
            .node_opt(group)
            .and_then(|g| g.bindings.get(&key).copied());
        if let Some(target) = bound
            && self.is_focusable(target)
        {
            return match self.focus(target) {
                Ok(()) => Outcome::Handled,
                Err(_) => Outcome::Unhandled,
            };
        }

        let moved = match key {
            Key::Tab => self.navigate_sequential(group, Navigation::Next),
            Key::BackTab => self.navigate_sequential(group, Navigation::Prev),
            Key::Up => self.navigate_spatial(group, Navigation::Up),
            Key::Down => self.navigate_spatial(group, Navigation::Down),
            Key::Left => self.navigate_spatial(group, Navigation::Left),
            Key::Right => self.navigate_spatial(group, Navigation::Right),
            _ => None,
        };
        if moved.is_some() {
            Outcome::Handled
        } else {
            Outcome::Unhandled
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;
    use crate::driver::Driver;
    use crate::geometry::Rect;
    use crate::kinds::{Frame, Plain};
    use crate::{Config, Family, TileSpec};

    fn button(tiles: &mut Tiles, parent: TileId, rect: Rect) -> TileId {
        tiles
            .create(
                parent,
                &Plain,
                TileSpec::new(Family::Widget, rect).with_flags(TileFlags::INTERACTIVE),
            )
            .unwrap()
    }

    fn window_with_row(tiles: &mut Tiles) -> (TileId, [TileId; 3]) {
        let root = tiles.root();
        let win = Frame::create(tiles, root, Rect::new(0, 0, 60, 10), "w").unwrap();
        let a = button(tiles, win, Rect::new(0, 0, 10, 1));
        let b = button(tiles, win, Rect::new(12, 0, 10, 1));
        let c = button(tiles, win, Rect::new(24, 0, 10, 1));
        (win, [a, b, c])
    }

    #[test]
    fn focusing_a_group_descends_to_its_first_member() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [a, ..]) = window_with_row(&mut tiles);
        tiles.focus(win).unwrap();
        assert_eq!(tiles.focus_path().as_slice(), &[tiles.root(), win, a]);
        assert!(tiles.is_focused(a));
        assert!(tiles.has_focus(win));
        assert_eq!(tiles.focused_member(win), Some(a));
    }

    #[test]
    fn groups_remember_their_member() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [_, b, _]) = window_with_row(&mut tiles);
        let root = tiles.root();
        let other = Frame::create(&mut tiles, root, Rect::new(0, 12, 20, 5), "o").unwrap();
        let x = button(&mut tiles, other, Rect::new(0, 0, 5, 1));

        tiles.focus(b).unwrap();
        tiles.focus(x).unwrap();
        assert!(!tiles.has_focus(win));
        tiles.focus(win).unwrap();
        assert!(tiles.is_focused(b));
    }

    #[test]
    fn sequential_wraparound() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [a, b, c]) = window_with_row(&mut tiles);
        tiles.focus(c).unwrap();
        assert_eq!(tiles.navigate_sequential(win, Navigation::Next), Some(a));
        assert_eq!(tiles.navigate_sequential(win, Navigation::Prev), Some(c));
        assert_eq!(tiles.navigate_sequential(win, Navigation::Prev), Some(b));
        assert_eq!(tiles.navigate_sequential(win, Navigation::First), Some(a));
        assert_eq!(tiles.navigate_sequential(win, Navigation::Last), Some(c));
        assert_eq!(tiles.navigate_sequential(win, Navigation::Right), None);
    }

    #[test]
    fn empty_group_leaves_focus_unchanged() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 20, 5), "w").unwrap();
        let inert = tiles
            .create(win, &Plain, TileSpec::new(Family::Widget, Rect::new(0, 0, 4, 1)))
            .unwrap();
        tiles.focus(win).unwrap();
        let before = tiles.focus_path();
        assert_eq!(tiles.navigate_sequential(win, Navigation::Next), None);
        assert_eq!(tiles.focus_group_key(win, Key::Tab), Outcome::Unhandled);
        assert_eq!(tiles.focus_path(), before);
        assert!(!tiles.has_focus(inert));
    }

    #[test]
    fn spatial_tie_break_prefers_overlap() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 40, 18), "w").unwrap();
        let origin = button(&mut tiles, win, Rect::new(0, 0, 10, 10));
        // Both centers lie at squared distance 169 from the origin's center; the
        // second candidate overlaps the origin on twice as many rows.
        let half = button(&mut tiles, win, Rect::new(12, 5, 10, 10));
        let full = button(&mut tiles, win, Rect::new(13, 0, 10, 10));

        let overlap = |tiles: &Tiles, t| {
            let r = tiles.external_rect(t).unwrap();
            let o = tiles.external_rect(origin).unwrap();
            r.bottom().min(o.bottom()) - r.y.max(o.y)
        };
        assert_eq!(overlap(&tiles, half), 5);
        assert_eq!(overlap(&tiles, full), 10);

        tiles.focus(origin).unwrap();
        assert_eq!(tiles.navigate_spatial(win, Navigation::Right), Some(full));
    }

    #[test]
    fn spatial_tie_break_ignores_member_order() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 40, 18), "w").unwrap();
        let origin = button(&mut tiles, win, Rect::new(0, 0, 10, 10));
        // Same geometry as above, the full-overlap candidate joins the group first.
        let full = button(&mut tiles, win, Rect::new(13, 0, 10, 10));
        let half = button(&mut tiles, win, Rect::new(12, 5, 10, 10));

        tiles.focus(origin).unwrap();
        assert_eq!(tiles.navigate_spatial(win, Navigation::Right), Some(full));
        assert!(!tiles.is_focused(half));
    }

    #[test]
    fn spatial_moves_and_misses() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [a, b, c]) = window_with_row(&mut tiles);
        tiles.focus(a).unwrap();
        assert_eq!(tiles.focus_group_key(win, Key::Right), Outcome::Handled);
        assert!(tiles.is_focused(b));
        assert_eq!(tiles.navigate_spatial(win, Navigation::Right), Some(c));
        assert_eq!(tiles.navigate_spatial(win, Navigation::Right), None);
        assert_eq!(tiles.navigate_spatial(win, Navigation::Up), None);
        assert_eq!(tiles.navigate_spatial(win, Navigation::Next), None);
        assert!(tiles.is_focused(c));
    }

    #[test]
    fn hidden_and_deleted_members_are_skipped() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [a, b, c]) = window_with_row(&mut tiles);
        tiles.focus(a).unwrap();
        tiles.hide(b);
        assert_eq!(tiles.navigate_sequential(win, Navigation::Next), Some(c));
        tiles.mark_deleted(a);
        assert_eq!(tiles.navigate_sequential(win, Navigation::Next), None);
        assert!(tiles.is_focused(c));
    }

    #[test]
    fn members_below_a_deleted_tile_are_skipped() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 40, 10), "w").unwrap();
        let a = button(&mut tiles, win, Rect::new(0, 0, 10, 1));
        let pane = Plain::create(&mut tiles, win, Rect::new(0, 2, 20, 4)).unwrap();
        let b = button(&mut tiles, pane, Rect::new(0, 0, 10, 1));

        tiles.focus(a).unwrap();
        tiles.mark_deleted(pane);
        assert!(!tiles.is_focusable(b));
        assert_eq!(tiles.navigate_sequential(win, Navigation::Next), None);
        assert!(!tiles.is_focused(b));

        tiles.focus(b).unwrap();
        assert!(tiles.is_focused(a), "focusing inside a deleted pane does nothing");
    }

    #[test]
    fn refocus_after_deleting_the_focused_tile() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [a, b, _]) = window_with_row(&mut tiles);
        tiles.focus(a).unwrap();
        tiles.mark_deleted(a);
        tiles.sweep_deletes();
        assert_eq!(tiles.focused(), Some(b));
        assert!(tiles.has_focus(win));

        // Deleting the whole window falls back to the root.
        tiles.mark_deleted(win);
        tiles.sweep_deletes();
        assert_eq!(tiles.focus_path().as_slice(), &[tiles.root()]);
    }

    #[test]
    fn refocus_is_a_no_op_on_an_intact_path() {
        let mut tiles = Tiles::new(Config::default());
        let (_, [_, b, _]) = window_with_row(&mut tiles);
        tiles.focus(b).unwrap();
        tiles.refocus();
        assert!(tiles.is_focused(b));
    }

    #[test]
    fn focus_keys_jump_directly() {
        let mut tiles = Tiles::new(Config::default());
        let (win, [a, _, c]) = window_with_row(&mut tiles);
        tiles.focus(a).unwrap();
        tiles.set_focus_key(c, Some(Key::F(3))).unwrap();
        assert_eq!(tiles.dispatch_key(Key::F(3)), Outcome::Handled);
        assert!(tiles.is_focused(c));

        tiles.set_focus_key(c, None).unwrap();
        tiles.focus(a).unwrap();
        assert_eq!(tiles.focus_group_key(win, Key::F(3)), Outcome::Unhandled);
    }

    struct Watch;

    type Log = Vec<(TileId, bool)>;

    impl<B: Backend> Driver<B> for Watch {
        fn capabilities(&self) -> Capabilities {
            Capabilities::FOCUS
        }

        fn focus(&self, tiles: &mut Tiles<B>, id: TileId, focused: bool) {
            let root = tiles.root();
            if let Some(log) = tiles.data_mut::<Log>(root) {
                log.push((id, focused));
            }
        }
    }

    #[test]
    fn focus_hooks_fire_in_path_order() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        tiles.set_data(root, Box::new(Log::new())).unwrap();
        let spec = |rect| {
            TileSpec::new(Family::Window, rect)
                .with_flags(TileFlags::FOCUS_GROUP | TileFlags::INTERACTIVE)
        };
        let left = tiles.create(root, &Watch, spec(Rect::new(0, 0, 10, 5))).unwrap();
        let right = tiles.create(root, &Watch, spec(Rect::new(10, 0, 10, 5))).unwrap();
        let la = tiles
            .create(
                left,
                &Watch,
                TileSpec::new(Family::Widget, Rect::new(0, 0, 4, 1))
                    .with_flags(TileFlags::INTERACTIVE),
            )
            .unwrap();

        tiles.focus(left).unwrap();
        assert_eq!(
            tiles.data::<Log>(root).unwrap().as_slice(),
            &[(left, true), (la, true)]
        );
        tiles.data_mut::<Log>(root).unwrap().clear();

        tiles.focus(right).unwrap();
        assert_eq!(
            tiles.data::<Log>(root).unwrap().as_slice(),
            &[(la, false), (left, false), (right, true)]
        );
    }
}
