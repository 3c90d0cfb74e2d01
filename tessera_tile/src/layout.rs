// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry fitting.
//!
//! Each tile is fitted against its *published* rectangle: normally the structural
//! parent's interior, or another tile's interior/exterior while a redirect is
//! active. The pass for one tile runs:
//!
//! 1. visibility pre-checks (explicit hide, float, hidden parent),
//! 2. placement of the requested rectangle ([`place`]: translate, center, fill,
//!    maximize, clip, origin check) unless the parent forced the geometry,
//! 3. interior inset by the margins,
//! 4. surface allocation and inverse-video inheritance,
//! 5. the kind's child-geometry hook,
//!
//! and then lays out every child against the new interior. Running the pass twice
//! with unchanged inputs gives the same rectangles.

use crate::backend::Backend;
use crate::driver::Capabilities;
use crate::error::{Result, TileError};
use crate::geometry::{Publish, Rect};
use crate::tree::{Tiles, node_in};
use crate::types::{TileFlags, TileId};

/// Place `requested` inside `published` according to the placement bits of `flags`.
///
/// Returns `None` when the placed rectangle starts at or beyond the far edge of
/// `published`, which hides the tile.
pub fn place(requested: Rect, flags: TileFlags, published: Rect) -> Option<Rect> {
    let mut r = Rect::new(
        published.x + requested.x,
        published.y + requested.y,
        requested.w,
        requested.h,
    );

    if flags.contains(TileFlags::CENTERED_H) {
        r.x = (published.x + (published.w - r.w) / 2).max(published.x);
    }
    if flags.contains(TileFlags::CENTERED_V) {
        r.y = (published.y + (published.h - r.h) / 2).max(published.y);
    }

    if flags.contains(TileFlags::FILL_H) {
        r.w = published.right() - r.x;
    }
    if flags.contains(TileFlags::FILL_V) {
        r.h = published.bottom() - r.y;
    }

    // Maximize wins over center and fill on its axis.
    if flags.contains(TileFlags::MAXIMIZED_H) {
        r.x = published.x;
        r.w = published.w;
    }
    if flags.contains(TileFlags::MAXIMIZED_V) {
        r.y = published.y;
        r.h = published.h;
    }

    if r.x < published.x {
        r.w -= published.x - r.x;
        r.x = published.x;
    }
    if r.y < published.y {
        r.h -= published.y - r.y;
        r.y = published.y;
    }
    if r.right() > published.right() {
        r.w = published.right() - r.x;
    }
    if r.bottom() > published.bottom() {
        r.h = published.bottom() - r.y;
    }
    r.w = r.w.max(0);
    r.h = r.h.max(0);

    if r.x >= published.right() || r.y >= published.bottom() {
        return None;
    }
    Some(r)
}

impl<B: Backend> Tiles<B> {
    /// Lay `id` and its subtree out again.
    pub fn relayout(&mut self, id: TileId) -> Result<()> {
        if !self.is_alive(id) {
            return Err(TileError::StaleTile(id));
        }
        self.layout(id);
        Ok(())
    }

    /// Write `child`'s external rectangle directly, bypassing placement.
    ///
    /// Meant for [`Driver::update_children_geometry`](crate::Driver::update_children_geometry):
    /// `rect` is in screen coordinates and the child is laid out with it once the
    /// hook returns. Outside of a hook, follow up with [`Tiles::relayout`].
    pub fn force_geometry(&mut self, child: TileId, rect: Rect) -> Result<()> {
        let node = self.node_opt_mut(child).ok_or(TileError::StaleTile(child))?;
        node.external = rect;
        node.flags.insert(TileFlags::GEOM_FORCED);
        Ok(())
    }

    /// Let `child` place itself again after [`Tiles::force_geometry`].
    pub fn release_geometry(&mut self, child: TileId) -> Result<()> {
        let node = self.node_opt_mut(child).ok_or(TileError::StaleTile(child))?;
        node.flags.remove(TileFlags::GEOM_FORCED);
        Ok(())
    }

    /// The rectangle `id` is fitted against.
    pub(crate) fn published_rect(&self, id: TileId) -> Option<Rect> {
        let node = self.node_opt(id)?;
        if let Some((source, publish)) = node.redirect
            && let Some(src) = self.node_opt(source)
        {
            return Some(match publish {
                Publish::Interior => src.interior,
                Publish::Exterior => src.external,
            });
        }
        match node.parent {
            Some(parent) => Some(self.node_opt(parent)?.interior),
            None => Some(self.config.screen),
        }
    }

    pub(crate) fn layout(&mut self, id: TileId) {
        let Some(visible) = self.fit(id) else {
            return;
        };
        if visible
            && let Some(node) = self.node_opt(id)
            && node.caps.contains(Capabilities::CHILD_GEOMETRY)
        {
            let driver = node.driver;
            driver.update_children_geometry(self, id);
        }
        let children = self.children_of(id).to_vec();
        for child in children {
            if self
                .flags(child)
                .is_some_and(|f| !f.contains(TileFlags::DELETED))
            {
                self.layout(child);
            }
        }
    }

    /// Fit one tile. `None` for stale or deleted tiles, else whether it is visible.
    fn fit(&mut self, id: TileId) -> Option<bool> {
        let published = self.published_rect(id)?;
        let (parent_hidden, parent_inverse) = self
            .parent_of(id)
            .and_then(|p| self.node_opt(p))
            .map_or((false, false), |p| {
                (p.flags.contains(TileFlags::HIDDEN), p.inverse)
            });

        let node = node_in(&mut self.nodes, id)?;
        if node.flags.contains(TileFlags::DELETED) {
            return None;
        }

        if node.pinned_hidden {
            node.flags.insert(TileFlags::HIDDEN);
            return Some(false);
        }
        if node.flags.contains(TileFlags::FLOAT) {
            node.flags.remove(TileFlags::HIDDEN);
        } else if parent_hidden {
            node.flags.insert(TileFlags::HIDDEN);
            return Some(false);
        }

        let external = if node.flags.contains(TileFlags::GEOM_FORCED) {
            node.external
        } else {
            match place(node.requested, node.flags, published) {
                Some(r) => r,
                None => {
                    node.flags.insert(TileFlags::HIDDEN);
                    tracing::trace!(?id, ?published, "placed outside its parent, hidden");
                    return Some(false);
                }
            }
        };

        let interior = external.inset(node.margins);
        if interior.is_empty() {
            node.flags.insert(TileFlags::HIDDEN);
            tracing::trace!(?id, ?external, "margins leave no interior, hidden");
            return Some(false);
        }
        node.flags.remove(TileFlags::HIDDEN);

        if node.external != external || node.interior != interior {
            node.geometry_changed = true;
        }
        node.external = external;
        node.interior = interior;
        node.inverse = node.flags.contains(TileFlags::INVERSE) || parent_inverse;

        if !node.flags.contains(TileFlags::NO_CANVAS) {
            let backend = &mut self.backend;
            let surface = match node.surface {
                Some(s) => {
                    backend.resize(s, interior.w, interior.h);
                    backend.move_to(s, interior.x, interior.y);
                    s
                }
                None => *node.surface.insert(backend.alloc(interior)),
            };
            backend.set_inverse(surface, node.inverse);

            if node.flags.contains(TileFlags::DECORATED) {
                let deco = match node.deco_surface {
                    Some(d) => {
                        backend.resize(d, external.w, external.h);
                        backend.move_to(d, external.x, external.y);
                        d
                    }
                    None => *node.deco_surface.insert(backend.alloc(external)),
                };
                backend.set_inverse(deco, node.inverse);
            } else if let Some(d) = node.deco_surface.take() {
                backend.free(d);
            }
        }

        tracing::trace!(?id, ?external, ?interior, "fitted tile");
        Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crate::geometry::Margins;
    use crate::kinds::{Frame, Plain};
    use crate::{Config, Family, TileSpec};

    const PARENT: Rect = Rect::new(10, 5, 40, 10);

    #[test]
    fn placement_translates_into_the_published_origin() {
        let r = place(Rect::new(2, 1, 5, 3), TileFlags::empty(), PARENT);
        assert_eq!(r, Some(Rect::new(12, 6, 5, 3)));
    }

    #[test]
    fn center_fill_and_maximize() {
        let centered = place(Rect::new(0, 0, 10, 4), TileFlags::CENTERED, PARENT);
        assert_eq!(centered, Some(Rect::new(25, 8, 10, 4)));

        // Wider than the parent: clamped to the parent's origin, then clipped.
        let wide = place(Rect::new(0, 0, 60, 1), TileFlags::CENTERED_H, PARENT);
        assert_eq!(wide, Some(Rect::new(10, 5, 40, 1)));

        let filled = place(Rect::new(4, 2, 0, 0), TileFlags::FILL, PARENT);
        assert_eq!(filled, Some(Rect::new(14, 7, 36, 8)));

        let maxed = place(
            Rect::new(4, 2, 3, 3),
            TileFlags::MAXIMIZED_H | TileFlags::FILL_H | TileFlags::CENTERED_H,
            PARENT,
        );
        assert_eq!(maxed, Some(Rect::new(10, 7, 40, 3)));
    }

    #[test]
    fn clipping_and_far_edge_visibility() {
        let clipped = place(Rect::new(35, 8, 10, 10), TileFlags::empty(), PARENT);
        assert_eq!(clipped, Some(Rect::new(45, 13, 5, 2)));

        let negative = place(Rect::new(-3, 0, 5, 1), TileFlags::empty(), PARENT);
        assert_eq!(negative, Some(Rect::new(10, 5, 2, 1)));

        assert_eq!(place(Rect::new(40, 0, 1, 1), TileFlags::empty(), PARENT), None);
        assert_eq!(place(Rect::new(0, 10, 1, 1), TileFlags::empty(), PARENT), None);
    }

    fn assert_contained(tiles: &Tiles, id: TileId) {
        let flags = tiles.flags(id).unwrap();
        if !flags.contains(TileFlags::HIDDEN) && !flags.contains(TileFlags::GEOM_FORCED) {
            let ext = tiles.external_rect(id).unwrap();
            let int = tiles.interior_rect(id).unwrap();
            let published = tiles.published_rect(id).unwrap();
            assert!(ext.contains_rect(&int), "{id:?}: interior escapes exterior");
            assert!(published.contains_rect(&ext), "{id:?}: exterior escapes parent");
        }
        for &child in tiles.children_of(id) {
            assert_contained(tiles, child);
        }
    }

    #[test]
    fn containment_holds_after_every_pass() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let desk = Plain::create(&mut tiles, root, Rect::new(0, 0, 80, 24)).unwrap();
        let win = Frame::create(&mut tiles, desk, Rect::new(50, 15, 40, 20), "big").unwrap();
        for (i, flags) in [
            TileFlags::empty(),
            TileFlags::FILL,
            TileFlags::CENTERED,
            TileFlags::MAXIMIZED_V,
        ]
        .into_iter()
        .enumerate()
        {
            let x = i32::try_from(i).unwrap() * 9;
            tiles
                .create(
                    win,
                    &Plain,
                    TileSpec::new(Family::Widget, Rect::new(x, 1, 12, 3)).with_flags(flags),
                )
                .unwrap();
        }
        assert_contained(&tiles, root);
        tiles.resize_screen(60, 18);
        assert_contained(&tiles, root);
        tiles.resize_screen(20, 5);
        assert_contained(&tiles, root);
    }

    #[test]
    fn layout_is_idempotent() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(3, 2, 30, 12), "w").unwrap();
        let inner = tiles
            .create(
                win,
                &Plain,
                TileSpec::new(Family::Container, Rect::new(1, 1, 0, 0)).with_flags(TileFlags::FILL),
            )
            .unwrap();
        let snapshot = |tiles: &Tiles| {
            [win, inner].map(|t| (tiles.external_rect(t), tiles.interior_rect(t)))
        };
        let first = snapshot(&tiles);
        tiles.relayout(root).unwrap();
        tiles.relayout(root).unwrap();
        assert_eq!(snapshot(&tiles), first);
    }

    #[test]
    fn oversized_margins_hide_the_tile() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let t = tiles
            .create(
                root,
                &Plain,
                TileSpec::new(Family::Container, Rect::new(0, 0, 2, 2))
                    .with_margins(Margins::uniform(1)),
            )
            .unwrap();
        assert!(tiles.flags(t).unwrap().contains(TileFlags::HIDDEN));
    }

    #[test]
    fn end_to_end_screen_resize() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let desk = Plain::create(&mut tiles, root, Rect::new(0, 0, 80, 24)).unwrap();
        let win = tiles
            .create(
                desk,
                &Frame,
                TileSpec::new(Family::Window, Rect::new(2, 2, 40, 10))
                    .with_margins(Margins::uniform(1)),
            )
            .unwrap();
        let label = tiles
            .create(win, &Plain, TileSpec::new(Family::Widget, Rect::new(0, 0, 10, 1)))
            .unwrap();
        assert_eq!(tiles.interior_rect(label), Some(Rect::new(3, 3, 10, 1)));

        tiles.resize_screen(40, 10);
        assert_eq!(tiles.external_rect(desk), Some(Rect::new(0, 0, 40, 10)));
        assert_eq!(tiles.external_rect(win), Some(Rect::new(2, 2, 38, 8)));
        assert_eq!(tiles.interior_rect(win), Some(Rect::new(3, 3, 36, 6)));
        assert_eq!(tiles.interior_rect(label), Some(Rect::new(3, 3, 10, 1)));
        assert!(tiles.geometry_changed(win));
    }

    struct Split;

    impl<B: Backend> Driver<B> for Split {
        fn capabilities(&self) -> Capabilities {
            Capabilities::CHILD_GEOMETRY
        }

        fn update_children_geometry(&self, tiles: &mut Tiles<B>, id: TileId) {
            let Some(area) = tiles.interior_rect(id) else {
                return;
            };
            let children = tiles.children_of(id).to_vec();
            let Ok(n) = i32::try_from(children.len()) else {
                return;
            };
            if n == 0 {
                return;
            }
            let w = area.w / n;
            for (i, child) in (0..).zip(children) {
                let _ = tiles.force_geometry(child, Rect::new(area.x + i * w, area.y, w, area.h));
            }
        }
    }

    #[test]
    fn child_geometry_hook_forces_children() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let split = tiles
            .create(root, &Split, TileSpec::new(Family::Container, Rect::new(0, 0, 40, 10)))
            .unwrap();
        let left = Plain::create(&mut tiles, split, Rect::ZERO).unwrap();
        let right = Plain::create(&mut tiles, split, Rect::ZERO).unwrap();
        tiles.relayout(split).unwrap();
        assert_eq!(tiles.external_rect(left), Some(Rect::new(0, 0, 20, 10)));
        assert_eq!(tiles.external_rect(right), Some(Rect::new(20, 0, 20, 10)));

        tiles.resize_screen(30, 10);
        assert_eq!(tiles.external_rect(left), Some(Rect::new(0, 0, 15, 10)));
        assert_eq!(tiles.external_rect(right), Some(Rect::new(15, 0, 15, 10)));
        assert!(tiles.flags(left).unwrap().contains(TileFlags::GEOM_FORCED));
    }

    #[test]
    fn forced_children_keep_explicit_and_inherited_hides() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let split = tiles
            .create(root, &Split, TileSpec::new(Family::Container, Rect::new(0, 0, 40, 10)))
            .unwrap();
        let left = Plain::create(&mut tiles, split, Rect::ZERO).unwrap();
        let right = Plain::create(&mut tiles, split, Rect::ZERO).unwrap();
        tiles.relayout(split).unwrap();

        tiles.hide(left);
        tiles.relayout(split).unwrap();
        assert!(tiles.flags(left).unwrap().contains(TileFlags::HIDDEN));
        assert!(!tiles.flags(right).unwrap().contains(TileFlags::HIDDEN));

        tiles.unhide(left);
        assert!(!tiles.flags(left).unwrap().contains(TileFlags::HIDDEN));
        assert_eq!(tiles.external_rect(left), Some(Rect::new(0, 0, 20, 10)));

        tiles.hide(split);
        tiles.relayout(split).unwrap();
        for t in [left, right] {
            assert!(tiles.flags(t).unwrap().contains(TileFlags::HIDDEN));
        }
        tiles.unhide(split);
        for t in [left, right] {
            assert!(!tiles.flags(t).unwrap().contains(TileFlags::HIDDEN));
        }
        assert_eq!(tiles.external_rect(right), Some(Rect::new(20, 0, 20, 10)));
    }

    #[test]
    fn redirect_lays_out_against_another_tile() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let tabs = Frame::create(&mut tiles, root, Rect::new(0, 0, 60, 20), "tabs").unwrap();
        let small = Plain::create(&mut tiles, root, Rect::new(60, 0, 10, 5)).unwrap();
        let dialog = tiles
            .create(
                small,
                &Plain,
                TileSpec::new(Family::Container, Rect::new(0, 0, 20, 6))
                    .with_flags(TileFlags::CENTERED),
            )
            .unwrap();
        let note = tiles
            .create(small, &Plain, TileSpec::new(Family::Container, Rect::new(2, 1, 10, 3)))
            .unwrap();
        assert_eq!(tiles.external_rect(dialog), Some(Rect::new(60, 0, 10, 5)));
        let note_home = tiles.external_rect(note);

        tiles.redirect_geometry(dialog, tabs, Publish::Interior).unwrap();
        assert_eq!(tiles.external_rect(dialog), Some(Rect::new(20, 7, 20, 6)));
        assert_eq!(tiles.parent_of(dialog), Some(small), "parentage is unchanged");

        // The frame's border separates its interior origin from its exterior one.
        tiles.redirect_geometry(note, tabs, Publish::Interior).unwrap();
        assert_eq!(tiles.external_rect(note), Some(Rect::new(3, 2, 10, 3)));
        tiles.redirect_geometry(note, tabs, Publish::Exterior).unwrap();
        assert_eq!(tiles.external_rect(note), Some(Rect::new(2, 1, 10, 3)));

        tiles.restore_geometry(dialog).unwrap();
        assert_eq!(tiles.external_rect(dialog), Some(Rect::new(60, 0, 10, 5)));
        tiles.restore_geometry(note).unwrap();
        assert_eq!(tiles.external_rect(note), note_home);
    }

    #[test]
    fn inverse_video_is_inherited() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 20, 10), "w").unwrap();
        let inner = tiles
            .create(win, &Plain, TileSpec::new(Family::Widget, Rect::new(0, 0, 6, 3)))
            .unwrap();
        tiles.set_flags(win, TileFlags::INVERSE).unwrap();
        assert!(tiles.node_opt(inner).unwrap().inverse);
        tiles.clear_flags(win, TileFlags::INVERSE).unwrap();
        assert!(!tiles.node_opt(inner).unwrap().inverse);
    }
}
