// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile arena: structure, lifecycle, and attribute access.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use hashbrown::HashMap;

use crate::backend::{Backend, Style, SurfaceId};
use crate::config::Config;
use crate::driver::{Capabilities, Driver};
use crate::error::{Result, TileError};
use crate::event::{Key, Outcome};
use crate::geometry::{Margins, Publish, Rect};
use crate::headless::Headless;
use crate::kinds::Screen;
use crate::types::{Family, TileFlags, TileId};

/// Application key handler: runs before the kind's own event slot.
pub type KeyHandler<B> = Box<dyn FnMut(&mut Tiles<B>, TileId, Key) -> Outcome>;

/// Application update handler: runs right before a tile that accepts updates is drawn.
pub type UpdateHandler<B> = Box<dyn FnMut(&mut Tiles<B>, TileId)>;

/// Application change handler: decides whether a change notification invalidates content.
pub type ChangeHandler<B> = Box<dyn FnMut(&mut Tiles<B>, TileId) -> bool>;

/// Creation parameters of a tile.
///
/// `rect` is relative to the parent's published rectangle. Any flag may be passed
/// here; this is how a kind's constructor sets kind-internal bits such as
/// [`TileFlags::FOCUS_GROUP`]. [`TileFlags::DELETED`] is always stripped,
/// [`TileFlags::DECORATED`] is derived from `margins`.
#[derive(Clone, Debug)]
pub struct TileSpec {
    /// Structural family.
    pub family: Family,
    /// Requested rectangle.
    pub rect: Rect,
    /// Decoration margins.
    pub margins: Margins,
    /// Debug name.
    pub name: Option<String>,
    /// Application id.
    pub id: Option<i32>,
    /// Initial flags.
    pub flags: TileFlags,
    /// Background style.
    pub style: Style,
}

impl Default for TileSpec {
    fn default() -> Self {
        Self {
            family: Family::Widget,
            rect: Rect::ZERO,
            margins: Margins::ZERO,
            name: None,
            id: None,
            flags: TileFlags::empty(),
            style: Style::NONE,
        }
    }
}

impl TileSpec {
    /// A spec with the given family and requested rectangle.
    pub fn new(family: Family, rect: Rect) -> Self {
        Self {
            family,
            rect,
            ..Self::default()
        }
    }

    /// Set the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the application id.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the decoration margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Add flags.
    pub fn with_flags(mut self, flags: TileFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the background style.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

pub(crate) struct Node<B: Backend> {
    pub(crate) generation: u32,
    pub(crate) parent: Option<TileId>,
    pub(crate) children: Vec<TileId>,
    pub(crate) family: Family,
    pub(crate) name: Option<String>,
    pub(crate) user_id: Option<i32>,

    pub(crate) requested: Rect,
    pub(crate) margins: Margins,
    pub(crate) external: Rect,
    pub(crate) interior: Rect,
    pub(crate) flags: TileFlags,
    /// Hidden through [`Tiles::hide`]; layout keeps it hidden until [`Tiles::unhide`].
    pub(crate) pinned_hidden: bool,
    /// Effective inverse video: own flag or inherited from the parent.
    pub(crate) inverse: bool,
    pub(crate) style: Style,

    pub(crate) driver: &'static dyn Driver<B>,
    pub(crate) caps: Capabilities,
    pub(crate) data: Option<Box<dyn Any>>,
    pub(crate) surface: Option<SurfaceId>,
    pub(crate) deco_surface: Option<SurfaceId>,
    pub(crate) redirect: Option<(TileId, Publish)>,

    /// Focus group this tile is a member of.
    pub(crate) group: Option<TileId>,
    /// Members, in creation order (focus groups only).
    pub(crate) members: Vec<TileId>,
    /// Focus-key bindings of the members (focus groups only).
    pub(crate) bindings: HashMap<Key, TileId>,
    pub(crate) focused_child: Option<TileId>,
    pub(crate) focus_key: Option<Key>,

    pub(crate) key_handler: Option<KeyHandler<B>>,
    pub(crate) update_handler: Option<UpdateHandler<B>>,
    pub(crate) change_handler: Option<ChangeHandler<B>>,
    pub(crate) accept_updates: bool,

    pub(crate) geometry_changed: bool,
    pub(crate) content_invalid: bool,
}

impl<B: Backend> Node<B> {
    fn new(
        generation: u32,
        driver: &'static dyn Driver<B>,
        spec: TileSpec,
        data: Option<Box<dyn Any>>,
    ) -> Self {
        let caps = driver.capabilities();
        let mut flags = spec.flags - TileFlags::DELETED - TileFlags::DECORATED;
        if !caps.contains(Capabilities::DRAW) {
            flags |= TileFlags::NO_CANVAS;
        }
        if !spec.margins.is_zero() {
            flags |= TileFlags::DECORATED;
        }
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            family: spec.family,
            name: spec.name,
            user_id: spec.id,
            requested: spec.rect,
            margins: spec.margins,
            external: Rect::ZERO,
            interior: Rect::ZERO,
            flags,
            pinned_hidden: flags.contains(TileFlags::HIDDEN),
            inverse: flags.contains(TileFlags::INVERSE),
            style: spec.style,
            driver,
            caps,
            data,
            surface: None,
            deco_surface: None,
            redirect: None,
            group: None,
            members: Vec::new(),
            bindings: HashMap::new(),
            focused_child: None,
            focus_key: None,
            key_handler: None,
            update_handler: None,
            change_handler: None,
            accept_updates: false,
            geometry_changed: true,
            content_invalid: true,
        }
    }
}

/// The tile tree.
///
/// Owns every tile, the root "screen" tile, the rendering backend, and the frame
/// loop state. The type parameter `B` selects the rendering surface service; it
/// defaults to the in-memory [`Headless`] backend.
///
/// Tiles are addressed by generational [`TileId`] handles. Children are owned by
/// their parent (a tile never outlives it); parent, focus, and redirect links are
/// plain handles that go stale when their target is removed.
///
/// ```rust
/// use tessera_tile::{Config, Family, Margins, Rect, TileSpec, Tiles};
/// use tessera_tile::kinds::{Frame, Plain};
///
/// let mut tiles = Tiles::new(Config::default());
/// let root = tiles.root();
/// let desk = Plain::create(&mut tiles, root, Rect::new(0, 0, 80, 24)).unwrap();
/// let win = Frame::create(&mut tiles, desk, Rect::new(2, 2, 40, 10), "editor").unwrap();
///
/// assert_eq!(tiles.external_rect(win), Some(Rect::new(2, 2, 40, 10)));
/// assert_eq!(tiles.interior_rect(win), Some(Rect::new(3, 3, 38, 8)));
///
/// // Windows may not parent windows.
/// assert!(Frame::create(&mut tiles, win, Rect::new(0, 0, 5, 5), "nested").is_err());
/// ```
pub struct Tiles<B: Backend = Headless> {
    /// slots
    pub(crate) nodes: Vec<Option<Node<B>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: TileId,
    pub(crate) backend: B,
    pub(crate) config: Config,
    pub(crate) frame: u64,
    pub(crate) running: bool,
}

impl<B: Backend + core::fmt::Debug> core::fmt::Debug for Tiles<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.len();
        f.debug_struct("Tiles")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("root", &self.root)
            .field("config", &self.config)
            .field("frame", &self.frame)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Tiles {
    /// Create a tree drawing into a [`Headless`] backend sized to `config.screen`.
    pub fn new(config: Config) -> Self {
        let backend = Headless::new(config.screen.w, config.screen.h);
        Self::with_backend(backend, config)
    }
}

impl<B: Backend> Tiles<B> {
    /// Create a tree with a specific backend.
    ///
    /// The root tile is a [`Family::Container`] focus group without a canvas,
    /// covering `config.screen`.
    pub fn with_backend(backend: B, config: Config) -> Self {
        let mut tiles = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: TileId::new(0, 1),
            backend,
            config,
            frame: 0,
            running: false,
        };
        let spec = TileSpec::new(
            Family::Container,
            Rect::new(0, 0, config.screen.w, config.screen.h),
        )
        .with_name("screen")
        .with_flags(TileFlags::FOCUS_GROUP | TileFlags::NO_CANVAS);
        tiles.root = tiles.insert(&Screen, spec, None);
        tiles.layout(tiles.root);
        tiles
    }

    /// The rendering backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The rendering backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The root tile.
    pub fn root(&self) -> TileId {
        self.root
    }

    fn insert(
        &mut self,
        driver: &'static dyn Driver<B>,
        spec: TileSpec,
        data: Option<Box<dyn Any>>,
    ) -> TileId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, driver, spec, data));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "TileId indices are 32-bit."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, driver, spec, data)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "TileId indices are 32-bit."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        TileId::new(idx, generation)
    }

    /// Create a tile under `parent`.
    ///
    /// The tile is appended to the parent's children (draw and focus order is
    /// creation order), joins the nearest enclosing focus group when it is
    /// [`TileFlags::INTERACTIVE`], and is laid out immediately.
    ///
    /// Fails with [`TileError::IncompatibleFamily`] when `parent`'s family may not
    /// parent `spec.family`; the tree is left unchanged.
    pub fn create(
        &mut self,
        parent: TileId,
        driver: &'static dyn Driver<B>,
        spec: TileSpec,
    ) -> Result<TileId> {
        self.create_inner(parent, driver, spec, None)
    }

    /// Create a tile under `parent` carrying kind-private `data`.
    ///
    /// The data is released through [`Driver::destroy_data`] when the kind declares
    /// [`Capabilities::DESTROY_DATA`], and dropped otherwise.
    pub fn create_with_data(
        &mut self,
        parent: TileId,
        driver: &'static dyn Driver<B>,
        spec: TileSpec,
        data: Box<dyn Any>,
    ) -> Result<TileId> {
        self.create_inner(parent, driver, spec, Some(data))
    }

    fn create_inner(
        &mut self,
        parent: TileId,
        driver: &'static dyn Driver<B>,
        spec: TileSpec,
        data: Option<Box<dyn Any>>,
    ) -> Result<TileId> {
        let parent_family = self.family(parent).ok_or(TileError::StaleTile(parent))?;
        if !parent_family.can_parent(spec.family) {
            tracing::warn!(
                ?parent,
                ?parent_family,
                child = ?spec.family,
                "rejected tile with incompatible family"
            );
            return Err(TileError::IncompatibleFamily {
                parent: parent_family,
                child: spec.family,
            });
        }

        let group = self.enclosing_group(parent);
        let id = self.insert(driver, spec, data);

        if let Some(p) = self.node_opt_mut(parent) {
            p.children.push(id);
        }
        let interactive = self.node_opt_mut(id).is_some_and(|n| {
            n.parent = Some(parent);
            n.flags.contains(TileFlags::INTERACTIVE)
        });
        if interactive && let Some(g) = group {
            if let Some(g) = self.node_opt_mut(g) {
                g.members.push(id);
            }
            if let Some(n) = self.node_opt_mut(id) {
                n.group = Some(g);
            }
        }

        self.layout(id);
        tracing::debug!(?id, ?parent, name = self.name(id), "created tile");
        Ok(id)
    }

    /// Nearest tile at or above `id` flagged [`TileFlags::FOCUS_GROUP`].
    fn enclosing_group(&self, id: TileId) -> Option<TileId> {
        let mut cur = Some(id);
        while let Some(t) = cur {
            let node = self.node_opt(t)?;
            if node.flags.contains(TileFlags::FOCUS_GROUP) {
                return Some(t);
            }
            cur = node.parent;
        }
        None
    }

    // --- accessors ---

    /// Returns true if `id` refers to a live tile.
    ///
    /// Tiles marked deleted are still live until the next [`Tiles::sweep_deletes`].
    pub fn is_alive(&self, id: TileId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Number of live tiles, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns `true` once the whole tree, root included, has been destroyed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the parent of a tile, or `None` for the root or a stale id.
    pub fn parent_of(&self, id: TileId) -> Option<TileId> {
        self.node_opt(id)?.parent
    }

    /// Children of a tile in creation order, or an empty slice for a stale id.
    pub fn children_of(&self, id: TileId) -> &[TileId] {
        self.node_opt(id).map_or(&[], |n| &n.children)
    }

    /// Family of a tile.
    pub fn family(&self, id: TileId) -> Option<Family> {
        Some(self.node_opt(id)?.family)
    }

    /// Flags of a tile.
    pub fn flags(&self, id: TileId) -> Option<TileFlags> {
        Some(self.node_opt(id)?.flags)
    }

    /// Debug name of a tile.
    pub fn name(&self, id: TileId) -> Option<&str> {
        self.node_opt(id)?.name.as_deref()
    }

    /// Application id of a tile.
    pub fn user_id(&self, id: TileId) -> Option<i32> {
        self.node_opt(id)?.user_id
    }

    /// External rectangle as of the last layout pass.
    pub fn external_rect(&self, id: TileId) -> Option<Rect> {
        Some(self.node_opt(id)?.external)
    }

    /// Interior rectangle as of the last layout pass.
    pub fn interior_rect(&self, id: TileId) -> Option<Rect> {
        Some(self.node_opt(id)?.interior)
    }

    /// Requested rectangle, relative to the published rectangle.
    pub fn requested_rect(&self, id: TileId) -> Option<Rect> {
        Some(self.node_opt(id)?.requested)
    }

    /// Decoration margins.
    pub fn margins(&self, id: TileId) -> Option<Margins> {
        Some(self.node_opt(id)?.margins)
    }

    /// Background style.
    pub fn style(&self, id: TileId) -> Option<Style> {
        Some(self.node_opt(id)?.style)
    }

    /// Kind-private data, if the tile carries data of type `T`.
    pub fn data<T: Any>(&self, id: TileId) -> Option<&T> {
        self.node_opt(id)?.data.as_deref()?.downcast_ref()
    }

    /// Kind-private data, mutably.
    pub fn data_mut<T: Any>(&mut self, id: TileId) -> Option<&mut T> {
        self.node_opt_mut(id)?.data.as_deref_mut()?.downcast_mut()
    }

    /// Returns `true` while a layout pass changed the tile's rectangles and no draw
    /// pass has consumed the change yet.
    pub fn geometry_changed(&self, id: TileId) -> bool {
        self.node_opt(id).is_some_and(|n| n.geometry_changed)
    }

    /// Returns `true` if the tile's content is marked invalid.
    pub fn content_invalid(&self, id: TileId) -> bool {
        self.node_opt(id).is_some_and(|n| n.content_invalid)
    }

    /// Get the next tile in depth-first traversal order.
    ///
    /// Tombstoned tiles are included. Returns `None` at the end of the tree or if
    /// `current` is stale.
    pub fn next_depth_first(&self, current: TileId) -> Option<TileId> {
        let node = self.node_opt(current)?;
        if let Some(&first) = node.children.first() {
            return Some(first);
        }
        let mut cur = current;
        while let Some(parent) = self.parent_of(cur) {
            let siblings = self.children_of(parent);
            let pos = siblings.iter().position(|&c| c == cur)?;
            if let Some(&next) = siblings.get(pos + 1) {
                return Some(next);
            }
            cur = parent;
        }
        None
    }

    /// `id` and all of its descendants in depth-first order, tombstones included.
    pub fn descendants(&self, id: TileId) -> Vec<TileId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if self.is_alive(id) {
            stack.push(id);
        }
        while let Some(t) = stack.pop() {
            out.push(t);
            stack.extend(self.children_of(t).iter().rev().copied());
        }
        out
    }

    // --- attribute setters ---

    /// Set the debug name. Does nothing for a stale id.
    pub fn set_name(&mut self, id: TileId, name: impl Into<String>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.name = Some(name.into());
        }
    }

    /// Set the application id. Does nothing for a stale id.
    pub fn set_user_id(&mut self, id: TileId, user_id: Option<i32>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.user_id = user_id;
        }
    }

    /// Set the background style. Does nothing for a stale id.
    pub fn set_style(&mut self, id: TileId, style: Style) {
        if let Some(n) = self.node_opt_mut(id) {
            n.style = style;
        }
    }

    /// Replace the kind-private data, releasing the previous value.
    pub fn set_data(&mut self, id: TileId, data: Box<dyn Any>) -> Result<()> {
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        let old = node.data.replace(data);
        let (driver, caps) = (node.driver, node.caps);
        if let Some(old) = old {
            release_data(driver, caps, old);
        }
        Ok(())
    }

    /// Change the requested rectangle and lay the tile out again.
    pub fn set_rect(&mut self, id: TileId, rect: Rect) -> Result<()> {
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        node.requested = rect;
        self.layout(id);
        Ok(())
    }

    /// Change the decoration margins and lay the tile out again.
    pub fn set_margins(&mut self, id: TileId, margins: Margins) -> Result<()> {
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        node.margins = margins;
        node.flags.set(TileFlags::DECORATED, !margins.is_zero());
        self.layout(id);
        Ok(())
    }

    /// Set application-settable flags and lay the tile out again.
    ///
    /// Fails with [`TileError::ForbiddenFlag`] if `flags` has any bit outside
    /// [`TileFlags::USER_SETTABLE`]; the tile is left unchanged.
    pub fn set_flags(&mut self, id: TileId, flags: TileFlags) -> Result<()> {
        self.change_flags(id, flags, true)
    }

    /// Clear application-settable flags and lay the tile out again.
    ///
    /// Same checks as [`Tiles::set_flags`].
    pub fn clear_flags(&mut self, id: TileId, flags: TileFlags) -> Result<()> {
        self.change_flags(id, flags, false)
    }

    fn change_flags(&mut self, id: TileId, flags: TileFlags, on: bool) -> Result<()> {
        let forbidden = flags - TileFlags::USER_SETTABLE;
        if !forbidden.is_empty() {
            tracing::warn!(?id, ?forbidden, "rejected kind-internal flag mutation");
            return Err(TileError::ForbiddenFlag(forbidden));
        }
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        node.flags.set(flags, on);
        self.layout(id);
        Ok(())
    }

    /// Install the application key handler of a tile. Does nothing for a stale id.
    pub fn set_key_handler(
        &mut self,
        id: TileId,
        handler: impl FnMut(&mut Self, TileId, Key) -> Outcome + 'static,
    ) {
        if let Some(n) = self.node_opt_mut(id) {
            n.key_handler = Some(Box::new(handler));
        }
    }

    /// Install the update handler, called before each draw while the tile accepts
    /// updates. Does nothing for a stale id.
    pub fn set_update_handler(
        &mut self,
        id: TileId,
        handler: impl FnMut(&mut Self, TileId) + 'static,
    ) {
        if let Some(n) = self.node_opt_mut(id) {
            n.update_handler = Some(Box::new(handler));
        }
    }

    /// Install the change handler consulted by [`Tiles::changed`]. Does nothing for
    /// a stale id.
    pub fn set_change_handler(
        &mut self,
        id: TileId,
        handler: impl FnMut(&mut Self, TileId) -> bool + 'static,
    ) {
        if let Some(n) = self.node_opt_mut(id) {
            n.change_handler = Some(Box::new(handler));
        }
    }

    /// Switch whether the update handler runs before each draw.
    pub fn set_accept_updates(&mut self, id: TileId, accept: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.accept_updates = accept;
        }
    }

    /// Notify a tile that its underlying content changed.
    ///
    /// The change handler, if any, decides whether the content is now invalid;
    /// without one the content is always invalidated. Returns the marker.
    pub fn changed(&mut self, id: TileId) -> bool {
        let Some(node) = self.node_opt_mut(id) else {
            return false;
        };
        let invalid = match node.change_handler.take() {
            Some(mut handler) => {
                let invalid = handler(self, id);
                if let Some(node) = self.node_opt_mut(id)
                    && node.change_handler.is_none()
                {
                    node.change_handler = Some(handler);
                }
                invalid
            }
            None => true,
        };
        match self.node_opt_mut(id) {
            Some(node) => {
                node.content_invalid |= invalid;
                node.content_invalid
            }
            None => false,
        }
    }

    // --- visibility and geometry source ---

    /// Hide a tile and its descendants.
    ///
    /// Descendants flagged [`TileFlags::FLOAT`] keep their state, along with their
    /// subtrees. The tile stays hidden through later layout passes until
    /// [`Tiles::unhide`]. Hiding a hidden tile does nothing.
    pub fn hide(&mut self, id: TileId) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        if node.pinned_hidden && node.flags.contains(TileFlags::HIDDEN) {
            return;
        }
        node.pinned_hidden = true;
        let mut stack = Vec::from([id]);
        while let Some(t) = stack.pop() {
            let Some(n) = self.node_opt_mut(t) else {
                continue;
            };
            if t != id && n.flags.contains(TileFlags::FLOAT) {
                continue;
            }
            n.flags.insert(TileFlags::HIDDEN);
            stack.extend(n.children.iter().copied());
        }
        tracing::debug!(?id, "hid tile");
    }

    /// Undo [`Tiles::hide`].
    ///
    /// Clears the hidden bit on the whole subtree, then lays it out again so every
    /// descendant gets the visibility its own geometry dictates. Unhiding a tile
    /// that is neither hidden nor pinned does nothing.
    pub fn unhide(&mut self, id: TileId) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        if !node.pinned_hidden && !node.flags.contains(TileFlags::HIDDEN) {
            return;
        }
        node.pinned_hidden = false;
        for t in self.descendants(id) {
            if let Some(n) = self.node_opt_mut(t) {
                n.flags.remove(TileFlags::HIDDEN);
            }
        }
        self.layout(id);
        tracing::debug!(?id, "unhid tile");
    }

    /// Lay `id` out against `source`'s interior or exterior instead of its
    /// structural parent's interior.
    ///
    /// Tree structure does not change: the tile still lives, draws, and dies with
    /// its parent. The redirect lapses silently when `source` is removed.
    pub fn redirect_geometry(&mut self, id: TileId, source: TileId, publish: Publish) -> Result<()> {
        if !self.is_alive(source) {
            return Err(TileError::StaleTile(source));
        }
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        node.redirect = Some((source, publish));
        self.layout(id);
        Ok(())
    }

    /// Drop a redirect installed with [`Tiles::redirect_geometry`].
    pub fn restore_geometry(&mut self, id: TileId) -> Result<()> {
        let node = self.node_opt_mut(id).ok_or(TileError::StaleTile(id))?;
        if node.redirect.take().is_some() {
            self.layout(id);
        }
        Ok(())
    }

    /// Change the screen size and lay the whole tree out again.
    pub fn resize_screen(&mut self, w: i32, h: i32) {
        self.config.screen.w = w;
        self.config.screen.h = h;
        self.backend.screen_resized(w, h);
        let root = self.root;
        if let Some(n) = self.node_opt_mut(root) {
            n.requested = Rect::new(0, 0, w, h);
        }
        self.layout(root);
        tracing::debug!(w, h, "resized screen");
    }

    // --- lifecycle ---

    /// Mark a tile for removal by the next [`Tiles::sweep_deletes`].
    ///
    /// Marked tiles stay in the tree but are skipped by layout, drawing, event
    /// handling, and focus navigation. Marking twice, marking the root, or marking
    /// a stale id does nothing.
    pub fn mark_deleted(&mut self, id: TileId) {
        if id == self.root {
            return;
        }
        if let Some(n) = self.node_opt_mut(id)
            && !n.flags.contains(TileFlags::DELETED)
        {
            n.flags.insert(TileFlags::DELETED);
            tracing::debug!(?id, "marked tile deleted");
        }
    }

    /// Returns `true` if `id` or any of its ancestors is marked deleted.
    ///
    /// A stale id is not considered deleted.
    pub fn is_deleted(&self, id: TileId) -> bool {
        let mut cur = Some(id);
        while let Some(t) = cur {
            let Some(n) = self.node_opt(t) else {
                return false;
            };
            if n.flags.contains(TileFlags::DELETED) {
                return true;
            }
            cur = n.parent;
        }
        false
    }

    /// Tear down every tile marked deleted, together with its subtree, then
    /// repair the focus path.
    pub fn sweep_deletes(&mut self) {
        let mut doomed = Vec::new();
        let mut stack = Vec::new();
        if self.is_alive(self.root) {
            stack.push(self.root);
        }
        while let Some(t) = stack.pop() {
            let Some(n) = self.node_opt(t) else {
                continue;
            };
            if n.flags.contains(TileFlags::DELETED) {
                doomed.push(t);
            } else {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        if doomed.is_empty() {
            return;
        }
        for &id in &doomed {
            self.teardown(id);
        }
        tracing::debug!(count = doomed.len(), "swept deleted tiles");
        self.refocus();
    }

    /// Tear down `id` and its subtree right away, without focus repair.
    ///
    /// Meant for shutdown; during live operation use [`Tiles::mark_deleted`].
    pub fn destroy_subtree(&mut self, id: TileId) {
        if self.is_alive(id) {
            self.teardown(id);
        }
    }

    /// Destroy the whole tree and stop the loop.
    pub fn shutdown(&mut self) {
        self.running = false;
        let root = self.root;
        self.destroy_subtree(root);
        tracing::debug!("shut down");
    }

    fn teardown(&mut self, id: TileId) {
        let children = self.children_of(id).to_vec();
        for child in children {
            self.teardown(child);
        }

        let idx = id.idx();
        let Some(node) = self.nodes.get_mut(idx).and_then(Option::take) else {
            return;
        };
        self.free_list.push(idx);

        if let Some(parent) = node.parent
            && let Some(p) = self.node_opt_mut(parent)
        {
            p.children.retain(|&c| c != id);
        }
        if let Some(group) = node.group
            && let Some(g) = self.node_opt_mut(group)
        {
            g.members.retain(|&m| m != id);
            g.bindings.retain(|_, &mut m| m != id);
        }
        for surface in [node.surface, node.deco_surface].into_iter().flatten() {
            self.backend.free(surface);
        }
        if let Some(data) = node.data {
            release_data(node.driver, node.caps, data);
        }
        tracing::trace!(?id, "tore down tile");
    }

    // --- internals ---

    pub(crate) fn node_opt(&self, id: TileId) -> Option<&Node<B>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: TileId) -> Option<&mut Node<B>> {
        node_in(&mut self.nodes, id)
    }
}

/// Live node behind `id`, borrowed from the slot vector alone so the caller can
/// hold the backend at the same time.
pub(crate) fn node_in<B: Backend>(
    nodes: &mut [Option<Node<B>>],
    id: TileId,
) -> Option<&mut Node<B>> {
    let n = nodes.get_mut(id.idx())?.as_mut()?;
    if n.generation != id.1 {
        return None;
    }
    Some(n)
}

fn release_data<B: Backend>(driver: &'static dyn Driver<B>, caps: Capabilities, data: Box<dyn Any>) {
    if caps.contains(Capabilities::DESTROY_DATA) {
        driver.destroy_data(data);
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;
    use crate::kinds::{Frame, Plain};

    #[test]
    fn family_enforcement_leaves_tree_unchanged() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 20, 10), "w").unwrap();
        let leaf = tiles
            .create(win, &Plain, TileSpec::new(Family::Widget, Rect::new(0, 0, 4, 1)))
            .unwrap();
        let before = tiles.len();

        assert_eq!(
            Frame::create(&mut tiles, win, Rect::new(0, 0, 5, 5), "inner"),
            Err(TileError::IncompatibleFamily {
                parent: Family::Window,
                child: Family::Window,
            })
        );
        for family in [Family::Container, Family::Window, Family::Widget] {
            assert!(
                tiles
                    .create(leaf, &Plain, TileSpec::new(family, Rect::ZERO))
                    .is_err(),
                "widgets parent nothing"
            );
            assert!(
                tiles.create(root, &Plain, TileSpec::new(family, Rect::ZERO)).is_ok(),
                "containers parent anything"
            );
        }
        assert_eq!(tiles.len(), before + 3);
        assert_eq!(tiles.children_of(win), &[leaf]);
    }

    #[test]
    fn kind_internal_flags_are_rejected() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let t = Plain::create(&mut tiles, root, Rect::new(0, 0, 10, 10)).unwrap();
        let before = tiles.flags(t).unwrap();
        assert_eq!(
            tiles.set_flags(t, TileFlags::NO_CANVAS | TileFlags::FILL_H),
            Err(TileError::ForbiddenFlag(TileFlags::NO_CANVAS))
        );
        assert_eq!(tiles.flags(t), Some(before), "rejected mutation is a no-op");

        tiles.set_flags(t, TileFlags::MAXIMIZED).unwrap();
        assert_eq!(tiles.external_rect(t), Some(Rect::new(0, 0, 80, 24)));
        tiles.clear_flags(t, TileFlags::MAXIMIZED).unwrap();
        assert_eq!(tiles.external_rect(t), Some(Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn draw_capability_decides_canvas_and_margins_decide_decoration() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let plain = Plain::create(&mut tiles, root, Rect::new(0, 0, 10, 10)).unwrap();
        let win = Frame::create(&mut tiles, root, Rect::new(10, 0, 10, 10), "w").unwrap();

        let plain_flags = tiles.flags(plain).unwrap();
        assert!(plain_flags.contains(TileFlags::NO_CANVAS));
        assert!(!plain_flags.contains(TileFlags::DECORATED));

        let win_flags = tiles.flags(win).unwrap();
        assert!(!win_flags.contains(TileFlags::NO_CANVAS));
        assert!(win_flags.contains(TileFlags::DECORATED));
        assert_eq!(tiles.backend().live_surfaces(), 2, "interior plus decoration");
    }

    #[test]
    fn liveness_and_slot_reuse() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let a = Plain::create(&mut tiles, root, Rect::new(0, 0, 1, 1)).unwrap();
        tiles.mark_deleted(a);
        tiles.sweep_deletes();
        assert!(!tiles.is_alive(a));

        let b = Plain::create(&mut tiles, root, Rect::new(0, 0, 1, 1)).unwrap();
        assert!(tiles.is_alive(b));
        assert!(!tiles.is_alive(a), "stale handle must not alias the new tile");
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
        assert_eq!(tiles.parent_of(a), None);
        assert!(tiles.children_of(a).is_empty());
    }

    #[test]
    fn deferred_delete_is_visible_to_raw_traversal_until_swept() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let a = Plain::create(&mut tiles, root, Rect::new(0, 0, 10, 10)).unwrap();
        let inner = Plain::create(&mut tiles, a, Rect::new(0, 0, 5, 5)).unwrap();

        tiles.mark_deleted(a);
        tiles.mark_deleted(a);
        assert!(tiles.is_deleted(a));
        assert!(tiles.is_deleted(inner), "a mark covers the whole subtree");
        assert!(!tiles.flags(inner).unwrap().contains(TileFlags::DELETED));
        assert!(!tiles.is_deleted(root));
        assert!(tiles.descendants(root).contains(&a));
        assert_eq!(tiles.next_depth_first(root), Some(a));

        tiles.sweep_deletes();
        assert!(!tiles.descendants(root).contains(&a));
        assert!(!tiles.is_alive(inner), "children go with their parent");
        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn teardown_releases_surfaces_and_data() {
        struct Blob(Rc<Cell<u32>>);
        impl Drop for Blob {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let win = Frame::create(&mut tiles, root, Rect::new(0, 0, 20, 10), "w").unwrap();
        let holder = tiles
            .create_with_data(
                win,
                &Plain,
                TileSpec::new(Family::Container, Rect::new(0, 0, 4, 4)),
                Box::new(Blob(Rc::clone(&drops))),
            )
            .unwrap();
        assert!(tiles.data::<Blob>(holder).is_some());
        assert_eq!(tiles.backend().live_surfaces(), 2);

        tiles.mark_deleted(win);
        tiles.sweep_deletes();
        assert_eq!(drops.get(), 1);
        assert_eq!(tiles.backend().live_surfaces(), 0);
    }

    #[test]
    fn hide_skips_floats_and_unhide_restores_geometry_visibility() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let outer = Plain::create(&mut tiles, root, Rect::new(0, 0, 20, 10)).unwrap();
        let shown = Plain::create(&mut tiles, outer, Rect::new(0, 0, 5, 5)).unwrap();
        let offside = Plain::create(&mut tiles, outer, Rect::new(30, 0, 5, 5)).unwrap();
        let float = tiles
            .create(
                outer,
                &Plain,
                TileSpec::new(Family::Container, Rect::new(5, 0, 5, 5))
                    .with_flags(TileFlags::FLOAT),
            )
            .unwrap();
        let hidden = |tiles: &Tiles, id| tiles.flags(id).unwrap().contains(TileFlags::HIDDEN);
        assert!(hidden(&tiles, offside), "origin beyond the parent edge hides");

        tiles.hide(outer);
        assert!(hidden(&tiles, outer));
        assert!(hidden(&tiles, shown));
        assert!(!hidden(&tiles, float));

        // Layout keeps an explicitly hidden tile hidden.
        tiles.resize_screen(60, 20);
        assert!(hidden(&tiles, outer));
        assert!(hidden(&tiles, shown));

        tiles.unhide(outer);
        assert!(!hidden(&tiles, outer));
        assert!(!hidden(&tiles, shown));
        assert!(hidden(&tiles, offside), "geometry still hides it");
    }

    #[test]
    fn changed_consults_the_change_handler() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let t = Plain::create(&mut tiles, root, Rect::new(0, 0, 4, 4)).unwrap();
        tiles.draw();
        assert!(!tiles.content_invalid(t));

        tiles.set_change_handler(t, |_, _| false);
        assert!(!tiles.changed(t));
        tiles.set_change_handler(t, |_, _| true);
        assert!(tiles.changed(t));
        tiles.draw();
        assert!(!tiles.content_invalid(t), "drawing consumes the marker");
    }

    #[test]
    fn shutdown_empties_the_tree() {
        let mut tiles = Tiles::new(Config::default());
        let root = tiles.root();
        let _ = Frame::create(&mut tiles, root, Rect::new(0, 0, 20, 10), "w").unwrap();
        tiles.shutdown();
        assert!(tiles.is_empty());
        assert_eq!(tiles.backend().live_surfaces(), 0);
        assert!(tiles.focus_path().is_empty());
    }
}
