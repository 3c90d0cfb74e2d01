// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Focus: focus navigation policies.
//!
//! This crate models focus navigation inside one focus group as a combination of:
//! - **Navigation intents** ([`Navigation`]) such as [`Navigation::Next`] (Tab),
//!   [`Navigation::Prev`] (Shift+Tab), or arrow directions.
//! - A **snapshot of candidates** ([`FocusEntry`] / [`FocusSpace`]) describing the
//!   group's members in membership order, where they sit on screen, and whether
//!   they can take focus right now.
//! - Pluggable **policies** ([`FocusPolicy`]) that select the next focused member given
//!   the current one (if any) and a direction.
//!
//! It knows nothing about tiles, layout, or terminals; `tessera_tile` builds a
//! [`FocusSpace`] from a focus group and applies the result to its focus path.
//!
//! ## Minimal example
//!
//! Three fields in a row, Tab cycling through them:
//!
//! ```rust
//! use kurbo::Rect;
//! use tessera_focus::{DefaultPolicy, FocusEntry, FocusPolicy, FocusSpace, Navigation};
//!
//! let entries = [
//!     FocusEntry { id: 1_u32, rect: Rect::new(0.0, 0.0, 10.0, 1.0), enabled: true },
//!     FocusEntry { id: 2_u32, rect: Rect::new(12.0, 0.0, 22.0, 1.0), enabled: true },
//!     FocusEntry { id: 3_u32, rect: Rect::new(24.0, 0.0, 34.0, 1.0), enabled: true },
//! ];
//! let space = FocusSpace { nodes: &entries };
//! let policy = DefaultPolicy::default();
//!
//! assert_eq!(policy.next(Some(1), Navigation::Next, &space), Some(2));
//! // Tab on the last member wraps around to the first one.
//! assert_eq!(policy.next(Some(3), Navigation::Next, &space), Some(1));
//! // Right arrow picks the nearest aligned member to the right.
//! assert_eq!(policy.next(Some(1), Navigation::Right, &space), Some(2));
//! ```
//!
//! ## Spatial selection
//!
//! Directional moves only consider candidates that lie further along the movement axis
//! (the gap between the facing edges is not negative) and that share some extent on the
//! perpendicular axis. Among those, the closest center wins. On an exact distance tie a
//! later candidate takes over only when its overlap is strictly greater than half of the
//! current best's overlap. A candidate with twice the overlap of another therefore wins
//! whichever of the two comes first in member order.
//!
//! Geometry is expressed in terms of [`kurbo::Rect`]; all entries of one [`FocusSpace`]
//! must share a coordinate space.
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std`.

#![no_std]

use kurbo::Rect;

/// Direction of focus navigation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Navigation {
    /// Move to the next member in membership order (Tab).
    Next,
    /// Move to the previous member in membership order (Shift+Tab).
    Prev,
    /// Move to the first eligible member.
    First,
    /// Move to the last eligible member.
    Last,
    /// Move to the nearest member above the current one.
    Up,
    /// Move to the nearest member below the current one.
    Down,
    /// Move to the nearest member left of the current one.
    Left,
    /// Move to the nearest member right of the current one.
    Right,
}

impl Navigation {
    /// Returns `true` for the four arrow directions.
    pub const fn is_spatial(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }
}

/// A single focus candidate within a [`FocusSpace`].
#[derive(Clone, Debug)]
pub struct FocusEntry<K> {
    /// Identifier for this member.
    pub id: K,
    /// Bounds in the coordinate space shared by the surrounding [`FocusSpace`].
    pub rect: Rect,
    /// Whether this member may take focus (interactive, visible, alive).
    ///
    /// Disabled members are skipped by every policy but keep their place in the
    /// sequence, so the current member may itself be disabled.
    pub enabled: bool,
}

/// A read-only view of one focus group's members, in membership order.
#[derive(Clone, Debug)]
pub struct FocusSpace<'a, K> {
    /// Members of the group.
    pub nodes: &'a [FocusEntry<K>],
}

/// Wrap mode for sequential traversal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Do not wrap; reaching the end of the sequence yields no candidate.
    Never,
    /// Wrap around the end of the sequence exactly once.
    Once,
}

/// Trait for focus traversal policies.
///
/// A policy receives the currently focused member (if the group has one), a navigation
/// intent, and a read-only view of the group, and returns the member that should take
/// focus. `None` means "no change".
pub trait FocusPolicy<K>
where
    K: Copy + Eq,
{
    /// Compute the next focus target.
    fn next(&self, origin: Option<K>, direction: Navigation, space: &FocusSpace<'_, K>)
    -> Option<K>;
}

/// The traversal policy used by tile focus groups.
#[derive(Copy, Clone, Debug)]
pub struct DefaultPolicy {
    /// Wrap behavior for [`Navigation::Next`] and [`Navigation::Prev`].
    pub wrap: WrapMode,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            wrap: WrapMode::Once,
        }
    }
}

impl<K> FocusPolicy<K> for DefaultPolicy
where
    K: Copy + Eq,
{
    fn next(
        &self,
        origin: Option<K>,
        direction: Navigation,
        space: &FocusSpace<'_, K>,
    ) -> Option<K> {
        match direction {
            Navigation::First => first_enabled(space.nodes.iter()),
            Navigation::Last => first_enabled(space.nodes.iter().rev()),
            Navigation::Next => next_sequential(origin, space, self.wrap, Step::Forward),
            Navigation::Prev => next_sequential(origin, space, self.wrap, Step::Backward),
            Navigation::Up | Navigation::Down | Navigation::Left | Navigation::Right => {
                next_spatial(origin?, direction, space)
            }
        }
    }
}

#[derive(Copy, Clone)]
enum Step {
    Forward,
    Backward,
}

fn first_enabled<'a, K: Copy + 'a>(
    mut entries: impl Iterator<Item = &'a FocusEntry<K>>,
) -> Option<K> {
    entries.find(|e| e.enabled).map(|e| e.id)
}

/// Walk the membership sequence away from `origin`.
///
/// The walk covers the members after the origin, then (when wrapping) the members
/// before it; the origin itself is never returned. Without an origin (or when the
/// origin is not a member) the walk starts at the corresponding end.
fn next_sequential<K>(
    origin: Option<K>,
    space: &FocusSpace<'_, K>,
    wrap: WrapMode,
    step: Step,
) -> Option<K>
where
    K: Copy + Eq,
{
    let nodes = space.nodes;
    let Some(pos) = origin.and_then(|o| nodes.iter().position(|e| e.id == o)) else {
        return match step {
            Step::Forward => first_enabled(nodes.iter()),
            Step::Backward => first_enabled(nodes.iter().rev()),
        };
    };

    let wraps = wrap == WrapMode::Once;
    match step {
        Step::Forward => {
            let after = nodes[pos + 1..].iter();
            let before = nodes[..pos].iter().filter(|_| wraps);
            first_enabled(after.chain(before))
        }
        Step::Backward => {
            let before = nodes[..pos].iter().rev();
            let after = nodes[pos + 1..].iter().rev().filter(|_| wraps);
            first_enabled(before.chain(after))
        }
    }
}

/// Length of the shared extent of `[a0, a1)` and `[b0, b1)`; negative when disjoint.
fn span_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    a1.min(b1) - a0.max(b0)
}

fn next_spatial<K>(origin: K, direction: Navigation, space: &FocusSpace<'_, K>) -> Option<K>
where
    K: Copy + Eq,
{
    let nodes = space.nodes;
    let o = nodes.iter().find(|e| e.id == origin)?.rect;
    let oc = o.center();

    let mut best: Option<K> = None;
    let mut best_dist = f64::INFINITY;
    let mut best_overlap = 0.0;

    for candidate in nodes {
        if !candidate.enabled || candidate.id == origin {
            continue;
        }
        let r = candidate.rect;
        let (displacement, overlap) = match direction {
            Navigation::Right => (r.x0 - o.x1, span_overlap(o.y0, o.y1, r.y0, r.y1)),
            Navigation::Left => (o.x0 - r.x1, span_overlap(o.y0, o.y1, r.y0, r.y1)),
            Navigation::Down => (r.y0 - o.y1, span_overlap(o.x0, o.x1, r.x0, r.x1)),
            Navigation::Up => (o.y0 - r.y1, span_overlap(o.x0, o.x1, r.x0, r.x1)),
            _ => return None,
        };

        // Not further along the movement axis, or not aligned with the origin at all.
        if displacement < 0.0 || overlap <= 0.0 {
            continue;
        }

        // Squared distance keeps ties between integer cell positions exact.
        let dist = (r.center() - oc).hypot2();
        // `best_overlap` holds half of the current best's overlap.
        if dist < best_dist || (dist == best_dist && overlap > best_overlap) {
            best = Some(candidate.id);
            best_dist = dist;
            best_overlap = overlap / 2.0;
        }
    }

    best
}
