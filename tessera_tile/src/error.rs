// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors reported by tree mutations.

use thiserror::Error;

use crate::types::{Family, TileFlags, TileId};

/// Result type for fallible tile operations.
pub type Result<T> = core::result::Result<T, TileError>;

/// Errors surfaced by structural tree operations.
///
/// An operation that fails with one of these leaves the tree unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum TileError {
    /// The parent's family may not parent the requested child family.
    #[error("a {parent:?} tile cannot parent a {child:?} tile")]
    IncompatibleFamily {
        /// Family of the would-be parent.
        parent: Family,
        /// Family of the rejected child.
        child: Family,
    },
    /// The requested bits are outside [`TileFlags::USER_SETTABLE`].
    #[error("flags {0:?} are not settable by the application")]
    ForbiddenFlag(TileFlags),
    /// The handle refers to a tile that no longer exists.
    #[error("tile {0:?} does not exist")]
    StaleTile(TileId),
}
