// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile content caching for devices.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::device::TileStatus;

/// Remembers which tile ids a device has already rendered.
///
/// A device calls [`TileCache::begin`] from its `begin_tile` and
/// [`TileCache::end`] from its `end_tile`. The first occurrence of an id is
/// rendered; later ones answer [`TileStatus::Cached`] so a replay can skip
/// the tile content. Id `0` means "uncacheable" and is always rendered.
#[derive(Clone, Debug, Default)]
pub struct TileCache {
    /// Rendered ids and how often each was reused.
    rendered: HashMap<u32, usize>,
    /// One entry per open tile: the id to commit on `end`, if any.
    open: SmallVec<[Option<u32>; 4]>,
}

impl TileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a tile with the given id.
    pub fn begin(&mut self, id: u32) -> TileStatus {
        if id != 0
            && let Some(uses) = self.rendered.get_mut(&id)
        {
            *uses += 1;
            self.open.push(None);
            return TileStatus::Cached;
        }
        self.open.push((id != 0).then_some(id));
        TileStatus::Render
    }

    /// Leave the innermost tile, recording it as rendered.
    pub fn end(&mut self) {
        match self.open.pop() {
            Some(Some(id)) => {
                self.rendered.entry(id).or_insert(0);
            }
            Some(None) => {}
            None => tracing::warn!("tile cache end without begin"),
        }
    }

    /// Returns `true` if `id` has been rendered.
    pub fn contains(&self, id: u32) -> bool {
        self.rendered.contains_key(&id)
    }

    /// Number of times a rendered `id` was answered from the cache.
    pub fn reuses(&self, id: u32) -> usize {
        self.rendered.get(&id).copied().unwrap_or(0)
    }

    /// Number of rendered ids.
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// Returns `true` if nothing has been rendered.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Forget every rendered id.
    pub fn clear(&mut self) {
        self.rendered.clear();
        self.open.clear();
    }
}
