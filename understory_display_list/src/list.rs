// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The display list container: packed node words plus the resource table.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::error::DisplayListError;
use crate::format::{Command, Header, NO_RESOURCE, f32_word, word_f32};
use crate::lifecycle;
use crate::resource::Resource;

/// Capacity, in words, of the first allocation made for a list.
pub const MIN_CAPACITY_WORDS: usize = 256;

/// A recorded, replayable sequence of drawing operations.
///
/// Nodes are appended by a [`Recorder`](crate::Recorder) and read back by
/// [`replay`](crate::replay). Heavy payloads (strokes, text, shadings, images,
/// custom colorspaces) are held by strong reference until the list is
/// dropped or passed to [`destroy`](crate::destroy).
///
/// A finished list is immutable and may be replayed from several threads at
/// once.
pub struct DisplayList {
    bounds: Rect,
    pub(crate) words: Vec<u32>,
    pub(crate) resources: Vec<Option<Resource>>,
    pub(crate) node_count: usize,
    growths: usize,
    /// Makes every reservation fail, standing in for an exhausted allocator.
    #[cfg(test)]
    pub(crate) refuse_growth: bool,
}

impl DisplayList {
    /// Create an empty list covering `bounds`.
    ///
    /// No storage is allocated until the first node is recorded.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            words: Vec::new(),
            resources: Vec::new(),
            node_count: 0,
            growths: 0,
            #[cfg(test)]
            refuse_growth: false,
        }
    }

    /// Create an empty list with room for `words` node words.
    pub fn with_capacity(bounds: Rect, words: usize) -> Self {
        let mut list = Self::new(bounds);
        list.words = Vec::with_capacity(words);
        list
    }

    /// The area the recorded content was produced for.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of recorded nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of words used by recorded nodes.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Number of words the node buffer can hold before it grows again.
    pub fn capacity_words(&self) -> usize {
        self.words.capacity()
    }

    /// How many times the node buffer has been reallocated.
    pub fn growth_count(&self) -> usize {
        self.growths
    }

    /// Commands of the recorded nodes, in order.
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        let mut offset = 0;
        core::iter::from_fn(move || {
            let header = Header(*self.words.get(offset)?);
            let size = header.size();
            let command = header.command()?;
            if size == 0 {
                return None;
            }
            offset += size;
            Some(command)
        })
    }

    #[inline]
    pub(crate) fn words(&self) -> &[u32] {
        &self.words
    }

    #[inline]
    pub(crate) fn resources(&self) -> &[Option<Resource>] {
        &self.resources
    }

    #[inline]
    pub(crate) fn resource(&self, slot: u32) -> Option<&Resource> {
        self.resources.get(slot as usize)?.as_ref()
    }

    /// Make room for a node of `words` words.
    ///
    /// Capacity at least doubles each time, so appends stay amortized O(1).
    pub(crate) fn reserve_node(&mut self, words: usize) -> Result<(), DisplayListError> {
        #[cfg(test)]
        if self.refuse_growth {
            self.words.try_reserve_exact(usize::MAX)?;
        }
        let needed = self.words.len() + words;
        if needed <= self.words.capacity() {
            return Ok(());
        }
        let mut capacity = (self.words.capacity() * 2).max(MIN_CAPACITY_WORDS);
        while capacity < needed {
            capacity *= 2;
        }
        self.words.try_reserve_exact(capacity - self.words.len())?;
        self.growths += 1;
        tracing::trace!(capacity, growths = self.growths, "grew display list");
        Ok(())
    }

    /// Make room for `count` more resource slots.
    pub(crate) fn reserve_resources(&mut self, count: usize) -> Result<(), DisplayListError> {
        if self.resources.len() + count >= NO_RESOURCE as usize {
            return Err(DisplayListError::TooManyResources);
        }
        self.resources.try_reserve(count)?;
        Ok(())
    }

    /// Append a complete node. Storage must already be reserved.
    ///
    /// Returns the word offset of the node header.
    pub(crate) fn push_node(&mut self, node: &[u32]) -> usize {
        let offset = self.words.len();
        self.words.extend_from_slice(node);
        self.node_count += 1;
        offset
    }

    /// Append a resource. Storage must already be reserved.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "slot count is bounded by reserve_resources"
    )]
    pub(crate) fn push_resource(&mut self, resource: Resource) -> u32 {
        let slot = self.resources.len() as u32;
        self.resources.push(Some(resource));
        slot
    }

    /// Read the packed rect stored at word `offset`.
    pub(crate) fn rect_at(&self, offset: usize) -> [f32; 4] {
        let mut rect = [0.0; 4];
        for (i, value) in rect.iter_mut().enumerate() {
            *value = word_f32(self.words[offset + i]);
        }
        rect
    }

    /// Overwrite the packed rect stored at word `offset`.
    pub(crate) fn set_rect_at(&mut self, offset: usize, rect: [f32; 4]) {
        for (i, value) in rect.into_iter().enumerate() {
            self.words[offset + i] = f32_word(value);
        }
    }
}

impl Drop for DisplayList {
    fn drop(&mut self) {
        lifecycle::release_resources(self);
    }
}

impl fmt::Debug for DisplayList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayList")
            .field("bounds", &self.bounds)
            .field("nodes", &self.node_count)
            .field("words", &self.words.len())
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}
