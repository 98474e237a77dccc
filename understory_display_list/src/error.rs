// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::TryReserveError;

use crate::format::Command;

/// Errors raised while recording or decoding a display list.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisplayListError {
    /// Growing the node buffer or the resource table failed.
    #[error("display list allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
    /// A node would exceed [`MAX_NODE_WORDS`](crate::MAX_NODE_WORDS).
    ///
    /// Large paths and strings must be split by the caller.
    #[error("{command:?} node needs {words} words, more than the per-node maximum")]
    NodeTooLarge {
        /// Command of the rejected node.
        command: Command,
        /// Words the node would have needed.
        words: usize,
    },
    /// A color carries more than [`MAX_COLORS`](crate::MAX_COLORS) components.
    #[error("color has {0} components, more than the supported maximum")]
    TooManyColorComponents(usize),
    /// The resource table ran out of indices.
    #[error("display list resource table is full")]
    TooManyResources,
    /// A node refers to a resource of the wrong kind or a released one.
    #[error("corrupt {0:?} node")]
    CorruptNode(Command),
    /// The word at `offset` is not a valid node header.
    #[error("invalid node header at word {offset}")]
    InvalidHeader {
        /// Word offset of the bad header.
        offset: usize,
    },
}
