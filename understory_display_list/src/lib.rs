// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Display List: a compact recording of drawing operations that can
//! be replayed onto any [`Device`].
//!
//! A content interpreter draws into a [`Recorder`] exactly as it would draw
//! into a real renderer. The recorder packs each operation into a
//! [`DisplayList`] node, writing only the state that changed since the previous
//! node. The finished list can then be replayed any number of times, at any
//! transform, with culling against a scissor rect.
//!
//! # Core concepts
//!
//! - **Nodes**: one 32-bit header word plus optional fields (bounds,
//!   colorspace, color, alpha, transform, stroke, path) and a per-command
//!   payload. See [`Command`] for the recorded kinds and [`MAX_NODE_WORDS`] for
//!   the per-node size limit.
//! - **Resources**: strokes, text runs, shadings, images, custom colorspaces
//!   and default colorspace sets are held by `Arc`. The list keeps one
//!   reference per node that embeds a resource, released by [`destroy`] or by
//!   dropping the list.
//! - **Clip bounds**: when a clip is popped during recording, its stored bounds
//!   shrink to the union of its content. Replay then skips a whole clip whose
//!   content is out of view while keeping device push/pop calls balanced.
//! - **Tiles**: [`Device::begin_tile`] may answer [`TileStatus::Cached`]; the
//!   replay then skips the tile content. [`TileCache`] implements that
//!   bookkeeping for devices.
//! - **Cancellation**: a [`Cookie`] reports progress and errors and lets
//!   another thread stop a running replay.
//!
//! # Example
//!
//! ```
//! use kurbo::{Affine, Rect, Shape};
//! use understory_display_list::{
//!     ColorParams, ColorSpace, Device, DisplayList, FillRule, INFINITE_RECT, Recorder, replay,
//! };
//!
//! let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
//! let mut rec = Recorder::new(&mut list);
//! let square = Rect::new(10.0, 10.0, 20.0, 20.0).to_path(0.1);
//! rec.clip_path(&square, FillRule::NonZero, Affine::IDENTITY, INFINITE_RECT)
//!     .unwrap();
//! rec.fill_path(
//!     &square,
//!     FillRule::NonZero,
//!     Affine::IDENTITY,
//!     &ColorSpace::DeviceGray,
//!     &[0.5],
//!     1.0,
//!     ColorParams::default(),
//! )
//! .unwrap();
//! rec.pop_clip().unwrap();
//! rec.finish();
//!
//! // A device that ignores everything.
//! struct Null;
//! impl Device for Null {}
//!
//! // Looking only at the lower-right corner culls the whole clip.
//! let stats = replay(
//!     &list,
//!     &mut Null,
//!     Affine::IDENTITY,
//!     Rect::new(50.0, 50.0, 100.0, 100.0),
//!     None,
//! );
//! assert_eq!(stats.dispatched, 0);
//! assert_eq!(stats.culled, 3);
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo`, `peniko` and `tracing`.
//! - `libm`: floating point support for `no_std` builds.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod color;
mod device;
mod error;
mod format;
mod geom;
mod lifecycle;
mod list;
mod node;
mod recorder;
mod replay;
mod resource;
mod tile;

pub use color::{
    ColorParams, ColorSpace, CustomColorSpace, DefaultColorSpaces, MAX_COLORS, RenderingIntent,
};
pub use device::{
    BlendMode, Device, DeviceError, DeviceResult, FillRule, RenderFlags, TileStatus,
};
pub use error::DisplayListError;
pub use format::{Command, MAX_NODE_WORDS};
pub use geom::{
    EMPTY_RECT, INFINITE_RECT, intersect_rect, is_empty_rect, is_infinite_rect, transform_rect,
    union_rect,
};
pub use lifecycle::destroy;
pub use list::{DisplayList, MIN_CAPACITY_WORDS};
pub use recorder::Recorder;
pub use replay::{Cookie, ReplayStats, replay};
pub use resource::{
    Glyph, Image, ImageAlphaType, ImageDesc, ImageFormat, Shading, StrokeStyle, TextRun,
};
pub use tile::TileCache;
