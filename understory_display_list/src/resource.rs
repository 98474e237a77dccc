// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Heavy payloads embedded in a display list by reference.
//!
//! Geometry for text, shadings and images is owned by the caller; the list
//! only needs their bounds and keeps an `Arc` per embedding alive until it is
//! destroyed.

use alloc::boxed::Box;
use alloc::sync::Arc;

use kurbo::Rect;
use peniko::Brush;
pub use peniko::{ImageAlphaType, ImageFormat};

use crate::color::{ColorSpace, DefaultColorSpaces};

/// Stroke style used by stroking and stroke-clipping operations.
///
/// This is a re-export of [`kurbo::Stroke`], which captures width, joins,
/// caps, dashes, and related stroke parameters.
pub type StrokeStyle = kurbo::Stroke;

/// A positioned glyph inside a [`TextRun`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph index in the run's font.
    pub id: u32,
    /// Pen position along X in text space.
    pub x: f32,
    /// Pen position along Y in text space.
    pub y: f32,
}

/// A shaped run of glyphs.
///
/// The shaper that produced the run also computed its bounds; the display list
/// trusts them for culling.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Caller-defined font identifier.
    pub font: u32,
    /// Font size in text-space units.
    pub size: f32,
    /// Positioned glyphs.
    pub glyphs: Box<[Glyph]>,
    /// Bounds of the run in text space, before any stroking.
    pub bounds: Rect,
}

/// A smooth shading (gradient mesh, axial, radial, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct Shading {
    /// Paint used to realize the shading.
    pub brush: Brush,
    /// Area covered by the shading in its own coordinate space.
    pub bounds: Rect,
}

/// Description of an image resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageDesc {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel format of the image buffer.
    pub format: ImageFormat,
    /// Alpha encoding of the pixels (straight vs premultiplied).
    pub alpha_type: ImageAlphaType,
}

/// A decoded image.
///
/// Images are drawn into the unit square of their transform, so the display
/// list never looks at the pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    /// Size and format.
    pub desc: ImageDesc,
    /// Tightly packed, row-major pixel data.
    pub pixels: Arc<[u8]>,
}

/// Extra distance a stroke reaches past its path, in path space.
///
/// A zero width stroke is a hairline and still covers pixels, so it is
/// bounded as if it were one unit wide.
pub(crate) fn stroke_expansion(stroke: &StrokeStyle) -> f64 {
    let width = if stroke.width == 0.0 { 1.0 } else { stroke.width };
    let mut expansion = width * 0.5;
    if matches!(stroke.join, kurbo::Join::Miter) && stroke.miter_limit > 1.0 {
        expansion *= stroke.miter_limit;
    }
    if matches!(stroke.start_cap, kurbo::Cap::Square) || matches!(stroke.end_cap, kurbo::Cap::Square)
    {
        expansion *= core::f64::consts::SQRT_2;
    }
    expansion
}

/// One owned entry of a display list's resource table.
#[derive(Clone, Debug)]
pub(crate) enum Resource {
    ColorSpace(ColorSpace),
    Stroke(Arc<StrokeStyle>),
    Text(Arc<TextRun>),
    Shading(Arc<Shading>),
    Image(Arc<Image>),
    DefaultColorSpaces(Arc<DefaultColorSpaces>),
}

impl Resource {
    pub(crate) fn as_color_space(&self) -> Option<&ColorSpace> {
        match self {
            Self::ColorSpace(cs) => Some(cs),
            _ => None,
        }
    }

    pub(crate) fn as_stroke(&self) -> Option<&Arc<StrokeStyle>> {
        match self {
            Self::Stroke(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_text(&self) -> Option<&Arc<TextRun>> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn as_shading(&self) -> Option<&Arc<Shading>> {
        match self {
            Self::Shading(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_image(&self) -> Option<&Arc<Image>> {
        match self {
            Self::Image(i) => Some(i),
            _ => None,
        }
    }

    pub(crate) fn as_default_color_spaces(&self) -> Option<&Arc<DefaultColorSpaces>> {
        match self {
            Self::DefaultColorSpaces(d) => Some(d),
            _ => None,
        }
    }
}
