// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing interface display lists are recorded from and replayed to.

use alloc::string::String;
use alloc::sync::Arc;

use kurbo::{Affine, BezPath, Rect};

use crate::color::{ColorParams, ColorSpace, DefaultColorSpaces};
use crate::error::DisplayListError;
use crate::resource::{Image, Shading, StrokeStyle, TextRun};

pub use peniko::{Fill as FillRule, Mix as BlendMode};

bitflags::bitflags! {
    /// Device hints toggled by [`Device::render_flags`].
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Snap image and tile edges as if they were tiled.
        const GRIDFIT_AS_TILED = 1 << 0;
        /// Disable anti-aliasing for subsequent paths.
        const NO_ANTIALIAS = 1 << 1;
        /// Paint knockout groups as if they were plain groups.
        const IGNORE_KNOCKOUT = 1 << 2;
    }
}

/// Answer from [`Device::begin_tile`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileStatus {
    /// The tile content must be drawn.
    #[default]
    Render,
    /// The device already holds this tile; its content may be skipped.
    Cached,
}

/// Failure reported by a [`Device`].
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device asks the caller to stop issuing operations.
    #[error("device aborted")]
    Aborted,
    /// A single operation failed; later operations may still succeed.
    #[error("device operation failed: {0}")]
    Failed(String),
    /// Recording into a display list failed.
    #[error(transparent)]
    Record(#[from] DisplayListError),
}

/// Result of a device operation.
pub type DeviceResult<T = ()> = Result<T, DeviceError>;

/// A drawing target.
///
/// All geometry arrives already positioned by `ctm`. Clip operations receive a
/// `scissor` bounding the clip region in device space; masks and groups
/// receive their device-space `area`.
///
/// Every push-like call (`clip_*`, `begin_mask`, `begin_group`) is balanced by
/// exactly one [`Device::pop_clip`] (clips and masks) or [`Device::end_group`]
/// (groups). A mask is defined between `begin_mask` and `end_mask`, and then
/// clips later content until its `pop_clip`.
///
/// Every method defaults to a no-op so targets only implement what they use.
pub trait Device {
    /// Fill `path` with a color.
    fn fill_path(
        &mut self,
        path: &BezPath,
        fill_rule: FillRule,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (path, fill_rule, ctm, colorspace, color, alpha, params);
        Ok(())
    }

    /// Stroke `path` with a color.
    fn stroke_path(
        &mut self,
        path: &BezPath,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (path, stroke, ctm, colorspace, color, alpha, params);
        Ok(())
    }

    /// Push a clip to the fill region of `path`.
    fn clip_path(
        &mut self,
        path: &BezPath,
        fill_rule: FillRule,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let _ = (path, fill_rule, ctm, scissor);
        Ok(())
    }

    /// Push a clip to the stroked outline of `path`.
    fn clip_stroke_path(
        &mut self,
        path: &BezPath,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let _ = (path, stroke, ctm, scissor);
        Ok(())
    }

    /// Fill the glyphs of `text`.
    fn fill_text(
        &mut self,
        text: &Arc<TextRun>,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (text, ctm, colorspace, color, alpha, params);
        Ok(())
    }

    /// Stroke the glyph outlines of `text`.
    fn stroke_text(
        &mut self,
        text: &Arc<TextRun>,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (text, stroke, ctm, colorspace, color, alpha, params);
        Ok(())
    }

    /// Push a clip to the glyph shapes of `text`.
    fn clip_text(&mut self, text: &Arc<TextRun>, ctm: Affine, scissor: Rect) -> DeviceResult {
        let _ = (text, ctm, scissor);
        Ok(())
    }

    /// Push a clip to the stroked glyph outlines of `text`.
    fn clip_stroke_text(
        &mut self,
        text: &Arc<TextRun>,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let _ = (text, stroke, ctm, scissor);
        Ok(())
    }

    /// Invisible text (kept for extraction and hit testing).
    fn ignore_text(&mut self, text: &Arc<TextRun>, ctm: Affine) -> DeviceResult {
        let _ = (text, ctm);
        Ok(())
    }

    /// Paint a shading.
    fn fill_shade(
        &mut self,
        shade: &Arc<Shading>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (shade, ctm, alpha, params);
        Ok(())
    }

    /// Paint an image into the unit square mapped by `ctm`.
    fn fill_image(
        &mut self,
        image: &Arc<Image>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (image, ctm, alpha, params);
        Ok(())
    }

    /// Paint a color through an image used as a stencil.
    fn fill_image_mask(
        &mut self,
        image: &Arc<Image>,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (image, ctm, colorspace, color, alpha, params);
        Ok(())
    }

    /// Push a clip to an image used as a stencil.
    fn clip_image_mask(&mut self, image: &Arc<Image>, ctm: Affine, scissor: Rect) -> DeviceResult {
        let _ = (image, ctm, scissor);
        Ok(())
    }

    /// Pop the innermost clip or mask.
    fn pop_clip(&mut self) -> DeviceResult {
        Ok(())
    }

    /// Start defining a soft mask covering `area`.
    ///
    /// `backdrop` is the backdrop color in `colorspace`; with `luminosity`
    /// unset the mask is taken from the alpha channel.
    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        params: ColorParams,
    ) -> DeviceResult {
        let _ = (area, luminosity, colorspace, backdrop, params);
        Ok(())
    }

    /// Finish defining the mask; it now clips until the matching `pop_clip`.
    fn end_mask(&mut self) -> DeviceResult {
        Ok(())
    }

    /// Start a transparency group.
    fn begin_group(
        &mut self,
        area: Rect,
        colorspace: Option<&ColorSpace>,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) -> DeviceResult {
        let _ = (area, colorspace, isolated, knockout, blend, alpha);
        Ok(())
    }

    /// Composite the innermost group into its parent.
    fn end_group(&mut self) -> DeviceResult {
        Ok(())
    }

    /// Start a tiling pattern cell.
    ///
    /// `area` is the region to cover and `view` the cell, both in pattern
    /// space; `xstep`/`ystep` space the repeats. A nonzero `id` identifies
    /// the cell for caching: returning [`TileStatus::Cached`] lets a replay
    /// skip the cell content up to the matching [`Device::end_tile`].
    fn begin_tile(
        &mut self,
        area: Rect,
        view: Rect,
        xstep: f32,
        ystep: f32,
        ctm: Affine,
        id: u32,
    ) -> DeviceResult<TileStatus> {
        let _ = (area, view, xstep, ystep, ctm, id);
        Ok(TileStatus::Render)
    }

    /// Finish the innermost tile.
    fn end_tile(&mut self) -> DeviceResult {
        Ok(())
    }

    /// Set `set` and clear `clear` in the device hint flags.
    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) -> DeviceResult {
        let _ = (set, clear);
        Ok(())
    }

    /// Install default colorspaces for subsequent device-space colors.
    fn set_default_colorspaces(&mut self, defaults: &Arc<DefaultColorSpaces>) -> DeviceResult {
        let _ = defaults;
        Ok(())
    }

    /// Start an optional-content layer.
    fn begin_layer(&mut self, name: &str) -> DeviceResult {
        let _ = name;
        Ok(())
    }

    /// End the innermost layer.
    fn end_layer(&mut self) -> DeviceResult {
        Ok(())
    }
}
