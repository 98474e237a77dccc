// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Display List Trace.
//!
//! This crate provides [`TraceDevice`], a [`Device`] that records every call
//! it receives as an [`Event`] together with the clip/group nesting depth at
//! the time of the call.
//!
//! It does **not** rasterize anything. It exists so tests and debugging
//! sessions can assert on what a replay hands to a device:
//! - Paint order and per-call state (transform, colorspace, color, alpha).
//! - Push/pop balance, via [`TraceDevice::depth`] and
//!   [`TraceDevice::underflows`].
//! - Tile caching, via [`TraceDevice::with_tile_cache`].
//!
//! Bounds that depend on the replay (clip scissors, mask and group areas) are
//! kept apart from the [`Call`] in [`Event::bounds`], so a trace of a replay
//! can be compared with a trace of the same content drawn directly.

#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect};
use smallvec::SmallVec;
use understory_display_list::{
    BlendMode, ColorParams, ColorSpace, DefaultColorSpaces, Device, DeviceResult, FillRule, Image,
    RenderFlags, Shading, StrokeStyle, TextRun, TileCache, TileStatus,
};

/// Color components as received by the device.
pub type Color = SmallVec<[f32; 4]>;

/// A device call with owned arguments.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs, reason = "variants and fields mirror the Device methods")]
pub enum Call {
    FillPath {
        path: BezPath,
        fill_rule: FillRule,
        ctm: Affine,
        colorspace: ColorSpace,
        color: Color,
        alpha: f32,
        params: ColorParams,
    },
    StrokePath {
        path: BezPath,
        stroke: Arc<StrokeStyle>,
        ctm: Affine,
        colorspace: ColorSpace,
        color: Color,
        alpha: f32,
        params: ColorParams,
    },
    ClipPath {
        path: BezPath,
        fill_rule: FillRule,
        ctm: Affine,
    },
    ClipStrokePath {
        path: BezPath,
        stroke: Arc<StrokeStyle>,
        ctm: Affine,
    },
    FillText {
        text: Arc<TextRun>,
        ctm: Affine,
        colorspace: ColorSpace,
        color: Color,
        alpha: f32,
        params: ColorParams,
    },
    StrokeText {
        text: Arc<TextRun>,
        stroke: Arc<StrokeStyle>,
        ctm: Affine,
        colorspace: ColorSpace,
        color: Color,
        alpha: f32,
        params: ColorParams,
    },
    ClipText {
        text: Arc<TextRun>,
        ctm: Affine,
    },
    ClipStrokeText {
        text: Arc<TextRun>,
        stroke: Arc<StrokeStyle>,
        ctm: Affine,
    },
    IgnoreText {
        text: Arc<TextRun>,
        ctm: Affine,
    },
    FillShade {
        shade: Arc<Shading>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    },
    FillImage {
        image: Arc<Image>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    },
    FillImageMask {
        image: Arc<Image>,
        ctm: Affine,
        colorspace: ColorSpace,
        color: Color,
        alpha: f32,
        params: ColorParams,
    },
    ClipImageMask {
        image: Arc<Image>,
        ctm: Affine,
    },
    PopClip,
    BeginMask {
        luminosity: bool,
        colorspace: ColorSpace,
        backdrop: Color,
        params: ColorParams,
    },
    EndMask,
    BeginGroup {
        colorspace: Option<ColorSpace>,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    },
    EndGroup,
    BeginTile {
        area: Rect,
        view: Rect,
        xstep: f32,
        ystep: f32,
        ctm: Affine,
        id: u32,
    },
    EndTile,
    RenderFlags {
        set: RenderFlags,
        clear: RenderFlags,
    },
    DefaultColorSpaces(Arc<DefaultColorSpaces>),
    BeginLayer(String),
    EndLayer,
}

/// One call received by a [`TraceDevice`].
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The call and its arguments.
    pub call: Call,
    /// Clip scissor, or mask/group area, when the call carries one.
    pub bounds: Option<Rect>,
    /// Clip/mask/group nesting depth before the call.
    pub depth: usize,
}

/// A [`Device`] that records what it receives.
#[derive(Debug, Default)]
pub struct TraceDevice {
    events: Vec<Event>,
    depth: usize,
    max_depth: usize,
    underflows: usize,
    tiles: Option<TileCache>,
}

impl TraceDevice {
    /// Create a device that renders every tile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that reports repeated tile ids as cached.
    pub fn with_tile_cache() -> Self {
        Self {
            tiles: Some(TileCache::new()),
            ..Self::default()
        }
    }

    /// Recorded events, in call order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Recorded calls without bounds or depth.
    pub fn calls(&self) -> impl Iterator<Item = &Call> + '_ {
        self.events.iter().map(|e| &e.call)
    }

    /// Take the recorded events, leaving the log empty.
    ///
    /// Depth tracking and the tile cache are kept.
    pub fn take_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Deepest nesting seen.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Pops received with nothing open.
    pub fn underflows(&self) -> usize {
        self.underflows
    }

    /// The tile cache, if enabled.
    pub fn tile_cache(&self) -> Option<&TileCache> {
        self.tiles.as_ref()
    }

    fn log(&mut self, call: Call, bounds: Option<Rect>) {
        self.events.push(Event {
            call,
            bounds,
            depth: self.depth,
        });
    }

    fn push(&mut self, call: Call, bounds: Rect) {
        self.log(call, Some(bounds));
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    fn pop(&mut self, call: Call) {
        self.log(call, None);
        match self.depth.checked_sub(1) {
            Some(depth) => self.depth = depth,
            None => self.underflows += 1,
        }
    }
}

fn color(components: &[f32]) -> Color {
    Color::from_slice(components)
}

impl Device for TraceDevice {
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
        let call = Call::FillPath {
            path: path.clone(),
            fill_rule,
            ctm,
            colorspace: colorspace.clone(),
            color: self::color(color),
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

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
        let call = Call::StrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            ctm,
            colorspace: colorspace.clone(),
            color: self::color(color),
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

    fn clip_path(
        &mut self,
        path: &BezPath,
        fill_rule: FillRule,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let call = Call::ClipPath {
            path: path.clone(),
            fill_rule,
            ctm,
        };
        self.push(call, scissor);
        Ok(())
    }

    fn clip_stroke_path(
        &mut self,
        path: &BezPath,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let call = Call::ClipStrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            ctm,
        };
        self.push(call, scissor);
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &Arc<TextRun>,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let call = Call::FillText {
            text: text.clone(),
            ctm,
            colorspace: colorspace.clone(),
            color: self::color(color),
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

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
        let call = Call::StrokeText {
            text: text.clone(),
            stroke: stroke.clone(),
            ctm,
            colorspace: colorspace.clone(),
            color: self::color(color),
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

    fn clip_text(&mut self, text: &Arc<TextRun>, ctm: Affine, scissor: Rect) -> DeviceResult {
        let call = Call::ClipText {
            text: text.clone(),
            ctm,
        };
        self.push(call, scissor);
        Ok(())
    }

    fn clip_stroke_text(
        &mut self,
        text: &Arc<TextRun>,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let call = Call::ClipStrokeText {
            text: text.clone(),
            stroke: stroke.clone(),
            ctm,
        };
        self.push(call, scissor);
        Ok(())
    }

    fn ignore_text(&mut self, text: &Arc<TextRun>, ctm: Affine) -> DeviceResult {
        let call = Call::IgnoreText {
            text: text.clone(),
            ctm,
        };
        self.log(call, None);
        Ok(())
    }

    fn fill_shade(
        &mut self,
        shade: &Arc<Shading>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let call = Call::FillShade {
            shade: shade.clone(),
            ctm,
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

    fn fill_image(
        &mut self,
        image: &Arc<Image>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let call = Call::FillImage {
            image: image.clone(),
            ctm,
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

    fn fill_image_mask(
        &mut self,
        image: &Arc<Image>,
        ctm: Affine,
        colorspace: &ColorSpace,
        color: &[f32],
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        let call = Call::FillImageMask {
            image: image.clone(),
            ctm,
            colorspace: colorspace.clone(),
            color: self::color(color),
            alpha,
            params,
        };
        self.log(call, None);
        Ok(())
    }

    fn clip_image_mask(&mut self, image: &Arc<Image>, ctm: Affine, scissor: Rect) -> DeviceResult {
        let call = Call::ClipImageMask {
            image: image.clone(),
            ctm,
        };
        self.push(call, scissor);
        Ok(())
    }

    fn pop_clip(&mut self) -> DeviceResult {
        self.pop(Call::PopClip);
        Ok(())
    }

    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        params: ColorParams,
    ) -> DeviceResult {
        let call = Call::BeginMask {
            luminosity,
            colorspace: colorspace.clone(),
            backdrop: color(backdrop),
            params,
        };
        self.push(call, area);
        Ok(())
    }

    fn end_mask(&mut self) -> DeviceResult {
        self.log(Call::EndMask, None);
        Ok(())
    }

    fn begin_group(
        &mut self,
        area: Rect,
        colorspace: Option<&ColorSpace>,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) -> DeviceResult {
        let call = Call::BeginGroup {
            colorspace: colorspace.cloned(),
            isolated,
            knockout,
            blend,
            alpha,
        };
        self.push(call, area);
        Ok(())
    }

    fn end_group(&mut self) -> DeviceResult {
        self.pop(Call::EndGroup);
        Ok(())
    }

    fn begin_tile(
        &mut self,
        area: Rect,
        view: Rect,
        xstep: f32,
        ystep: f32,
        ctm: Affine,
        id: u32,
    ) -> DeviceResult<TileStatus> {
        let call = Call::BeginTile {
            area,
            view,
            xstep,
            ystep,
            ctm,
            id,
        };
        self.log(call, None);
        Ok(self
            .tiles
            .as_mut()
            .map_or(TileStatus::Render, |tiles| tiles.begin(id)))
    }

    fn end_tile(&mut self) -> DeviceResult {
        self.log(Call::EndTile, None);
        if let Some(tiles) = &mut self.tiles {
            tiles.end();
        }
        Ok(())
    }

    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) -> DeviceResult {
        self.log(Call::RenderFlags { set, clear }, None);
        Ok(())
    }

    fn set_default_colorspaces(&mut self, defaults: &Arc<DefaultColorSpaces>) -> DeviceResult {
        self.log(Call::DefaultColorSpaces(defaults.clone()), None);
        Ok(())
    }

    fn begin_layer(&mut self, name: &str) -> DeviceResult {
        self.log(Call::BeginLayer(name.to_string()), None);
        Ok(())
    }

    fn end_layer(&mut self) -> DeviceResult {
        self.log(Call::EndLayer, None);
        Ok(())
    }
}
