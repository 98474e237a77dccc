// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording device operations into a [`DisplayList`].
//!
//! The recorder writes only the fields that differ from the previous node and
//! tracks the bounds of everything drawn inside each clip. When a clip is
//! popped, its recorded rect is shrunk in place to the area its content
//! actually touched, so a later replay can cull the whole clip at once.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect, Shape};
use smallvec::SmallVec;

use crate::color::{
    Canonical, ColorParams, ColorSpace, DefaultColorSpaces, MAX_COLORS, canonical,
};
use crate::device::{BlendMode, Device, DeviceResult, FillRule, RenderFlags, TileStatus};
use crate::error::DisplayListError;
use crate::format::{
    AlphaTag, Command, CsTag, CtmDelta, FLAG_EVEN_ODD, FLAG_ISOLATED, FLAG_KNOCKOUT,
    FLAG_LUMINOSITY, Header, MAX_NODE_WORDS, NO_RESOURCE, Nesting, blend_bits, f32_word,
    pack_path, pack_str,
};
use crate::geom::{
    EMPTY_RECT, INFINITE_RECT, affine_to_f32, expand_rect, intersect_rect, rect_from_f32,
    rect_to_f32, transform_rect, union_rect,
};
use crate::list::DisplayList;
use crate::node::{CsRef, NodeCursor, NodeState};
use crate::resource::{Image, Resource, Shading, StrokeStyle, TextRun, stroke_expansion};

/// One open clip, mask or group.
#[derive(Copy, Clone, Debug)]
struct ClipLevel {
    /// Union of the content recorded inside this level so far.
    bounds: Rect,
    /// Word offset of the pushing node's rect, rewritten when the level is
    /// popped.
    update: Option<usize>,
}

/// Command-specific data appended after the shared fields.
#[derive(Clone, Copy, Debug)]
enum Private<'p> {
    None,
    Text(&'p Arc<TextRun>),
    Shading(&'p Arc<Shading>),
    Image(&'p Arc<Image>),
    Group(Option<&'p ColorSpace>),
    Tile {
        xstep: f32,
        ystep: f32,
        view: Rect,
        id: u32,
    },
    RenderFlags {
        set: RenderFlags,
        clear: RenderFlags,
    },
    DefaultColorSpaces(&'p Arc<DefaultColorSpaces>),
    Layer(&'p str),
}

/// Everything a single node may carry, before delta encoding.
#[derive(Clone, Copy, Debug)]
struct Op<'p> {
    command: Command,
    flags: u32,
    rect: Option<Rect>,
    color: Option<(&'p ColorSpace, &'p [f32])>,
    alpha: Option<f32>,
    ctm: Option<Affine>,
    stroke: Option<&'p Arc<StrokeStyle>>,
    path: Option<&'p BezPath>,
    private: Private<'p>,
}

impl Op<'_> {
    fn new(command: Command) -> Self {
        Self {
            command,
            flags: 0,
            rect: None,
            color: None,
            alpha: None,
            ctm: None,
            stroke: None,
            path: None,
            private: Private::None,
        }
    }
}

fn fill_flags(fill_rule: FillRule) -> u32 {
    match fill_rule {
        FillRule::EvenOdd => FLAG_EVEN_ODD,
        FillRule::NonZero => 0,
    }
}

/// Header tags and decoded reference for a device colorspace.
fn device_space(colorspace: &ColorSpace) -> Option<(CsRef, CsTag, CsTag)> {
    match colorspace {
        ColorSpace::DeviceGray => Some((CsRef::Gray, CsTag::GrayZero, CsTag::GrayOne)),
        ColorSpace::DeviceRgb => Some((CsRef::Rgb, CsTag::RgbZero, CsTag::RgbOne)),
        ColorSpace::DeviceCmyk => Some((CsRef::Cmyk, CsTag::CmykZero, CsTag::CmykOne)),
        ColorSpace::Custom(_) => None,
    }
}

/// A [`Device`] that appends every operation to a [`DisplayList`].
///
/// Recording fails only when storage cannot grow or a single node would be
/// too large; the failing operation is not recorded.
///
/// ```
/// use kurbo::{Affine, BezPath, Rect};
/// use understory_display_list::{
///     ColorParams, ColorSpace, Device, DisplayList, FillRule, Recorder,
/// };
///
/// let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
/// let mut rec = Recorder::new(&mut list);
/// let mut path = BezPath::new();
/// path.move_to((10.0, 10.0));
/// path.line_to((90.0, 10.0));
/// path.line_to((50.0, 90.0));
/// path.close_path();
/// rec.fill_path(
///     &path,
///     FillRule::NonZero,
///     Affine::IDENTITY,
///     &ColorSpace::DeviceRgb,
///     &[1.0, 0.0, 0.0],
///     1.0,
///     ColorParams::default(),
/// )
/// .unwrap();
/// rec.finish();
/// assert_eq!(list.node_count(), 1);
/// ```
#[derive(Debug)]
pub struct Recorder<'a> {
    list: &'a mut DisplayList,
    state: NodeState,
    stack: SmallVec<[ClipLevel; 16]>,
    tiled: usize,
    scratch: Vec<u32>,
}

impl<'a> Recorder<'a> {
    /// Start recording at the end of `list`.
    ///
    /// Any nodes already in `list` are decoded first so new nodes can be
    /// delta encoded against them; their clips are assumed balanced.
    pub fn new(list: &'a mut DisplayList) -> Self {
        let mut cursor = NodeCursor::new(list.words());
        while let Some(node) = cursor.next_node(list.resources()) {
            if node.is_err() {
                break;
            }
        }
        let state = cursor.into_state();
        Self {
            list,
            state,
            stack: SmallVec::new(),
            tiled: 0,
            scratch: Vec::new(),
        }
    }

    /// Number of clips, masks and groups currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Stop recording.
    ///
    /// Levels still open at this point are reported but left as recorded.
    pub fn finish(self) {
        if !self.stack.is_empty() {
            tracing::warn!(open = self.stack.len(), "display list finished with open clips");
        }
        if self.tiled > 0 {
            tracing::warn!(open = self.tiled, "display list finished inside a tile");
        }
        tracing::debug!(
            nodes = self.list.node_count(),
            words = self.list.len_words(),
            "finished recording"
        );
    }

    fn record(&mut self, op: Op<'_>) -> DeviceResult {
        let command = op.command;
        let rect = op.rect;
        let rect_at = self.append(op)?;
        match command.nesting() {
            Nesting::PushClip => {
                let level = if self.tiled > 0 {
                    ClipLevel {
                        bounds: INFINITE_RECT,
                        update: None,
                    }
                } else {
                    ClipLevel {
                        bounds: EMPTY_RECT,
                        update: rect_at,
                    }
                };
                self.stack.push(level);
                // The stored rect may shrink on pop; never delta against it.
                self.state.rect = None;
            }
            Nesting::PushLayer => self.stack.push(ClipLevel {
                bounds: rect.unwrap_or(INFINITE_RECT),
                update: None,
            }),
            Nesting::EndMask => {}
            Nesting::Pop => {
                self.close_level(rect.unwrap_or(INFINITE_RECT));
                self.fold(rect);
            }
            Nesting::Flat => match command {
                Command::BeginTile => {
                    if let Some(top) = self.stack.last_mut() {
                        top.bounds = INFINITE_RECT;
                    }
                    self.tiled += 1;
                }
                Command::EndTile => {
                    if self.tiled == 0 {
                        tracing::warn!("end_tile without a matching begin_tile");
                    }
                    self.tiled = self.tiled.saturating_sub(1);
                }
                _ => self.fold(rect),
            },
        }
        Ok(())
    }

    /// Add `rect` to the innermost level's bounds.
    fn fold(&mut self, rect: Option<Rect>) {
        if self.tiled > 0 {
            return;
        }
        if let (Some(rect), Some(top)) = (rect, self.stack.last_mut()) {
            top.bounds = union_rect(top.bounds, rect);
        }
    }

    /// The rect the innermost level's pop node records.
    ///
    /// Leaves the stack and the buffer untouched; [`Self::close_level`]
    /// commits once the pop node is stored.
    fn closing_rect(&self) -> Rect {
        let Some(level) = self.stack.last() else {
            tracing::warn!("pop without a matching push");
            return INFINITE_RECT;
        };
        match level.update {
            Some(at) => intersect_rect(rect_from_f32(self.list.rect_at(at)), level.bounds),
            None => level.bounds,
        }
    }

    /// Drop the innermost level, writing `rect` back into its push node.
    fn close_level(&mut self, rect: Rect) {
        if let Some(ClipLevel {
            update: Some(at), ..
        }) = self.stack.pop()
        {
            self.list.set_rect_at(at, rect_to_f32(rect));
        }
    }

    fn pop(&mut self, command: Command) -> DeviceResult {
        self.record(Op {
            rect: Some(self.closing_rect()),
            ..Op::new(command)
        })
    }

    /// Encode `op` against the tracked state and append it.
    ///
    /// Returns the absolute word offset of the node's rect, if it wrote one.
    fn append(&mut self, op: Op<'_>) -> Result<Option<usize>, DisplayListError> {
        let mut words = core::mem::take(&mut self.scratch);
        words.clear();
        let result = self.encode(&op, &mut words);
        self.scratch = words;
        result
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "resource slots are bounded by reserve_resources"
    )]
    fn encode(
        &mut self,
        op: &Op<'_>,
        words: &mut Vec<u32>,
    ) -> Result<Option<usize>, DisplayListError> {
        let command = op.command;
        let mut header = Header::new(command);
        header.set_flags(op.flags);
        let mut state = self.state.clone();
        let first_slot = self.list.resources().len();
        let mut added: SmallVec<[Resource; 3]> = SmallVec::new();
        let mut add = |resource: Resource| {
            let slot = (first_slot + added.len()) as u32;
            added.push(resource);
            slot
        };

        words.push(0);

        let mut rect_at = None;
        if let Some(rect) = op.rect {
            let packed = rect_to_f32(rect);
            let always = matches!(
                command.nesting(),
                Nesting::PushClip | Nesting::PushLayer | Nesting::Pop
            ) || command == Command::BeginTile;
            if always || state.rect != Some(packed) {
                header.set_rect();
                rect_at = Some(words.len());
                words.extend(packed.map(f32_word));
                state.rect = Some(packed);
            }
        }

        if let Some((colorspace, color)) = op.color {
            let n = colorspace.components();
            if n > MAX_COLORS {
                return Err(DisplayListError::TooManyColorComponents(n));
            }
            let component = |i: usize| color.get(i).copied().unwrap_or(0.0);
            let same_space = state
                .colorspace
                .resolve(self.list.resources())
                .is_some_and(|cs| cs.same_as(colorspace));
            let unchanged = same_space && (0..n).all(|i| component(i) == state.color[i]);
            if !unchanged {
                match (canonical(colorspace, color), device_space(colorspace)) {
                    (Some(value), Some((cs_ref, zero, one))) => {
                        let (tag, value) = match value {
                            Canonical::Zero => (zero, 0.0),
                            Canonical::One => (one, 1.0),
                        };
                        header.set_cs(tag);
                        state.set_device_color(cs_ref, n, value);
                    }
                    (_, device) => {
                        if !same_space {
                            if let Some((cs_ref, zero, _)) = device {
                                header.set_cs(zero);
                                state.set_device_color(cs_ref, n, 0.0);
                            } else {
                                let slot = add(Resource::ColorSpace(colorspace.clone()));
                                header.set_cs(CsTag::Other);
                                words.push(slot);
                                state.colorspace = CsRef::Slot(slot);
                                state.components = n;
                                state.color = [0.0; MAX_COLORS];
                            }
                        }
                        if (0..n).any(|i| component(i) != state.color[i]) {
                            header.set_color();
                            for (i, slot) in state.color[..n].iter_mut().enumerate() {
                                *slot = component(i);
                                words.push(f32_word(*slot));
                            }
                        }
                    }
                }
            }
        }

        if let Some(alpha) = op.alpha
            && alpha != state.alpha
        {
            let tag = if alpha == 0.0 {
                AlphaTag::Zero
            } else if alpha == 1.0 {
                AlphaTag::One
            } else {
                words.push(f32_word(alpha));
                AlphaTag::Explicit
            };
            header.set_alpha(tag);
            state.alpha = alpha;
        }

        if let Some(ctm) = op.ctm {
            let c = affine_to_f32(ctm);
            let s = state.ctm;
            let mut delta = CtmDelta::empty();
            if c[0] != s[0] || c[3] != s[3] {
                delta |= CtmDelta::AD;
                words.extend([f32_word(c[0]), f32_word(c[3])]);
            }
            if c[1] != s[1] || c[2] != s[2] {
                delta |= CtmDelta::BC;
                words.extend([f32_word(c[1]), f32_word(c[2])]);
            }
            if c[4] != s[4] || c[5] != s[5] {
                delta |= CtmDelta::EF;
                words.extend([f32_word(c[4]), f32_word(c[5])]);
            }
            header.set_ctm(delta);
            state.ctm = c;
        }

        if let Some(stroke) = op.stroke {
            let same = state
                .stroke
                .and_then(|slot| self.list.resource(slot))
                .and_then(Resource::as_stroke)
                .is_some_and(|last| Arc::ptr_eq(last, stroke) || **last == **stroke);
            if !same {
                let slot = add(Resource::Stroke(stroke.clone()));
                header.set_stroke();
                words.push(slot);
                state.stroke = Some(slot);
            }
        }

        let mut path_at = None;
        if let Some(path) = op.path {
            let at = words.len();
            pack_path(path, words);
            let same = state
                .path
                .as_ref()
                .is_some_and(|range| self.list.words().get(range.clone()) == Some(&words[at + 1..]));
            if same {
                words.truncate(at);
            } else {
                header.set_path();
                path_at = Some(at);
            }
        }

        match op.private {
            Private::None => {}
            Private::Text(text) => words.push(add(Resource::Text(text.clone()))),
            Private::Shading(shade) => words.push(add(Resource::Shading(shade.clone()))),
            Private::Image(image) => words.push(add(Resource::Image(image.clone()))),
            Private::Group(colorspace) => {
                let slot = colorspace.map_or(NO_RESOURCE, |cs| add(Resource::ColorSpace(cs.clone())));
                words.push(slot);
            }
            Private::Tile {
                xstep,
                ystep,
                view,
                id,
            } => {
                words.extend([f32_word(xstep), f32_word(ystep)]);
                words.extend(rect_to_f32(view).map(f32_word));
                words.push(id);
            }
            Private::RenderFlags { set, clear } => words.extend([set.bits(), clear.bits()]),
            Private::DefaultColorSpaces(defaults) => {
                words.push(add(Resource::DefaultColorSpaces(defaults.clone())));
            }
            Private::Layer(name) => pack_str(name, words),
        }

        let size = words.len();
        if size > MAX_NODE_WORDS {
            tracing::error!(?command, words = size, "node too large to record");
            return Err(DisplayListError::NodeTooLarge {
                command,
                words: size,
            });
        }
        header.set_size(size);
        words[0] = header.0;

        self.list.reserve_node(size)?;
        self.list.reserve_resources(added.len())?;
        for resource in added {
            self.list.push_resource(resource);
        }
        let offset = self.list.push_node(words);
        if let Some(at) = path_at {
            let start = offset + at + 1;
            state.path = Some(start..start + words[at] as usize);
        }
        self.state = state;
        Ok(rect_at.map(|at| offset + at))
    }
}

impl Device for Recorder<'_> {
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
        self.record(Op {
            flags: params.pack() | fill_flags(fill_rule),
            rect: Some(transform_rect(ctm, path.bounding_box())),
            color: Some((colorspace, color)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            path: Some(path),
            ..Op::new(Command::FillPath)
        })
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
        let bounds = expand_rect(path.bounding_box(), stroke_expansion(stroke));
        self.record(Op {
            flags: params.pack(),
            rect: Some(transform_rect(ctm, bounds)),
            color: Some((colorspace, color)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            stroke: Some(stroke),
            path: Some(path),
            ..Op::new(Command::StrokePath)
        })
    }

    fn clip_path(
        &mut self,
        path: &BezPath,
        fill_rule: FillRule,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let rect = intersect_rect(transform_rect(ctm, path.bounding_box()), scissor);
        self.record(Op {
            flags: fill_flags(fill_rule),
            rect: Some(rect),
            ctm: Some(ctm),
            path: Some(path),
            ..Op::new(Command::ClipPath)
        })
    }

    fn clip_stroke_path(
        &mut self,
        path: &BezPath,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let bounds = expand_rect(path.bounding_box(), stroke_expansion(stroke));
        self.record(Op {
            rect: Some(intersect_rect(transform_rect(ctm, bounds), scissor)),
            ctm: Some(ctm),
            stroke: Some(stroke),
            path: Some(path),
            ..Op::new(Command::ClipStrokePath)
        })
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
        self.record(Op {
            flags: params.pack(),
            rect: Some(transform_rect(ctm, text.bounds)),
            color: Some((colorspace, color)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            private: Private::Text(text),
            ..Op::new(Command::FillText)
        })
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
        let bounds = expand_rect(text.bounds, stroke_expansion(stroke));
        self.record(Op {
            flags: params.pack(),
            rect: Some(transform_rect(ctm, bounds)),
            color: Some((colorspace, color)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            stroke: Some(stroke),
            private: Private::Text(text),
            ..Op::new(Command::StrokeText)
        })
    }

    fn clip_text(&mut self, text: &Arc<TextRun>, ctm: Affine, scissor: Rect) -> DeviceResult {
        self.record(Op {
            rect: Some(intersect_rect(transform_rect(ctm, text.bounds), scissor)),
            ctm: Some(ctm),
            private: Private::Text(text),
            ..Op::new(Command::ClipText)
        })
    }

    fn clip_stroke_text(
        &mut self,
        text: &Arc<TextRun>,
        stroke: &Arc<StrokeStyle>,
        ctm: Affine,
        scissor: Rect,
    ) -> DeviceResult {
        let bounds = expand_rect(text.bounds, stroke_expansion(stroke));
        self.record(Op {
            rect: Some(intersect_rect(transform_rect(ctm, bounds), scissor)),
            ctm: Some(ctm),
            stroke: Some(stroke),
            private: Private::Text(text),
            ..Op::new(Command::ClipStrokeText)
        })
    }

    fn ignore_text(&mut self, text: &Arc<TextRun>, ctm: Affine) -> DeviceResult {
        self.record(Op {
            rect: Some(transform_rect(ctm, text.bounds)),
            ctm: Some(ctm),
            private: Private::Text(text),
            ..Op::new(Command::IgnoreText)
        })
    }

    fn fill_shade(
        &mut self,
        shade: &Arc<Shading>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        self.record(Op {
            flags: params.pack(),
            rect: Some(transform_rect(ctm, shade.bounds)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            private: Private::Shading(shade),
            ..Op::new(Command::FillShade)
        })
    }

    fn fill_image(
        &mut self,
        image: &Arc<Image>,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    ) -> DeviceResult {
        self.record(Op {
            flags: params.pack(),
            rect: Some(transform_rect(ctm, unit_square())),
            alpha: Some(alpha),
            ctm: Some(ctm),
            private: Private::Image(image),
            ..Op::new(Command::FillImage)
        })
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
        self.record(Op {
            flags: params.pack(),
            rect: Some(transform_rect(ctm, unit_square())),
            color: Some((colorspace, color)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            private: Private::Image(image),
            ..Op::new(Command::FillImageMask)
        })
    }

    fn clip_image_mask(&mut self, image: &Arc<Image>, ctm: Affine, scissor: Rect) -> DeviceResult {
        self.record(Op {
            rect: Some(intersect_rect(transform_rect(ctm, unit_square()), scissor)),
            ctm: Some(ctm),
            private: Private::Image(image),
            ..Op::new(Command::ClipImageMask)
        })
    }

    fn pop_clip(&mut self) -> DeviceResult {
        self.pop(Command::PopClip)
    }

    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        params: ColorParams,
    ) -> DeviceResult {
        let flags = params.pack() | if luminosity { FLAG_LUMINOSITY } else { 0 };
        self.record(Op {
            flags,
            rect: Some(area),
            color: Some((colorspace, backdrop)),
            ..Op::new(Command::BeginMask)
        })
    }

    fn end_mask(&mut self) -> DeviceResult {
        self.record(Op::new(Command::EndMask))
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
        let mut flags = blend_bits(blend);
        if isolated {
            flags |= FLAG_ISOLATED;
        }
        if knockout {
            flags |= FLAG_KNOCKOUT;
        }
        self.record(Op {
            flags,
            rect: Some(area),
            alpha: Some(alpha),
            private: Private::Group(colorspace),
            ..Op::new(Command::BeginGroup)
        })
    }

    fn end_group(&mut self) -> DeviceResult {
        self.pop(Command::EndGroup)
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
        self.record(Op {
            rect: Some(area),
            ctm: Some(ctm),
            private: Private::Tile {
                xstep,
                ystep,
                view,
                id,
            },
            ..Op::new(Command::BeginTile)
        })?;
        Ok(TileStatus::Render)
    }

    fn end_tile(&mut self) -> DeviceResult {
        self.record(Op::new(Command::EndTile))
    }

    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) -> DeviceResult {
        self.record(Op {
            private: Private::RenderFlags { set, clear },
            ..Op::new(Command::RenderFlags)
        })
    }

    fn set_default_colorspaces(&mut self, defaults: &Arc<DefaultColorSpaces>) -> DeviceResult {
        self.record(Op {
            private: Private::DefaultColorSpaces(defaults),
            ..Op::new(Command::DefaultColorSpaces)
        })
    }

    fn begin_layer(&mut self, name: &str) -> DeviceResult {
        self.record(Op {
            private: Private::Layer(name),
            ..Op::new(Command::BeginLayer)
        })
    }

    fn end_layer(&mut self) -> DeviceResult {
        self.record(Op::new(Command::EndLayer))
    }
}

fn unit_square() -> Rect {
    Rect::new(0.0, 0.0, 1.0, 1.0)
}
