// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node decoding.
//!
//! Fields omitted from a node inherit their value from the last node that
//! wrote them. [`NodeState`] is that inherited state; the recorder keeps one
//! to decide what to omit and [`NodeCursor`] keeps one to fill the gaps back
//! in, so both sides start from [`NodeState::default`].

use core::ops::Range;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::color::{ColorSpace, DEVICE_CMYK, DEVICE_GRAY, DEVICE_RGB, MAX_COLORS};
use crate::error::DisplayListError;
use crate::format::{AlphaTag, Command, CsTag, CtmDelta, Header, NO_RESOURCE, word_f32};
use crate::geom::rect_from_f32;
use crate::resource::Resource;

/// The colorspace of the current color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CsRef {
    Gray,
    Rgb,
    Cmyk,
    /// A custom space held in the resource table.
    Slot(u32),
}

impl CsRef {
    pub(crate) fn resolve<'a>(self, resources: &'a [Option<Resource>]) -> Option<&'a ColorSpace> {
        match self {
            Self::Gray => Some(&DEVICE_GRAY),
            Self::Rgb => Some(&DEVICE_RGB),
            Self::Cmyk => Some(&DEVICE_CMYK),
            Self::Slot(slot) => resources
                .get(slot as usize)?
                .as_ref()?
                .as_color_space(),
        }
    }
}

/// State carried from node to node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NodeState {
    /// Last rect written, if it is still meaningful.
    pub(crate) rect: Option<[f32; 4]>,
    pub(crate) ctm: [f32; 6],
    pub(crate) colorspace: CsRef,
    pub(crate) components: usize,
    pub(crate) color: [f32; MAX_COLORS],
    pub(crate) alpha: f32,
    /// Resource slot of the last stroke.
    pub(crate) stroke: Option<u32>,
    /// Absolute word range of the last packed path body.
    pub(crate) path: Option<Range<usize>>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            rect: None,
            ctm: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            colorspace: CsRef::Gray,
            components: 1,
            color: [0.0; MAX_COLORS],
            alpha: 1.0,
            stroke: None,
            path: None,
        }
    }
}

impl NodeState {
    /// Switch to a device space with every component set to `value`.
    pub(crate) fn set_device_color(&mut self, colorspace: CsRef, components: usize, value: f32) {
        self.colorspace = colorspace;
        self.components = components;
        self.color = [0.0; MAX_COLORS];
        self.color[..components].fill(value);
    }

    /// Current color components.
    #[inline]
    pub(crate) fn color(&self) -> &[f32] {
        &self.color[..self.components]
    }

    /// Last rect in `f64`, or an empty rect if none was written.
    pub(crate) fn rect(&self) -> Rect {
        self.rect.map_or(crate::geom::EMPTY_RECT, rect_from_f32)
    }
}

/// Command-specific payload of a node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Payload {
    None,
    /// Text, shading, image or default-colorspaces resource.
    Resource(u32),
    Group {
        colorspace: Option<u32>,
    },
    Tile {
        xstep: f32,
        ystep: f32,
        view: [f32; 4],
        id: u32,
    },
    RenderFlags {
        set: u32,
        clear: u32,
    },
    /// Word range of a packed layer name, starting at its length word.
    Layer(Range<usize>),
}

/// A decoded node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub(crate) command: Command,
    pub(crate) flags: u32,
    pub(crate) payload: Payload,
    /// Resource slots this node holds a reference for.
    pub(crate) owned: SmallVec<[u32; 3]>,
}

struct Fields<'a> {
    words: &'a [u32],
    pos: usize,
}

impl Fields<'_> {
    fn word(&mut self) -> u32 {
        let word = self.words.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        word
    }

    fn f32(&mut self) -> f32 {
        word_f32(self.word())
    }

    fn rect(&mut self) -> [f32; 4] {
        [self.f32(), self.f32(), self.f32(), self.f32()]
    }
}

/// Walks a node buffer front to back, tracking [`NodeState`].
#[derive(Debug)]
pub(crate) struct NodeCursor<'a> {
    words: &'a [u32],
    pos: usize,
    state: NodeState,
}

impl<'a> NodeCursor<'a> {
    pub(crate) fn new(words: &'a [u32]) -> Self {
        Self {
            words,
            pos: 0,
            state: NodeState::default(),
        }
    }

    /// State after the last decoded node.
    #[inline]
    pub(crate) fn state(&self) -> &NodeState {
        &self.state
    }

    pub(crate) fn into_state(self) -> NodeState {
        self.state
    }

    /// Command of the next node, without decoding it.
    pub(crate) fn peek_command(&self) -> Option<Command> {
        Header(*self.words.get(self.pos)?).command()
    }

    /// Decode the next node and apply its fields to the tracked state.
    ///
    /// `resources` is consulted only to learn the component count of a
    /// custom colorspace the node switches to.
    pub(crate) fn next_node(
        &mut self,
        resources: &[Option<Resource>],
    ) -> Option<Result<Node, DisplayListError>> {
        let start = self.pos;
        let header = Header(*self.words.get(start)?);
        let size = header.size();
        let Some(command) = header.command().filter(|_| size > 0 && start + size <= self.words.len())
        else {
            self.pos = self.words.len();
            return Some(Err(DisplayListError::InvalidHeader { offset: start }));
        };
        self.pos = start + size;

        let body_start = start + 1;
        let mut fields = Fields {
            words: &self.words[body_start..start + size],
            pos: 0,
        };
        let mut owned = SmallVec::new();
        let state = &mut self.state;

        if header.has_rect() {
            state.rect = Some(fields.rect());
        }
        match header.cs() {
            CsTag::Unchanged => {}
            CsTag::GrayZero => state.set_device_color(CsRef::Gray, 1, 0.0),
            CsTag::GrayOne => state.set_device_color(CsRef::Gray, 1, 1.0),
            CsTag::RgbZero => state.set_device_color(CsRef::Rgb, 3, 0.0),
            CsTag::RgbOne => state.set_device_color(CsRef::Rgb, 3, 1.0),
            CsTag::CmykZero => state.set_device_color(CsRef::Cmyk, 4, 0.0),
            CsTag::CmykOne => state.set_device_color(CsRef::Cmyk, 4, 1.0),
            CsTag::Other => {
                let slot = fields.word();
                let Some(components) = CsRef::Slot(slot)
                    .resolve(resources)
                    .map(ColorSpace::components)
                    .filter(|n| *n <= MAX_COLORS)
                else {
                    return Some(Err(DisplayListError::CorruptNode(command)));
                };
                state.colorspace = CsRef::Slot(slot);
                state.components = components;
                state.color = [0.0; MAX_COLORS];
                owned.push(slot);
            }
        }
        if header.has_color() {
            let components = state.components;
            for c in &mut state.color[..components] {
                *c = fields.f32();
            }
        }
        match header.alpha() {
            AlphaTag::Unchanged => {}
            AlphaTag::Zero => state.alpha = 0.0,
            AlphaTag::One => state.alpha = 1.0,
            AlphaTag::Explicit => state.alpha = fields.f32(),
        }
        let delta = header.ctm();
        if delta.contains(CtmDelta::AD) {
            state.ctm[0] = fields.f32();
            state.ctm[3] = fields.f32();
        }
        if delta.contains(CtmDelta::BC) {
            state.ctm[1] = fields.f32();
            state.ctm[2] = fields.f32();
        }
        if delta.contains(CtmDelta::EF) {
            state.ctm[4] = fields.f32();
            state.ctm[5] = fields.f32();
        }
        if header.has_stroke() {
            let slot = fields.word();
            state.stroke = Some(slot);
            owned.push(slot);
        }
        if header.has_path() {
            let len = fields.word() as usize;
            let path_start = body_start + fields.pos;
            state.path = Some(path_start..path_start + len);
            fields.pos += len;
        }

        let payload = match command {
            Command::FillPath
            | Command::StrokePath
            | Command::ClipPath
            | Command::ClipStrokePath
            | Command::PopClip
            | Command::BeginMask
            | Command::EndMask
            | Command::EndGroup
            | Command::EndTile
            | Command::EndLayer => Payload::None,
            Command::FillText
            | Command::StrokeText
            | Command::ClipText
            | Command::ClipStrokeText
            | Command::IgnoreText
            | Command::FillShade
            | Command::FillImage
            | Command::FillImageMask
            | Command::ClipImageMask
            | Command::DefaultColorSpaces => {
                let slot = fields.word();
                owned.push(slot);
                Payload::Resource(slot)
            }
            Command::BeginGroup => {
                let slot = fields.word();
                let colorspace = (slot != NO_RESOURCE).then_some(slot);
                owned.extend(colorspace);
                Payload::Group { colorspace }
            }
            Command::BeginTile => Payload::Tile {
                xstep: fields.f32(),
                ystep: fields.f32(),
                view: fields.rect(),
                id: fields.word(),
            },
            Command::RenderFlags => Payload::RenderFlags {
                set: fields.word(),
                clear: fields.word(),
            },
            Command::BeginLayer => {
                let at = body_start + fields.pos;
                let len = crate::format::str_words(fields.word());
                fields.pos += len - 1;
                Payload::Layer(at..at + len)
            }
        };
        if fields.pos > fields.words.len() {
            return Some(Err(DisplayListError::CorruptNode(command)));
        }
        debug_assert_eq!(fields.pos, fields.words.len(), "{command:?} node has trailing words");

        Some(Ok(Node {
            command,
            flags: header.flags(),
            payload,
            owned,
        }))
    }

    /// Decode, without reporting, every node up to the `EndTile` matching an
    /// already consumed `BeginTile`. Returns the number of nodes passed over.
    pub(crate) fn skip_tile_contents(&mut self, resources: &[Option<Resource>]) -> usize {
        let mut depth = 0_usize;
        let mut skipped = 0;
        while let Some(command) = self.peek_command() {
            match command {
                Command::BeginTile => depth += 1,
                Command::EndTile if depth == 0 => break,
                Command::EndTile => depth -= 1,
                _ => {}
            }
            if self.next_node(resources).is_none() {
                break;
            }
            skipped += 1;
        }
        skipped
    }
}
