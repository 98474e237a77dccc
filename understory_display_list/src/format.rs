// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed node format.
//!
//! A display list is a sequence of 32-bit words. Each node starts with a
//! one-word [`Header`] followed by the fields its presence bits announce, in
//! this order:
//!
//! | field       | words                    | present when                      |
//! |-------------|--------------------------|-----------------------------------|
//! | rect        | 4 (`f32` x0 y0 x1 y1)    | `rect` bit                        |
//! | colorspace  | 1 (resource index)       | colorspace tag is `Other`         |
//! | color       | n (`f32`)                | `color` bit; n from the colorspace|
//! | alpha       | 1 (`f32`)                | alpha tag is `Explicit`           |
//! | ctm {a, d}  | 2 (`f32`)                | ctm bit `AD`                      |
//! | ctm {b, c}  | 2 (`f32`)                | ctm bit `BC`                      |
//! | ctm {e, f}  | 2 (`f32`)                | ctm bit `EF`                      |
//! | stroke      | 1 (resource index)       | `stroke` bit                      |
//! | path        | 1 + length               | `path` bit                        |
//! | private     | command specific         | always, per command               |
//!
//! The header's size field is 9 bits wide, which caps a node at
//! [`MAX_NODE_WORDS`].

use alloc::vec::Vec;

use kurbo::{BezPath, PathEl, Point};

use crate::device::BlendMode;

/// Largest node, in words, that the header's size field can describe.
pub const MAX_NODE_WORDS: usize = (1 << Header::SIZE_BITS) - 1;

/// Resource index stored when an optional resource is absent.
pub(crate) const NO_RESOURCE: u32 = u32::MAX;

/// Recorded operation kinds.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// [`Device::fill_path`](crate::Device::fill_path).
    FillPath = 0,
    /// [`Device::stroke_path`](crate::Device::stroke_path).
    StrokePath,
    /// [`Device::clip_path`](crate::Device::clip_path).
    ClipPath,
    /// [`Device::clip_stroke_path`](crate::Device::clip_stroke_path).
    ClipStrokePath,
    /// [`Device::fill_text`](crate::Device::fill_text).
    FillText,
    /// [`Device::stroke_text`](crate::Device::stroke_text).
    StrokeText,
    /// [`Device::clip_text`](crate::Device::clip_text).
    ClipText,
    /// [`Device::clip_stroke_text`](crate::Device::clip_stroke_text).
    ClipStrokeText,
    /// [`Device::ignore_text`](crate::Device::ignore_text).
    IgnoreText,
    /// [`Device::fill_shade`](crate::Device::fill_shade).
    FillShade,
    /// [`Device::fill_image`](crate::Device::fill_image).
    FillImage,
    /// [`Device::fill_image_mask`](crate::Device::fill_image_mask).
    FillImageMask,
    /// [`Device::clip_image_mask`](crate::Device::clip_image_mask).
    ClipImageMask,
    /// [`Device::pop_clip`](crate::Device::pop_clip).
    PopClip,
    /// [`Device::begin_mask`](crate::Device::begin_mask).
    BeginMask,
    /// [`Device::end_mask`](crate::Device::end_mask).
    EndMask,
    /// [`Device::begin_group`](crate::Device::begin_group).
    BeginGroup,
    /// [`Device::end_group`](crate::Device::end_group).
    EndGroup,
    /// [`Device::begin_tile`](crate::Device::begin_tile).
    BeginTile,
    /// [`Device::end_tile`](crate::Device::end_tile).
    EndTile,
    /// [`Device::render_flags`](crate::Device::render_flags).
    RenderFlags,
    /// [`Device::set_default_colorspaces`](crate::Device::set_default_colorspaces).
    DefaultColorSpaces,
    /// [`Device::begin_layer`](crate::Device::begin_layer).
    BeginLayer,
    /// [`Device::end_layer`](crate::Device::end_layer).
    EndLayer,
}

/// How a command affects the clip/mask/group nesting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Nesting {
    /// Opens a clip-like level whose rect can be tightened by its content.
    PushClip,
    /// Opens a mask or group level.
    PushLayer,
    /// Closes the innermost level.
    Pop,
    /// Ends a mask definition without closing its level.
    EndMask,
    /// No effect on nesting.
    Flat,
}

impl Command {
    const ALL: [Self; 24] = [
        Self::FillPath,
        Self::StrokePath,
        Self::ClipPath,
        Self::ClipStrokePath,
        Self::FillText,
        Self::StrokeText,
        Self::ClipText,
        Self::ClipStrokeText,
        Self::IgnoreText,
        Self::FillShade,
        Self::FillImage,
        Self::FillImageMask,
        Self::ClipImageMask,
        Self::PopClip,
        Self::BeginMask,
        Self::EndMask,
        Self::BeginGroup,
        Self::EndGroup,
        Self::BeginTile,
        Self::EndTile,
        Self::RenderFlags,
        Self::DefaultColorSpaces,
        Self::BeginLayer,
        Self::EndLayer,
    ];

    #[inline]
    pub(crate) fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }

    pub(crate) fn nesting(self) -> Nesting {
        match self {
            Self::ClipPath
            | Self::ClipStrokePath
            | Self::ClipText
            | Self::ClipStrokeText
            | Self::ClipImageMask => Nesting::PushClip,
            Self::BeginMask | Self::BeginGroup => Nesting::PushLayer,
            Self::PopClip | Self::EndGroup => Nesting::Pop,
            Self::EndMask => Nesting::EndMask,
            Self::FillPath
            | Self::StrokePath
            | Self::FillText
            | Self::StrokeText
            | Self::IgnoreText
            | Self::FillShade
            | Self::FillImage
            | Self::FillImageMask
            | Self::BeginTile
            | Self::EndTile
            | Self::RenderFlags
            | Self::DefaultColorSpaces
            | Self::BeginLayer
            | Self::EndLayer => Nesting::Flat,
        }
    }

    /// Commands that are never culled against the scissor.
    pub(crate) fn is_structural(self) -> bool {
        matches!(
            self,
            Self::RenderFlags
                | Self::DefaultColorSpaces
                | Self::BeginTile
                | Self::EndTile
                | Self::BeginLayer
                | Self::EndLayer
        )
    }
}

/// Colorspace field tag.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CsTag {
    Unchanged = 0,
    GrayZero,
    GrayOne,
    RgbZero,
    RgbOne,
    CmykZero,
    CmykOne,
    /// Explicit resource index follows.
    Other,
}

impl CsTag {
    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::GrayZero,
            2 => Self::GrayOne,
            3 => Self::RgbZero,
            4 => Self::RgbOne,
            5 => Self::CmykZero,
            6 => Self::CmykOne,
            7 => Self::Other,
            _ => Self::Unchanged,
        }
    }
}

/// Alpha field tag.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum AlphaTag {
    Unchanged = 0,
    Zero,
    One,
    /// Explicit `f32` follows.
    Explicit,
}

impl AlphaTag {
    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::Zero,
            2 => Self::One,
            3 => Self::Explicit,
            _ => Self::Unchanged,
        }
    }
}

bitflags::bitflags! {
    /// Transform coefficient groups written by a node.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub(crate) struct CtmDelta: u32 {
        /// The `{a, d}` (scale) pair.
        const AD = 1 << 0;
        /// The `{b, c}` (shear/rotation) pair.
        const BC = 1 << 1;
        /// The `{e, f}` (translation) pair.
        const EF = 1 << 2;
    }
}

/// A packed node header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Header(pub(crate) u32);

impl Header {
    const CMD_SHIFT: u32 = 0;
    const CMD_BITS: u32 = 5;
    const SIZE_SHIFT: u32 = 5;
    const SIZE_BITS: u32 = 9;
    const RECT_BIT: u32 = 14;
    const PATH_BIT: u32 = 15;
    const CS_SHIFT: u32 = 16;
    const CS_BITS: u32 = 3;
    const COLOR_BIT: u32 = 19;
    const ALPHA_SHIFT: u32 = 20;
    const ALPHA_BITS: u32 = 2;
    const CTM_SHIFT: u32 = 22;
    const CTM_BITS: u32 = 3;
    const STROKE_BIT: u32 = 25;
    const FLAGS_SHIFT: u32 = 26;
    pub(crate) const FLAGS_BITS: u32 = 6;

    #[inline]
    const fn mask(bits: u32) -> u32 {
        (1 << bits) - 1
    }

    #[inline]
    fn get(self, shift: u32, bits: u32) -> u32 {
        (self.0 >> shift) & Self::mask(bits)
    }

    #[inline]
    fn set(&mut self, shift: u32, bits: u32, value: u32) {
        debug_assert!(value <= Self::mask(bits), "header field overflow");
        self.0 = (self.0 & !(Self::mask(bits) << shift)) | ((value & Self::mask(bits)) << shift);
    }

    pub(crate) fn new(command: Command) -> Self {
        let mut header = Self(0);
        header.set(Self::CMD_SHIFT, Self::CMD_BITS, command as u32);
        header
    }

    #[inline]
    pub(crate) fn command(self) -> Option<Command> {
        Command::from_bits(self.get(Self::CMD_SHIFT, Self::CMD_BITS))
    }

    #[inline]
    pub(crate) fn size(self) -> usize {
        self.get(Self::SIZE_SHIFT, Self::SIZE_BITS) as usize
    }

    pub(crate) fn set_size(&mut self, words: usize) {
        debug_assert!(words <= MAX_NODE_WORDS, "node size checked before packing");
        self.set(Self::SIZE_SHIFT, Self::SIZE_BITS, words as u32);
    }

    #[inline]
    pub(crate) fn has_rect(self) -> bool {
        self.get(Self::RECT_BIT, 1) != 0
    }

    pub(crate) fn set_rect(&mut self) {
        self.set(Self::RECT_BIT, 1, 1);
    }

    #[inline]
    pub(crate) fn has_path(self) -> bool {
        self.get(Self::PATH_BIT, 1) != 0
    }

    pub(crate) fn set_path(&mut self) {
        self.set(Self::PATH_BIT, 1, 1);
    }

    #[inline]
    pub(crate) fn cs(self) -> CsTag {
        CsTag::from_bits(self.get(Self::CS_SHIFT, Self::CS_BITS))
    }

    pub(crate) fn set_cs(&mut self, tag: CsTag) {
        self.set(Self::CS_SHIFT, Self::CS_BITS, tag as u32);
    }

    #[inline]
    pub(crate) fn has_color(self) -> bool {
        self.get(Self::COLOR_BIT, 1) != 0
    }

    pub(crate) fn set_color(&mut self) {
        self.set(Self::COLOR_BIT, 1, 1);
    }

    #[inline]
    pub(crate) fn alpha(self) -> AlphaTag {
        AlphaTag::from_bits(self.get(Self::ALPHA_SHIFT, Self::ALPHA_BITS))
    }

    pub(crate) fn set_alpha(&mut self, tag: AlphaTag) {
        self.set(Self::ALPHA_SHIFT, Self::ALPHA_BITS, tag as u32);
    }

    #[inline]
    pub(crate) fn ctm(self) -> CtmDelta {
        CtmDelta::from_bits_truncate(self.get(Self::CTM_SHIFT, Self::CTM_BITS))
    }

    pub(crate) fn set_ctm(&mut self, delta: CtmDelta) {
        self.set(Self::CTM_SHIFT, Self::CTM_BITS, delta.bits());
    }

    #[inline]
    pub(crate) fn has_stroke(self) -> bool {
        self.get(Self::STROKE_BIT, 1) != 0
    }

    pub(crate) fn set_stroke(&mut self) {
        self.set(Self::STROKE_BIT, 1, 1);
    }

    #[inline]
    pub(crate) fn flags(self) -> u32 {
        self.get(Self::FLAGS_SHIFT, Self::FLAGS_BITS)
    }

    pub(crate) fn set_flags(&mut self, flags: u32) {
        self.set(Self::FLAGS_SHIFT, Self::FLAGS_BITS, flags);
    }
}

// Per-command flag bits.
pub(crate) const FLAG_EVEN_ODD: u32 = 1 << 5;
pub(crate) const FLAG_ISOLATED: u32 = 1 << 0;
pub(crate) const FLAG_KNOCKOUT: u32 = 1 << 1;
pub(crate) const BLEND_SHIFT: u32 = 2;
pub(crate) const FLAG_LUMINOSITY: u32 = 1 << 5;

const BLEND_MODES: [BlendMode; 16] = [
    BlendMode::Normal,
    BlendMode::Multiply,
    BlendMode::Screen,
    BlendMode::Overlay,
    BlendMode::Darken,
    BlendMode::Lighten,
    BlendMode::ColorDodge,
    BlendMode::ColorBurn,
    BlendMode::HardLight,
    BlendMode::SoftLight,
    BlendMode::Difference,
    BlendMode::Exclusion,
    BlendMode::Hue,
    BlendMode::Saturation,
    BlendMode::Color,
    BlendMode::Luminosity,
];

/// Group flag bits for a blend mode. Unknown modes pack as `Normal`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "index into a 16-entry table"
)]
pub(crate) fn blend_bits(blend: BlendMode) -> u32 {
    let index = BLEND_MODES.iter().position(|b| *b == blend).unwrap_or(0);
    (index as u32) << BLEND_SHIFT
}

pub(crate) fn blend_from_bits(flags: u32) -> BlendMode {
    BLEND_MODES[((flags >> BLEND_SHIFT) & 0xf) as usize]
}

#[inline]
pub(crate) fn f32_word(value: f32) -> u32 {
    value.to_bits()
}

#[inline]
pub(crate) fn word_f32(word: u32) -> f32 {
    f32::from_bits(word)
}

const VERB_MOVE: u32 = 0;
const VERB_LINE: u32 = 1;
const VERB_QUAD: u32 = 2;
const VERB_CUBIC: u32 = 3;
const VERB_CLOSE: u32 = 4;

#[allow(
    clippy::cast_possible_truncation,
    reason = "packed coordinates are f32"
)]
fn push_point(out: &mut Vec<u32>, p: Point) {
    out.push(f32_word(p.x as f32));
    out.push(f32_word(p.y as f32));
}

/// Append `path` as a length word followed by verbs and `f32` coordinates.
#[allow(
    clippy::cast_possible_truncation,
    reason = "a path never exceeds the node size limit"
)]
pub(crate) fn pack_path(path: &BezPath, out: &mut Vec<u32>) {
    let len_at = out.len();
    out.push(0);
    for el in path.iter() {
        match el {
            PathEl::MoveTo(p) => {
                out.push(VERB_MOVE);
                push_point(out, p);
            }
            PathEl::LineTo(p) => {
                out.push(VERB_LINE);
                push_point(out, p);
            }
            PathEl::QuadTo(p1, p2) => {
                out.push(VERB_QUAD);
                push_point(out, p1);
                push_point(out, p2);
            }
            PathEl::CurveTo(p1, p2, p3) => {
                out.push(VERB_CUBIC);
                push_point(out, p1);
                push_point(out, p2);
                push_point(out, p3);
            }
            PathEl::ClosePath => out.push(VERB_CLOSE),
        }
    }
    out[len_at] = (out.len() - len_at - 1) as u32;
}

/// Rebuild a path from its packed body (the words after the length word).
pub(crate) fn unpack_path(words: &[u32]) -> BezPath {
    let mut path = BezPath::new();
    let mut i = 0;
    let point = |i: &mut usize| {
        let p = Point::new(
            f64::from(word_f32(words.get(*i).copied().unwrap_or(0))),
            f64::from(word_f32(words.get(*i + 1).copied().unwrap_or(0))),
        );
        *i += 2;
        p
    };
    while i < words.len() {
        let verb = words[i];
        i += 1;
        match verb {
            VERB_MOVE => path.move_to(point(&mut i)),
            VERB_LINE => path.line_to(point(&mut i)),
            VERB_QUAD => {
                let p1 = point(&mut i);
                let p2 = point(&mut i);
                path.quad_to(p1, p2);
            }
            VERB_CUBIC => {
                let p1 = point(&mut i);
                let p2 = point(&mut i);
                let p3 = point(&mut i);
                path.curve_to(p1, p2, p3);
            }
            _ => path.close_path(),
        }
    }
    path
}

/// Append `s` as a byte-length word followed by its UTF-8 bytes, zero padded.
#[allow(
    clippy::cast_possible_truncation,
    reason = "string length is checked against the node size limit"
)]
pub(crate) fn pack_str(s: &str, out: &mut Vec<u32>) {
    let bytes = s.as_bytes();
    out.push(bytes.len() as u32);
    let start = out.len();
    out.resize(start + bytes.len().div_ceil(4), 0);
    let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut out[start..]);
    dst[..bytes.len()].copy_from_slice(bytes);
}

/// Borrow a string packed by [`pack_str`]; `words` starts at the length word.
pub(crate) fn unpack_str(words: &[u32]) -> &str {
    let Some((&len, body)) = words.split_first() else {
        return "";
    };
    let bytes: &[u8] = bytemuck::cast_slice(body);
    bytes
        .get(..len as usize)
        .and_then(|b| core::str::from_utf8(b).ok())
        .unwrap_or("")
}

/// Words taken by a string packed by [`pack_str`].
#[inline]
pub(crate) fn str_words(byte_len: u32) -> usize {
    1 + (byte_len as usize).div_ceil(4)
}
