// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colorspaces, color parameters, and the canonical-color rules used by the
//! packed encoding.

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

/// Maximum number of color components a single color may carry.
pub const MAX_COLORS: usize = 32;

/// A colorspace referenced by recorded color operations.
///
/// The three device spaces are built in and cost nothing to embed in a display
/// list. Any other space is reference counted; the list holds one strong
/// reference per node that switches to it.
#[derive(Clone)]
pub enum ColorSpace {
    /// Single-component gray.
    DeviceGray,
    /// Three-component RGB.
    DeviceRgb,
    /// Four-component CMYK.
    DeviceCmyk,
    /// Any other colorspace (ICC based, indexed, separation, ...).
    Custom(Arc<CustomColorSpace>),
}

/// Description of a non-device colorspace.
///
/// Conversion math lives outside this crate; a display list only needs the
/// component count and identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomColorSpace {
    /// Human-readable name, e.g. `"ICCBased(sRGB)"`.
    pub name: String,
    /// Number of color components.
    pub components: usize,
}

impl ColorSpace {
    /// Create a reference-counted custom colorspace.
    pub fn custom(name: impl Into<String>, components: usize) -> Self {
        Self::Custom(Arc::new(CustomColorSpace {
            name: name.into(),
            components,
        }))
    }

    /// Number of color components.
    #[inline]
    pub fn components(&self) -> usize {
        match self {
            Self::DeviceGray => 1,
            Self::DeviceRgb => 3,
            Self::DeviceCmyk => 4,
            Self::Custom(cs) => cs.components,
        }
    }

    /// Returns `true` for the gray, RGB and CMYK device spaces.
    #[inline]
    pub fn is_device(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Identity comparison: device spaces by kind, custom spaces by pointer.
    #[inline]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DeviceGray, Self::DeviceGray)
            | (Self::DeviceRgb, Self::DeviceRgb)
            | (Self::DeviceCmyk, Self::DeviceCmyk) => true,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for ColorSpace {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceGray => f.write_str("DeviceGray"),
            Self::DeviceRgb => f.write_str("DeviceRgb"),
            Self::DeviceCmyk => f.write_str("DeviceCmyk"),
            Self::Custom(cs) => write!(f, "Custom({:?}, n={})", cs.name, cs.components),
        }
    }
}

pub(crate) static DEVICE_GRAY: ColorSpace = ColorSpace::DeviceGray;
pub(crate) static DEVICE_RGB: ColorSpace = ColorSpace::DeviceRgb;
pub(crate) static DEVICE_CMYK: ColorSpace = ColorSpace::DeviceCmyk;

/// Which canonical value a device-space color matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Canonical {
    /// Every component is `0.0`.
    Zero,
    /// Every component is `1.0`.
    One,
}

/// Classify `color` as canonical for `cs`, if `cs` is a device space.
pub(crate) fn canonical(cs: &ColorSpace, color: &[f32]) -> Option<Canonical> {
    if !cs.is_device() {
        return None;
    }
    let n = cs.components();
    let component = |i: usize| color.get(i).copied().unwrap_or(0.0);
    if (0..n).all(|i| component(i) == 0.0) {
        Some(Canonical::Zero)
    } else if (0..n).all(|i| component(i) == 1.0) {
        Some(Canonical::One)
    } else {
        None
    }
}

/// Rendering intent used when converting colors for output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderingIntent {
    /// Preserve perceptual relationships between colors.
    Perceptual,
    /// Reproduce in-gamut colors exactly relative to the media white point.
    #[default]
    RelativeColorimetric,
    /// Preserve saturation at the expense of hue accuracy.
    Saturation,
    /// Reproduce colors exactly, including the source white point.
    AbsoluteColorimetric,
}

/// Color-rendering parameters attached to painting operations.
///
/// These are packed into the per-op flag bits of a node header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorParams {
    /// Rendering intent.
    pub intent: RenderingIntent,
    /// Black point compensation.
    pub black_point_compensation: bool,
    /// Overprint enabled.
    pub overprint: bool,
    /// Nonzero overprint mode.
    pub overprint_mode: bool,
}

impl ColorParams {
    /// Number of header flag bits used by [`ColorParams::pack`].
    pub(crate) const BITS: u32 = 5;

    pub(crate) fn pack(self) -> u32 {
        let intent = match self.intent {
            RenderingIntent::Perceptual => 0,
            RenderingIntent::RelativeColorimetric => 1,
            RenderingIntent::Saturation => 2,
            RenderingIntent::AbsoluteColorimetric => 3,
        };
        intent
            | (u32::from(self.black_point_compensation) << 2)
            | (u32::from(self.overprint) << 3)
            | (u32::from(self.overprint_mode) << 4)
    }

    pub(crate) fn unpack(bits: u32) -> Self {
        let intent = match bits & 3 {
            0 => RenderingIntent::Perceptual,
            1 => RenderingIntent::RelativeColorimetric,
            2 => RenderingIntent::Saturation,
            _ => RenderingIntent::AbsoluteColorimetric,
        };
        Self {
            intent,
            black_point_compensation: bits & (1 << 2) != 0,
            overprint: bits & (1 << 3) != 0,
            overprint_mode: bits & (1 << 4) != 0,
        }
    }
}

/// Default colorspaces a content stream installs for its device-space colors.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultColorSpaces {
    /// Replacement for `DeviceGray`.
    pub gray: ColorSpace,
    /// Replacement for `DeviceRgb`.
    pub rgb: ColorSpace,
    /// Replacement for `DeviceCmyk`.
    pub cmyk: ColorSpace,
    /// Output intent, if any.
    pub output_intent: Option<ColorSpace>,
}

impl Default for DefaultColorSpaces {
    fn default() -> Self {
        Self {
            gray: ColorSpace::DeviceGray,
            rgb: ColorSpace::DeviceRgb,
            cmyk: ColorSpace::DeviceCmyk,
            output_intent: None,
        }
    }
}
