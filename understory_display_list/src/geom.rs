// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle rules shared by the recorder and the replay engine.
//!
//! Bounds accumulation needs two sentinels that `kurbo::Rect` does not
//! model directly: an *empty* rect that is the identity for union, and an
//! *infinite* rect that is the identity for intersection. The helpers here
//! keep both sentinels stable under union, intersection and transformation,
//! where the plain `kurbo` methods would produce NaNs from `0 * inf`.

use kurbo::{Affine, Rect};

/// The identity for [`union_rect`]; contains nothing.
pub const EMPTY_RECT: Rect = Rect::new(
    f64::INFINITY,
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
);

/// The identity for [`intersect_rect`]; contains everything.
pub const INFINITE_RECT: Rect = Rect::new(
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::INFINITY,
);

/// Returns `true` if `r` encloses no area.
///
/// NaN coordinates count as empty.
#[inline]
pub fn is_empty_rect(r: Rect) -> bool {
    !(r.x1 > r.x0 && r.y1 > r.y0)
}

/// Returns `true` if `r` is unbounded in every direction.
#[inline]
pub fn is_infinite_rect(r: Rect) -> bool {
    r.x0 == f64::NEG_INFINITY
        && r.y0 == f64::NEG_INFINITY
        && r.x1 == f64::INFINITY
        && r.y1 == f64::INFINITY
}

/// Smallest rect containing both inputs, treating empty rects as absent.
#[inline]
pub fn union_rect(a: Rect, b: Rect) -> Rect {
    if is_empty_rect(a) {
        b
    } else if is_empty_rect(b) {
        a
    } else {
        a.union(b)
    }
}

/// Overlap of both inputs; [`EMPTY_RECT`] if they do not overlap.
#[inline]
pub fn intersect_rect(a: Rect, b: Rect) -> Rect {
    let r = Rect::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1));
    if is_empty_rect(r) { EMPTY_RECT } else { r }
}

/// Bounding box of `r` after applying `ctm`.
///
/// Empty and infinite rects map to themselves.
#[inline]
pub fn transform_rect(ctm: Affine, r: Rect) -> Rect {
    if is_empty_rect(r) {
        EMPTY_RECT
    } else if is_infinite_rect(r) {
        INFINITE_RECT
    } else {
        ctm.transform_rect_bbox(r)
    }
}

/// Grow `r` by `amount` on every side. Sentinels are left alone.
#[inline]
pub(crate) fn expand_rect(r: Rect, amount: f64) -> Rect {
    if is_empty_rect(r) || is_infinite_rect(r) {
        r
    } else {
        r.inflate(amount, amount)
    }
}

/// Round a rect through the packed `f32` representation.
#[inline]
#[allow(
    clippy::cast_possible_truncation,
    reason = "rects are stored as f32"
)]
pub(crate) fn rect_to_f32(r: Rect) -> [f32; 4] {
    [r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32]
}

#[inline]
pub(crate) fn rect_from_f32(r: [f32; 4]) -> Rect {
    Rect::new(
        f64::from(r[0]),
        f64::from(r[1]),
        f64::from(r[2]),
        f64::from(r[3]),
    )
}

/// Round a transform through the packed `f32` representation.
#[inline]
#[allow(
    clippy::cast_possible_truncation,
    reason = "transforms are stored as f32"
)]
pub(crate) fn affine_to_f32(ctm: Affine) -> [f32; 6] {
    let c = ctm.as_coeffs();
    [
        c[0] as f32,
        c[1] as f32,
        c[2] as f32,
        c[3] as f32,
        c[4] as f32,
        c[5] as f32,
    ]
}

#[inline]
pub(crate) fn affine_from_f32(c: [f32; 6]) -> Affine {
    Affine::new([
        f64::from(c[0]),
        f64::from(c[1]),
        f64::from(c[2]),
        f64::from(c[3]),
        f64::from(c[4]),
        f64::from(c[5]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_union_identity() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(union_rect(EMPTY_RECT, r), r);
        assert_eq!(union_rect(r, EMPTY_RECT), r);
        assert!(is_empty_rect(union_rect(EMPTY_RECT, EMPTY_RECT)));
    }

    #[test]
    fn infinite_is_intersection_identity() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(intersect_rect(INFINITE_RECT, r), r);
        assert!(is_infinite_rect(intersect_rect(INFINITE_RECT, INFINITE_RECT)));
        assert!(is_empty_rect(intersect_rect(r, EMPTY_RECT)));
    }

    #[test]
    fn disjoint_rects_intersect_to_empty() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(2.0, 2.0, 3.0, 3.0);
        assert!(is_empty_rect(intersect_rect(a, b)));
    }

    #[test]
    fn sentinels_survive_transforms() {
        let ctm = Affine::new([0.0, 1.0, -1.0, 0.0, 5.0, 5.0]);
        assert!(is_infinite_rect(transform_rect(ctm, INFINITE_RECT)));
        assert!(is_empty_rect(transform_rect(ctm, EMPTY_RECT)));
        let r = transform_rect(Affine::translate((10.0, 20.0)), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(r, Rect::new(10.0, 20.0, 11.0, 21.0));
    }

    #[test]
    fn f32_round_trip_keeps_sentinels() {
        assert!(is_infinite_rect(rect_from_f32(rect_to_f32(INFINITE_RECT))));
        assert!(is_empty_rect(rect_from_f32(rect_to_f32(EMPTY_RECT))));
    }
}
