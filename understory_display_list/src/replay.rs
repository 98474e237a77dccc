// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replaying a [`DisplayList`] onto a [`Device`].

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kurbo::{Affine, Rect};

use crate::color::ColorParams;
use crate::device::{Device, DeviceError, DeviceResult, FillRule, RenderFlags, TileStatus};
use crate::error::DisplayListError;
use crate::format::{
    Command, FLAG_EVEN_ODD, FLAG_ISOLATED, FLAG_KNOCKOUT, FLAG_LUMINOSITY, Nesting,
    blend_from_bits, unpack_path, unpack_str,
};
use crate::geom::{affine_from_f32, intersect_rect, is_empty_rect, rect_from_f32, transform_rect};
use crate::list::DisplayList;
use crate::node::{Node, NodeCursor, NodeState, Payload};
use crate::resource::Resource;

/// Progress reporting and cancellation shared with a running replay.
///
/// A cookie may be read and aborted from another thread while the replay
/// runs.
#[derive(Debug, Default)]
pub struct Cookie {
    abort: AtomicBool,
    progress: AtomicUsize,
    progress_max: AtomicUsize,
    errors: AtomicUsize,
    incomplete: AtomicBool,
}

impl Cookie {
    /// Create a fresh cookie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the replay to stop before its next node.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`Cookie::abort`] has been called.
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Nodes visited so far.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Nodes in the list being replayed.
    pub fn progress_max(&self) -> usize {
        self.progress_max.load(Ordering::Relaxed)
    }

    /// Device and decode errors seen so far.
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns `true` if a replay stopped before the end of its list.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete.load(Ordering::Relaxed)
    }
}

/// Counters for a single [`replay`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Nodes decoded, including skipped ones.
    pub nodes: usize,
    /// Nodes handed to the device.
    pub dispatched: usize,
    /// Nodes skipped because they fall outside the scissor or inside a
    /// culled clip.
    pub culled: usize,
    /// Nodes skipped because the device already held their tile.
    pub cached: usize,
    /// Operations that failed.
    pub errors: usize,
    /// Whether the replay stopped early.
    pub aborted: bool,
}

enum Flow {
    Next,
    SkipTile,
}

/// Replay `list` onto `device`.
///
/// Every node is transformed by `ctm`. Nodes whose bounds fall outside
/// `scissor` are skipped; when a clip falls outside, everything up to its
/// matching pop is skipped with it, so the device still sees balanced
/// push/pop pairs. Content inside a tile is never culled, however large the
/// tile.
///
/// Failed device operations are counted and replay continues, unless the
/// device answers [`DeviceError::Aborted`] or `cookie` is aborted.
///
/// Replay only reads `list`, so several replays of the same list may run in
/// parallel.
pub fn replay<D: Device + ?Sized>(
    list: &DisplayList,
    device: &mut D,
    ctm: Affine,
    scissor: Rect,
    cookie: Option<&Cookie>,
) -> ReplayStats {
    let mut stats = ReplayStats::default();
    let mut cursor = NodeCursor::new(list.words());
    let mut clipped = 0_usize;
    let mut tiled = 0_usize;

    if let Some(cookie) = cookie {
        cookie.progress_max.store(list.node_count(), Ordering::Relaxed);
    }
    tracing::debug!(nodes = list.node_count(), "replaying display list");

    loop {
        if cookie.is_some_and(Cookie::is_aborted) {
            stats.aborted = true;
            break;
        }
        let Some(next) = cursor.next_node(list.resources()) else {
            break;
        };
        stats.nodes += 1;
        if let Some(cookie) = cookie {
            cookie.progress.fetch_add(1, Ordering::Relaxed);
        }
        let node = match next {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!(%err, "skipping undecodable node");
                count_error(&mut stats, cookie);
                continue;
            }
        };
        let state = cursor.state();

        let rect = transform_rect(ctm, state.rect());
        let trans_rect = intersect_rect(rect, scissor);
        let empty =
            !(tiled > 0 || node.command.is_structural()) && is_empty_rect(trans_rect);
        if clipped > 0 || empty {
            match node.command.nesting() {
                Nesting::PushClip | Nesting::PushLayer => {
                    clipped += 1;
                    stats.culled += 1;
                    continue;
                }
                Nesting::Pop if clipped > 0 => {
                    clipped -= 1;
                    stats.culled += 1;
                    continue;
                }
                // A pop with nothing culled closes a level the device saw.
                Nesting::Pop => {}
                Nesting::EndMask if clipped == 0 => {}
                Nesting::EndMask | Nesting::Flat => {
                    stats.culled += 1;
                    continue;
                }
            }
        }

        let node_ctm = ctm * affine_from_f32(state.ctm);
        match dispatch(list, device, &node, state, node_ctm, trans_rect, &mut tiled) {
            Ok(flow) => {
                stats.dispatched += 1;
                if matches!(flow, Flow::SkipTile) {
                    let skipped = cursor.skip_tile_contents(list.resources());
                    tracing::trace!(skipped, "tile already cached");
                    stats.nodes += skipped;
                    stats.cached += skipped;
                    if let Some(cookie) = cookie {
                        cookie.progress.fetch_add(skipped, Ordering::Relaxed);
                    }
                }
            }
            Err(DeviceError::Aborted) => {
                tracing::debug!(command = ?node.command, "device aborted replay");
                count_error(&mut stats, cookie);
                stats.aborted = true;
                break;
            }
            Err(err) => {
                tracing::warn!(command = ?node.command, %err, "device operation failed");
                count_error(&mut stats, cookie);
            }
        }
    }

    if stats.aborted
        && let Some(cookie) = cookie
    {
        cookie.incomplete.store(true, Ordering::Relaxed);
    }
    tracing::debug!(
        dispatched = stats.dispatched,
        culled = stats.culled,
        cached = stats.cached,
        errors = stats.errors,
        aborted = stats.aborted,
        "replay finished"
    );
    stats
}

fn count_error(stats: &mut ReplayStats, cookie: Option<&Cookie>) {
    stats.errors += 1;
    if let Some(cookie) = cookie {
        cookie.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Resolve a resource a node refers to.
fn resource<'a, T: ?Sized>(
    list: &'a DisplayList,
    command: Command,
    slot: Option<u32>,
    get: impl FnOnce(&'a Resource) -> Option<&'a T>,
) -> Result<&'a T, DisplayListError> {
    slot.and_then(|slot| list.resource(slot))
        .and_then(get)
        .ok_or(DisplayListError::CorruptNode(command))
}

fn payload_slot(node: &Node) -> Option<u32> {
    match node.payload {
        Payload::Resource(slot) => Some(slot),
        _ => None,
    }
}

fn fill_rule(flags: u32) -> FillRule {
    if flags & FLAG_EVEN_ODD != 0 {
        FillRule::EvenOdd
    } else {
        FillRule::NonZero
    }
}

/// Issue the device call for one node.
fn dispatch<D: Device + ?Sized>(
    list: &DisplayList,
    device: &mut D,
    node: &Node,
    state: &NodeState,
    ctm: Affine,
    trans_rect: Rect,
    tiled: &mut usize,
) -> DeviceResult<Flow> {
    let command = node.command;
    let params = ColorParams::unpack(node.flags);
    let path = || {
        state
            .path
            .clone()
            .and_then(|range| list.words().get(range))
            .map(unpack_path)
            .unwrap_or_default()
    };
    let colorspace = || {
        state
            .colorspace
            .resolve(list.resources())
            .ok_or(DisplayListError::CorruptNode(command))
    };
    let stroke = || resource(list, command, state.stroke, Resource::as_stroke);
    let text = || resource(list, command, payload_slot(node), Resource::as_text);
    let image = || resource(list, command, payload_slot(node), Resource::as_image);
    let color = state.color();
    let alpha = state.alpha;

    match command {
        Command::FillPath => device.fill_path(
            &path(),
            fill_rule(node.flags),
            ctm,
            colorspace()?,
            color,
            alpha,
            params,
        )?,
        Command::StrokePath => {
            device.stroke_path(&path(), stroke()?, ctm, colorspace()?, color, alpha, params)?;
        }
        Command::ClipPath => device.clip_path(&path(), fill_rule(node.flags), ctm, trans_rect)?,
        Command::ClipStrokePath => device.clip_stroke_path(&path(), stroke()?, ctm, trans_rect)?,
        Command::FillText => device.fill_text(text()?, ctm, colorspace()?, color, alpha, params)?,
        Command::StrokeText => {
            device.stroke_text(text()?, stroke()?, ctm, colorspace()?, color, alpha, params)?;
        }
        Command::ClipText => device.clip_text(text()?, ctm, trans_rect)?,
        Command::ClipStrokeText => device.clip_stroke_text(text()?, stroke()?, ctm, trans_rect)?,
        Command::IgnoreText => device.ignore_text(text()?, ctm)?,
        Command::FillShade => {
            let shade = resource(list, command, payload_slot(node), Resource::as_shading)?;
            device.fill_shade(shade, ctm, alpha, params)?;
        }
        Command::FillImage => device.fill_image(image()?, ctm, alpha, params)?,
        Command::FillImageMask => {
            device.fill_image_mask(image()?, ctm, colorspace()?, color, alpha, params)?;
        }
        Command::ClipImageMask => device.clip_image_mask(image()?, ctm, trans_rect)?,
        Command::PopClip => device.pop_clip()?,
        Command::BeginMask => device.begin_mask(
            trans_rect,
            node.flags & FLAG_LUMINOSITY != 0,
            colorspace()?,
            color,
            params,
        )?,
        Command::EndMask => device.end_mask()?,
        Command::BeginGroup => {
            let Payload::Group { colorspace } = node.payload else {
                return Err(DisplayListError::CorruptNode(command).into());
            };
            let colorspace = match colorspace {
                Some(slot) => Some(resource(list, command, Some(slot), Resource::as_color_space)?),
                None => None,
            };
            device.begin_group(
                trans_rect,
                colorspace,
                node.flags & FLAG_ISOLATED != 0,
                node.flags & FLAG_KNOCKOUT != 0,
                blend_from_bits(node.flags),
                alpha,
            )?;
        }
        Command::EndGroup => device.end_group()?,
        Command::BeginTile => {
            let Payload::Tile {
                xstep,
                ystep,
                view,
                id,
            } = node.payload
            else {
                return Err(DisplayListError::CorruptNode(command).into());
            };
            *tiled += 1;
            let status = device.begin_tile(state.rect(), rect_from_f32(view), xstep, ystep, ctm, id)?;
            if status == TileStatus::Cached {
                return Ok(Flow::SkipTile);
            }
        }
        Command::EndTile => {
            *tiled = tiled.saturating_sub(1);
            device.end_tile()?;
        }
        Command::RenderFlags => {
            let Payload::RenderFlags { set, clear } = node.payload else {
                return Err(DisplayListError::CorruptNode(command).into());
            };
            device.render_flags(
                RenderFlags::from_bits_retain(set),
                RenderFlags::from_bits_retain(clear),
            )?;
        }
        Command::DefaultColorSpaces => {
            let defaults = resource(
                list,
                command,
                payload_slot(node),
                Resource::as_default_color_spaces,
            )?;
            device.set_default_colorspaces(defaults)?;
        }
        Command::BeginLayer => {
            let Payload::Layer(range) = &node.payload else {
                return Err(DisplayListError::CorruptNode(command).into());
            };
            let name = list.words().get(range.clone()).map_or("", unpack_str);
            device.begin_layer(name)?;
        }
        Command::EndLayer => device.end_layer()?,
    }
    Ok(Flow::Next)
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use kurbo::{BezPath, Shape};

    use super::*;
    use crate::color::ColorSpace;
    use crate::geom::INFINITE_RECT;
    use crate::recorder::Recorder;
    use crate::resource::StrokeStyle;

    /// Logs command names and fails on request.
    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
        fail_fills: bool,
        abort_after: Option<usize>,
    }

    impl Log {
        fn push(&mut self, call: &str) -> DeviceResult {
            self.calls.push(call.to_string());
            if self.abort_after.is_some_and(|n| self.calls.len() >= n) {
                return Err(DeviceError::Aborted);
            }
            Ok(())
        }
    }

    impl Device for Log {
        fn fill_path(
            &mut self,
            _: &BezPath,
            _: FillRule,
            _: Affine,
            _: &ColorSpace,
            color: &[f32],
            _: f32,
            _: ColorParams,
        ) -> DeviceResult {
            self.push(&alloc::format!("fill {color:?}"))?;
            if self.fail_fills {
                return Err(DeviceError::Failed("no ink".to_string()));
            }
            Ok(())
        }

        fn stroke_path(
            &mut self,
            _: &BezPath,
            stroke: &Arc<StrokeStyle>,
            _: Affine,
            _: &ColorSpace,
            _: &[f32],
            _: f32,
            _: ColorParams,
        ) -> DeviceResult {
            self.push(&alloc::format!("stroke {}", stroke.width))
        }

        fn clip_path(&mut self, _: &BezPath, _: FillRule, _: Affine, _: Rect) -> DeviceResult {
            self.push("clip")
        }

        fn pop_clip(&mut self) -> DeviceResult {
            self.push("pop")
        }

        fn begin_layer(&mut self, name: &str) -> DeviceResult {
            self.push(&alloc::format!("layer {name}"))
        }

        fn end_layer(&mut self) -> DeviceResult {
            self.push("end layer")
        }
    }

    fn square(x: f64, y: f64) -> BezPath {
        Rect::new(x, y, x + 10.0, y + 10.0).to_path(0.1)
    }

    fn gray_fill(rec: &mut Recorder<'_>, path: &BezPath, gray: f32) {
        rec.fill_path(
            path,
            FillRule::NonZero,
            Affine::IDENTITY,
            &ColorSpace::DeviceGray,
            &[gray],
            1.0,
            ColorParams::default(),
        )
        .unwrap();
    }

    fn sample() -> DisplayList {
        let mut list = DisplayList::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let mut rec = Recorder::new(&mut list);
        rec.begin_layer("ink").unwrap();
        gray_fill(&mut rec, &square(0.0, 0.0), 0.25);
        rec.clip_path(&square(100.0, 100.0), FillRule::NonZero, Affine::IDENTITY, INFINITE_RECT)
            .unwrap();
        gray_fill(&mut rec, &square(100.0, 100.0), 0.5);
        rec.pop_clip().unwrap();
        rec.stroke_path(
            &square(0.0, 0.0),
            &Arc::new(StrokeStyle::new(2.0)),
            Affine::IDENTITY,
            &ColorSpace::DeviceGray,
            &[1.0],
            1.0,
            ColorParams::default(),
        )
        .unwrap();
        rec.end_layer().unwrap();
        rec.finish();
        list
    }

    #[test]
    fn full_replay_reproduces_recorded_calls() {
        let list = sample();
        let mut log = Log::default();
        let stats = replay(&list, &mut log, Affine::IDENTITY, INFINITE_RECT, None);
        assert_eq!(
            log.calls,
            [
                "layer ink",
                "fill [0.25]",
                "clip",
                "fill [0.5]",
                "pop",
                "stroke 2",
                "end layer"
            ]
        );
        assert_eq!(stats.dispatched, 7);
        assert_eq!(stats.culled, 0);
        assert!(!stats.aborted);
    }

    #[test]
    fn clips_outside_the_scissor_are_skipped_whole() {
        let list = sample();
        let mut log = Log::default();
        let stats = replay(
            &list,
            &mut log,
            Affine::IDENTITY,
            Rect::new(0.0, 0.0, 50.0, 50.0),
            None,
        );
        assert_eq!(log.calls, ["layer ink", "fill [0.25]", "stroke 2", "end layer"]);
        assert_eq!(stats.culled, 3);
        assert_eq!(stats.nodes, 7);
    }

    #[test]
    fn device_errors_are_counted_and_replay_continues() {
        let list = sample();
        let cookie = Cookie::new();
        let mut log = Log {
            fail_fills: true,
            ..Log::default()
        };
        let stats = replay(&list, &mut log, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
        assert_eq!(stats.errors, 2);
        assert_eq!(cookie.errors(), 2);
        assert_eq!(log.calls.len(), 7);
        assert_eq!(cookie.progress(), 7);
        assert_eq!(cookie.progress_max(), 7);
        assert!(!cookie.is_incomplete());
    }

    #[test]
    fn aborted_device_stops_replay() {
        let list = sample();
        let cookie = Cookie::new();
        let mut log = Log {
            abort_after: Some(2),
            ..Log::default()
        };
        let stats = replay(&list, &mut log, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
        assert!(stats.aborted);
        assert_eq!(log.calls.len(), 2);
        assert!(cookie.is_incomplete());
    }

    #[test]
    fn aborted_cookie_prevents_any_dispatch() {
        let list = sample();
        let cookie = Cookie::new();
        cookie.abort();
        let mut log = Log::default();
        let stats = replay(&list, &mut log, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
        assert!(stats.aborted);
        assert!(log.calls.is_empty());
        assert_eq!(cookie.progress(), 0);
    }

    #[test]
    fn replay_transform_moves_content_into_view() {
        let list = sample();
        let mut log = Log::default();
        // Shift the clipped square onto the origin and look only there.
        let stats = replay(
            &list,
            &mut log,
            Affine::translate((-100.0, -100.0)),
            Rect::new(0.0, 0.0, 10.0, 10.0),
            None,
        );
        assert_eq!(log.calls, ["layer ink", "clip", "fill [0.5]", "pop", "end layer"]);
        assert_eq!(stats.culled, 2);
    }
}
