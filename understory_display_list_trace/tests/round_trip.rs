// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replaying a recording hands a device the same calls as drawing directly.
//!
//! Every drawing operation is driven once straight into a [`TraceDevice`] and
//! once through a [`Recorder`] and [`replay`]; the traces must agree on order,
//! geometry, transforms, colors and alphas.

use std::sync::Arc;

use kurbo::{Affine, BezPath, Cap, Join, Rect, Shape};
use peniko::Brush;
use understory_display_list::{
    BlendMode, ColorParams, ColorSpace, DefaultColorSpaces, Device, DeviceResult, DisplayList,
    FillRule, Glyph, INFINITE_RECT, Image, ImageAlphaType, ImageDesc, ImageFormat, Recorder,
    RenderFlags, RenderingIntent, Shading, StrokeStyle, TextRun, replay,
};
use understory_display_list_trace::{Call, TraceDevice};

struct Scene {
    square: BezPath,
    triangle: BezPath,
    stroke: Arc<StrokeStyle>,
    lab: ColorSpace,
    text: Arc<TextRun>,
    shade: Arc<Shading>,
    image: Arc<Image>,
    defaults: Arc<DefaultColorSpaces>,
}

impl Scene {
    fn new() -> Self {
        let mut triangle = BezPath::new();
        triangle.move_to((0.0, 0.0));
        triangle.line_to((8.0, 0.0));
        triangle.quad_to((8.0, 4.0), (4.0, 8.0));
        triangle.curve_to((3.0, 8.0), (1.0, 6.0), (0.0, 0.5));
        triangle.close_path();
        Self {
            square: Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1),
            triangle,
            stroke: Arc::new(
                StrokeStyle::new(2.0)
                    .with_join(Join::Bevel)
                    .with_caps(Cap::Butt),
            ),
            lab: ColorSpace::custom("Lab", 3),
            text: Arc::new(TextRun {
                font: 1,
                size: 12.0,
                glyphs: vec![
                    Glyph {
                        id: 36,
                        x: 0.0,
                        y: 0.0,
                    },
                    Glyph {
                        id: 37,
                        x: 7.5,
                        y: 0.0,
                    },
                ]
                .into_boxed_slice(),
                bounds: Rect::new(0.0, -10.0, 16.0, 2.0),
            }),
            shade: Arc::new(Shading {
                brush: Brush::default(),
                bounds: Rect::new(0.0, 0.0, 40.0, 40.0),
            }),
            image: Arc::new(Image {
                desc: ImageDesc {
                    width: 2,
                    height: 2,
                    format: ImageFormat::Rgba8,
                    alpha_type: ImageAlphaType::Alpha,
                },
                pixels: Arc::from([255_u8; 16].as_slice()),
            }),
            defaults: Arc::new(DefaultColorSpaces::default()),
        }
    }

    fn fill(&self, dev: &mut impl Device, ctm: Affine, gray: f32) -> DeviceResult {
        dev.fill_path(
            &self.square,
            FillRule::NonZero,
            ctm,
            &ColorSpace::DeviceGray,
            &[gray],
            1.0,
            ColorParams::default(),
        )
    }

    /// Exercise every device operation once.
    fn draw(&self, dev: &mut impl Device) -> DeviceResult {
        let params = ColorParams::default();
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);

        dev.begin_layer("background")?;
        dev.set_default_colorspaces(&self.defaults)?;
        dev.render_flags(RenderFlags::NO_ANTIALIAS, RenderFlags::empty())?;
        dev.fill_path(
            &self.square,
            FillRule::NonZero,
            Affine::IDENTITY,
            &ColorSpace::DeviceRgb,
            &[1.0, 0.0, 0.0],
            1.0,
            params,
        )?;
        dev.fill_path(
            &self.square,
            FillRule::EvenOdd,
            Affine::translate((10.0, 0.0)),
            &ColorSpace::DeviceRgb,
            &[0.25, 0.5, 0.75],
            0.5,
            params,
        )?;
        dev.stroke_path(
            &self.triangle,
            &self.stroke,
            Affine::scale(2.0),
            &ColorSpace::DeviceCmyk,
            &[0.0, 0.0, 0.0, 1.0],
            0.75,
            params,
        )?;
        dev.end_layer()?;

        dev.clip_path(
            &self.square,
            FillRule::NonZero,
            Affine::translate((5.0, 5.0)),
            INFINITE_RECT,
        )?;
        dev.fill_text(
            &self.text,
            Affine::translate((5.0, 15.0)),
            &self.lab,
            &[50.0, 10.0, -10.0],
            1.0,
            ColorParams {
                intent: RenderingIntent::Perceptual,
                overprint: true,
                ..params
            },
        )?;
        dev.ignore_text(&self.text, Affine::translate((5.0, 15.0)))?;
        dev.stroke_text(
            &self.text,
            &self.stroke,
            Affine::translate((5.0, 30.0)),
            &self.lab,
            &[50.0, 10.0, -10.0],
            1.0,
            params,
        )?;
        dev.pop_clip()?;

        dev.begin_group(area, Some(&self.lab), true, false, BlendMode::Multiply, 0.5)?;
        dev.fill_shade(&self.shade, Affine::translate((20.0, 20.0)), 1.0, params)?;
        dev.end_group()?;

        dev.begin_mask(area, true, &ColorSpace::DeviceGray, &[0.0], params)?;
        dev.fill_image(&self.image, Affine::scale(20.0), 1.0, params)?;
        dev.end_mask()?;
        dev.fill_image_mask(
            &self.image,
            Affine::translate((30.0, 30.0)) * Affine::scale(10.0),
            &ColorSpace::DeviceGray,
            &[1.0],
            1.0,
            params,
        )?;
        dev.pop_clip()?;

        dev.clip_stroke_path(&self.triangle, &self.stroke, Affine::IDENTITY, INFINITE_RECT)?;
        self.fill(dev, Affine::IDENTITY, 0.5)?;
        dev.pop_clip()?;
        dev.clip_text(&self.text, Affine::translate((0.0, 10.0)), INFINITE_RECT)?;
        self.fill(dev, Affine::IDENTITY, 0.5)?;
        dev.pop_clip()?;
        dev.clip_stroke_text(
            &self.text,
            &self.stroke,
            Affine::translate((0.0, 10.0)),
            INFINITE_RECT,
        )?;
        self.fill(dev, Affine::IDENTITY, 0.5)?;
        dev.pop_clip()?;
        dev.clip_image_mask(&self.image, Affine::scale(50.0), INFINITE_RECT)?;
        self.fill(dev, Affine::IDENTITY, 0.5)?;
        dev.pop_clip()?;

        dev.begin_tile(
            area,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            10.0,
            10.0,
            Affine::scale(0.5),
            0,
        )?;
        self.fill(dev, Affine::IDENTITY, 0.0)?;
        dev.end_tile()?;
        Ok(())
    }
}

fn record(scene: &Scene) -> DisplayList {
    let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut rec = Recorder::new(&mut list);
    scene.draw(&mut rec).unwrap();
    rec.finish();
    list
}

#[test]
fn replay_matches_direct_drawing() {
    let scene = Scene::new();
    let mut direct = TraceDevice::new();
    scene.draw(&mut direct).unwrap();

    let list = record(&scene);
    let mut replayed = TraceDevice::new();
    let stats = replay(&list, &mut replayed, Affine::IDENTITY, INFINITE_RECT, None);

    let expected: Vec<&Call> = direct.calls().collect();
    let actual: Vec<&Call> = replayed.calls().collect();
    assert_eq!(actual, expected);
    assert_eq!(stats.dispatched, list.node_count());
    assert_eq!(stats.culled, 0);
    assert_eq!(stats.errors, 0);
    assert_eq!(replayed.depth(), 0);
    assert_eq!(replayed.underflows(), 0);
}

#[test]
fn recorded_commands_follow_call_order() {
    let scene = Scene::new();
    let list = record(&scene);
    let mut direct = TraceDevice::new();
    scene.draw(&mut direct).unwrap();
    assert_eq!(list.commands().count(), direct.events().len());
    assert_eq!(list.node_count(), direct.events().len());
}

#[test]
fn replay_applies_the_base_transform() {
    let scene = Scene::new();
    let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut rec = Recorder::new(&mut list);
    scene.fill(&mut rec, Affine::translate((1.0, 2.0)), 0.5).unwrap();
    rec.finish();

    let mut dev = TraceDevice::new();
    let base = Affine::scale(2.0);
    replay(&list, &mut dev, base, INFINITE_RECT, None);
    let calls: Vec<&Call> = dev.calls().collect();
    let [Call::FillPath { ctm, color, .. }] = calls.as_slice() else {
        panic!("expected a single fill, got {:?}", dev.events());
    };
    assert_eq!(*ctm, base * Affine::translate((1.0, 2.0)));
    assert_eq!(color.as_slice(), &[0.5]);
}

#[test]
fn clip_scissor_is_the_visible_part_of_its_bounds() {
    let scene = Scene::new();
    let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut rec = Recorder::new(&mut list);
    rec.clip_path(
        &Rect::new(0.0, 0.0, 100.0, 100.0).to_path(0.1),
        FillRule::NonZero,
        Affine::IDENTITY,
        INFINITE_RECT,
    )
    .unwrap();
    scene.fill(&mut rec, Affine::translate((20.0, 20.0)), 0.0).unwrap();
    rec.pop_clip().unwrap();
    rec.finish();

    let mut dev = TraceDevice::new();
    replay(
        &list,
        &mut dev,
        Affine::IDENTITY,
        Rect::new(25.0, 0.0, 100.0, 100.0),
        None,
    );
    // The clip shrank to its content, then the scissor cut it further.
    assert_eq!(dev.events()[0].bounds, Some(Rect::new(25.0, 20.0, 30.0, 30.0)));
}

#[test]
fn hairlines_inside_a_clip_survive_replay() {
    let mut rule = BezPath::new();
    rule.move_to((10.0, 50.0));
    rule.line_to((90.0, 50.0));
    let hairline = Arc::new(StrokeStyle::new(0.0));
    let draw = |dev: &mut dyn Device| -> DeviceResult {
        dev.clip_path(
            &Rect::new(0.0, 0.0, 100.0, 100.0).to_path(0.1),
            FillRule::NonZero,
            Affine::IDENTITY,
            INFINITE_RECT,
        )?;
        dev.stroke_path(
            &rule,
            &hairline,
            Affine::IDENTITY,
            &ColorSpace::DeviceGray,
            &[0.0],
            1.0,
            ColorParams::default(),
        )?;
        dev.pop_clip()
    };

    let mut direct = TraceDevice::new();
    draw(&mut direct).unwrap();
    let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut rec = Recorder::new(&mut list);
    draw(&mut rec).unwrap();
    rec.finish();

    let mut replayed = TraceDevice::new();
    let stats = replay(&list, &mut replayed, Affine::IDENTITY, INFINITE_RECT, None);
    let expected: Vec<&Call> = direct.calls().collect();
    let actual: Vec<&Call> = replayed.calls().collect();
    assert_eq!(actual, expected);
    assert_eq!(stats.culled, 0);
    assert_eq!(stats.dispatched, 3);
}
