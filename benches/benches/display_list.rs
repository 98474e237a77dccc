// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use kurbo::{Affine, BezPath, Rect, Shape};
use understory_display_list::{
    ColorParams, ColorSpace, Device, DisplayList, FillRule, INFINITE_RECT, Recorder, replay,
};
use understory_display_list_trace::TraceDevice;

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn next_f64(&mut self, upper: f64) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX) * upper
    }
}

/// Discards everything; measures replay overhead alone.
struct Null;

impl Device for Null {}

#[derive(Clone)]
struct Op {
    path: BezPath,
    ctm: Affine,
    gray: f32,
    clipped: bool,
}

/// `n` small squares scattered over a 1024x1024 page. Every eighth square is
/// drawn inside its own clip; colors repeat often so delta encoding matters.
fn scene(n: usize, seed: u64) -> Vec<Op> {
    let mut rng = Lcg::new(seed);
    (0..n)
        .map(|i| {
            let (x, y) = (rng.next_f64(1000.0), rng.next_f64(1000.0));
            Op {
                path: Rect::new(0.0, 0.0, 16.0, 16.0).to_path(0.1),
                ctm: Affine::translate((x, y)),
                gray: [0.0, 0.25, 0.5, 1.0][(rng.next_u32() % 4) as usize],
                clipped: i % 8 == 0,
            }
        })
        .collect()
}

fn draw(dev: &mut impl Device, ops: &[Op]) {
    for op in ops {
        if op.clipped {
            dev.clip_path(&op.path, FillRule::NonZero, op.ctm, INFINITE_RECT)
                .unwrap();
        }
        dev.fill_path(
            &op.path,
            FillRule::NonZero,
            op.ctm,
            &ColorSpace::DeviceGray,
            &[op.gray],
            1.0,
            ColorParams::default(),
        )
        .unwrap();
        if op.clipped {
            dev.pop_clip().unwrap();
        }
    }
}

fn record(ops: &[Op]) -> DisplayList {
    let mut list = DisplayList::new(Rect::new(0.0, 0.0, 1024.0, 1024.0));
    let mut rec = Recorder::new(&mut list);
    draw(&mut rec, ops);
    rec.finish();
    list
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("display_list_record");
    for &n in &[256_usize, 4_096, 65_536] {
        let ops = scene(n, 0xD15B_0000_0000_0001);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &ops, |b, ops| {
            b.iter_batched(
                || DisplayList::new(Rect::new(0.0, 0.0, 1024.0, 1024.0)),
                |mut list| {
                    let mut rec = Recorder::new(&mut list);
                    draw(&mut rec, black_box(ops));
                    rec.finish();
                    list
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("display_list_replay");
    for &n in &[4_096_usize, 65_536] {
        let list = record(&scene(n, 0xD15B_0000_0000_0002));
        group.throughput(Throughput::Elements(list.node_count() as u64));
        for (name, view) in [
            ("full", INFINITE_RECT),
            ("quarter", Rect::new(0.0, 0.0, 512.0, 512.0)),
            ("sliver", Rect::new(0.0, 0.0, 32.0, 32.0)),
        ] {
            group.bench_with_input(BenchmarkId::new(name, n), &list, |b, list| {
                b.iter(|| black_box(replay(list, &mut Null, Affine::IDENTITY, view, None)));
            });
        }
    }
    group.finish();
}

fn bench_replay_trace(c: &mut Criterion) {
    let list = record(&scene(4_096, 0xD15B_0000_0000_0003));
    c.bench_function("display_list_replay_trace(n=4096)", |b| {
        b.iter_batched(
            TraceDevice::new,
            |mut dev| {
                replay(&list, &mut dev, Affine::IDENTITY, INFINITE_RECT, None);
                dev
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_record, bench_replay, bench_replay_trace);
criterion_main!(benches);
