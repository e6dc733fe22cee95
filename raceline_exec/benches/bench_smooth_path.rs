//! # Smooth Path Benchmark

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use raceline_lib::{
    car::PointMassCar,
    context::RunContext,
    optim::{make_smooth_path, Optimiser},
    path::PathOptions,
    track::{SegmentParams, Track},
};
use track_if::track::{TrackDesc, Turn};

fn smooth_path_benchmark(c: &mut Criterion) {
    // ---- Build a 1000 m oval ----

    let desc = TrackDesc::oval(342.92, 50.0, 12.0, Turn::Left);
    let car = PointMassCar::default();

    c.bench_function("Track::segment", |b| {
        b.iter(|| {
            Track::segment(
                desc.clone(),
                SegmentParams::default(),
                &mut RunContext::new("bench"),
            )
            .unwrap()
        })
    });

    let track = Arc::new(
        Track::segment(desc, SegmentParams::default(), &mut RunContext::new("bench")).unwrap(),
    );

    // ---- Optimisers ----

    c.bench_function("make_smooth_path::clothoid", |b| {
        b.iter(|| {
            make_smooth_path(
                track.clone(),
                &car,
                PathOptions::default(),
                &mut RunContext::new("bench"),
            )
        })
    });

    let spring_options = PathOptions {
        optimiser: Optimiser::Spring,
        ..PathOptions::default()
    };
    c.bench_function("make_smooth_path::spring", |b| {
        b.iter(|| {
            make_smooth_path(
                track.clone(),
                &car,
                spring_options.clone(),
                &mut RunContext::new("bench"),
            )
        })
    });

    // ---- Queries ----

    let path = make_smooth_path(
        track.clone(),
        &car,
        PathOptions::default(),
        &mut RunContext::new("bench"),
    );
    let length_m = track.length_m;

    c.bench_function("Path::get_point_info", |b| {
        let mut pos_m = 0.0;
        b.iter(|| {
            pos_m = (pos_m + 0.37) % length_m;
            path.get_point_info(pos_m)
        })
    });
}

criterion_group!(benches, smooth_path_benchmark);
criterion_main!(benches);
