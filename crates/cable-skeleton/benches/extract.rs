use cable_core::Mask;
use cable_skeleton::{EndpointConfig, ExtractConfig, extract_paths, find_ends};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// Sinusoidal 1-pixel cable broken into several fragments.
fn synthetic_skeleton(width: usize, height: usize) -> Mask {
    let mut mask = Mask::new_fill(width, height, false);
    let mid = height as f32 / 2.0;
    let amp = height as f32 / 4.0;

    let mut prev_y = None;
    for x in 16..width.saturating_sub(16) {
        if x % 160 < 6 {
            prev_y = None;
            continue;
        }
        let y = (mid + amp * (x as f32 / 90.0).sin()).round() as isize;
        let from = prev_y.unwrap_or(y);
        for yy in from.min(y)..=from.max(y) {
            mask.set(x as isize, yy, true);
        }
        prev_y = Some(y);
    }

    mask
}

fn bench_extract(c: &mut Criterion) {
    let mask = synthetic_skeleton(1280, 720);

    c.bench_function("cable_skeleton_find_ends_720p", |b| {
        b.iter(|| {
            let scan = find_ends(black_box(&mask.as_view()), &EndpointConfig::default());
            black_box(scan.endpoints.len());
        });
    });

    c.bench_function("cable_skeleton_extract_paths_720p", |b| {
        b.iter(|| {
            let out = extract_paths(black_box(&mask.as_view()), None, &ExtractConfig::default())
                .expect("no foreground mask");
            black_box(out.paths.len());
        });
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
