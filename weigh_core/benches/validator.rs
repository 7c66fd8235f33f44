use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use weigh_core::{StabilityTracker, validate};
use weigh_traits::protocol::frame_payload;

// A noisy stream: mostly valid frames with a sprinkling of short and bad ones.
fn synth_stream(n: usize, seed: u32) -> Vec<Vec<u8>> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    (0..n)
        .map(|_| match next() % 10 {
            0 => vec![0x01, 0x02, 0x53],
            1 => frame_payload("--.--"),
            r => frame_payload(&format!("{}.{}", 40 + r, next() % 10)),
        })
        .collect()
}

fn bench_validate(c: &mut Criterion) {
    let frames = synth_stream(1024, 7);
    c.bench_function("validate_1024_frames", |b| {
        b.iter(|| {
            for f in &frames {
                let _ = black_box(validate(black_box(f)));
            }
        })
    });
}

fn bench_validate_and_track(c: &mut Criterion) {
    let frames = synth_stream(1024, 11);
    c.bench_function("validate_and_track_1024_frames", |b| {
        b.iter_batched(
            StabilityTracker::default,
            |mut tracker| {
                for f in &frames {
                    if let Ok(r) = validate(f) {
                        black_box(tracker.observe(r.weight));
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_validate, bench_validate_and_track);
criterion_main!(benches);
