use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array3;

use tomoslice::{process, remove_rings, BackendRegistry, ProcessConfig};

fn ramp_stack(angles: usize, rows: usize, cols: usize) -> Array3<f32> {
    let mut stack = Array3::zeros((angles, rows, cols));
    for (i, v) in stack.iter_mut().enumerate() {
        *v = (i % 251) as f32;
    }
    stack
}

fn bench_ring_filter(c: &mut Criterion) {
    let stack = ramp_stack(180, 4, 256);
    c.bench_function("ring_filter_level2", |b| {
        b.iter(|| remove_rings(black_box(&stack.view()), 2.0))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let stack = ramp_stack(90, 4, 128);
    let registry = BackendRegistry::with_known_backends();
    let config = ProcessConfig::default();
    c.bench_function("process_90x4x128", |b| {
        b.iter(|| process(black_box(&stack.view()), &config, &registry).unwrap())
    });
}

criterion_group!(benches, bench_ring_filter, bench_full_pipeline);
criterion_main!(benches);
