use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use heat_stencil::algs::kernel::{update_parallel, update_serial};
use heat_stencil::prelude::*;

fn params() -> StencilParams<f32> {
    StencilParams::new(0.02, 1e-4, 200).unwrap()
}

// one sweep over a halo-padded block
fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");
    let k = params();
    for &n in &[64usize, 256, 1024] {
        let e = Extent::new(n, n);
        let field = GlobalField::<f32>::ramp(n + 2, n + 2).unwrap();
        let mut buffers = DoubleBuffer::new(e);
        buffers.seed(field.values()).unwrap();

        group.bench_with_input(BenchmarkId::new("serial", n), &n, |b, _| {
            b.iter(|| {
                buffers.swap();
                let (prev, cur) = buffers.split();
                update_serial(prev, cur, e, &k).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, _| {
            b.iter(|| {
                buffers.swap();
                let (prev, cur) = buffers.split();
                update_parallel(prev, cur, e, &k).unwrap()
            })
        });
    }
    group.finish();
}

// fixed step count so every variant does the same work
fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("variants");
    group.sample_size(10);
    let k = params();
    let init = GlobalField::<f32>::ramp(130, 130).unwrap();

    group.bench_function("sequential", |b| {
        b.iter(|| solve_sequential(init.clone(), &k).unwrap())
    });
    group.bench_function("shared/4", |b| {
        b.iter(|| solve_shared(init.clone(), &k, 4).unwrap())
    });
    for &ranks in &[1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("hybrid", ranks), &ranks, |b, &ranks| {
            b.iter(|| solve_hybrid_local(init.clone(), &k, ranks, 2).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernel, bench_variants);
criterion_main!(benches);
