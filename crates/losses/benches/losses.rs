use candle_core::{Device, Tensor, D};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use losses::{cross_entropy, mse_loss, Reduction};

// (batch, classes)
const CE_CASES: &[(usize, usize)] = &[(32, 1000), (128, 1000), (128, 32000)];

fn bench_cross_entropy(c: &mut Criterion) {
    let device = Device::Cpu;
    let mut group = c.benchmark_group("cross_entropy");

    for &(batch, classes) in CE_CASES {
        let logits = Tensor::randn(0f32, 1.0, (batch, classes), &device).unwrap();
        let target_data: Vec<u32> = (0..batch).map(|i| (i % classes) as u32).collect();
        let targets = Tensor::from_vec(target_data, (batch,), &device).unwrap();

        group.throughput(Throughput::Elements((batch * classes) as u64));
        group.bench_function(
            BenchmarkId::from_parameter(format!("{batch}x{classes}")),
            |b| {
                b.iter(|| {
                    let loss = cross_entropy(
                        black_box(&logits),
                        black_box(&targets),
                        None,
                        D::Minus1,
                        0.0,
                        Reduction::Mean,
                    )
                    .unwrap();
                    black_box(loss)
                })
            },
        );
    }

    group.finish();
}

fn bench_mse(c: &mut Criterion) {
    let device = Device::Cpu;
    let mut group = c.benchmark_group("mse");

    for &elements in &[1usize << 12, 1 << 16, 1 << 20] {
        let predictions = Tensor::randn(0f32, 1.0, (elements,), &device).unwrap();
        let targets = Tensor::randn(0f32, 1.0, (elements,), &device).unwrap();

        group.throughput(Throughput::Elements(elements as u64));
        group.bench_function(BenchmarkId::from_parameter(elements), |b| {
            b.iter(|| {
                let loss = mse_loss(
                    black_box(&predictions),
                    black_box(&targets),
                    Reduction::Mean,
                )
                .unwrap();
                black_box(loss)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cross_entropy, bench_mse);
criterion_main!(benches);
