use canopy_core::diff;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SIZES: &[usize] = &[16, 64, 256, 1024];

fn shuffled(len: usize, seed: u64) -> Vec<u32> {
    let mut items: Vec<u32> = (0..len as u32).collect();
    let mut state = seed;
    for i in (1..items.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        items.swap(i, j);
    }
    items
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    for &len in SIZES {
        let before: Vec<u32> = (0..len as u32).collect();

        let reversed: Vec<u32> = before.iter().rev().copied().collect();
        group.bench_with_input(BenchmarkId::new("reverse", len), &len, |b, _| {
            b.iter(|| diff(black_box(&before), black_box(&reversed), |a, b| a == b))
        });

        let shuffled = shuffled(len, 0x5eed);
        group.bench_with_input(BenchmarkId::new("shuffle", len), &len, |b, _| {
            b.iter(|| diff(black_box(&before), black_box(&shuffled), |a, b| a == b))
        });

        // Every fourth item dropped, a fresh one appended per removal.
        let churn: Vec<u32> = before
            .iter()
            .copied()
            .filter(|item| item % 4 != 0)
            .chain((0..len as u32 / 4).map(|item| item + len as u32))
            .collect();
        group.bench_with_input(BenchmarkId::new("churn", len), &len, |b, _| {
            b.iter(|| diff(black_box(&before), black_box(&churn), |a, b| a == b))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_diff);
criterion_main!(benches);
