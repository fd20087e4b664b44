// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use trellis_handle::{GenerationCheck, Handle, HandleManager, RawHandle};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Id(RawHandle);

impl Handle for Id {
    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    fn to_raw(self) -> RawHandle {
        self.0
    }
}

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

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }
}

fn filled(n: usize, check: GenerationCheck) -> (HandleManager<Id, u64>, Vec<Id>) {
    let mut manager = HandleManager::with_generation_check(check);
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let id = manager.create_handle();
        manager
            .associate_object_with_handle(id, i as u64)
            .expect("fresh handles accept an object");
        ids.push(id);
    }
    (manager, ids)
}

fn bench_handles(c: &mut Criterion) {
    let mut group = c.benchmark_group("trellis_handle");
    group.sample_size(50);

    for &n in &[1_024_usize, 65_536] {
        group.bench_function(format!("create_and_associate(n={n})"), |b| {
            b.iter(|| black_box(filled(n, GenerationCheck::Strict)));
        });

        for (label, check) in [
            ("strict", GenerationCheck::Strict),
            ("lenient", GenerationCheck::Lenient),
        ] {
            group.bench_function(format!("random_lookup_{label}(n={n})"), |b| {
                let (manager, ids) = filled(n, check);
                let mut rng = Lcg::new(0x7E11_0000_0000_0001);
                b.iter(|| {
                    let mut sum = 0_u64;
                    for _ in 0..1_024 {
                        let id = ids[rng.gen_range_usize(ids.len())];
                        sum += manager.get_associated_object(id).copied().unwrap_or(0);
                    }
                    black_box(sum)
                });
            });
        }

        // Deletes half the handles in random order, then refills the free list.
        group.bench_function(format!("churn_half(n={n})"), |b| {
            b.iter_batched(
                || filled(n, GenerationCheck::Strict),
                |(mut manager, mut ids)| {
                    let mut rng = Lcg::new(0x7E11_0000_0000_0002);
                    for _ in 0..n / 2 {
                        let i = rng.gen_range_usize(ids.len());
                        let id = ids.swap_remove(i);
                        black_box(manager.delete_handle(id));
                    }
                    for _ in 0..n / 2 {
                        ids.push(manager.create_handle());
                    }
                    black_box((manager, ids));
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handles);
criterion_main!(benches);
