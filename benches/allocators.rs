use criterion::{black_box, criterion_group, criterion_main, Criterion};

use compose_alloc::alloc::{DeallocateAll, RawAllocator, SystemAllocator};
use compose_alloc::allocators::{BumpUpAllocator, PoolAllocator};
use compose_alloc::block::MemoryBlock;
use compose_alloc::block_allocators::block_storage;

fn compare_allocators(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_64");

    group.bench_function("bump_up", |b| {
        let mut storage = block_storage::<65536>();
        let block = MemoryBlock::from_slice(storage.as_uninit_slice());
        let bump = unsafe { BumpUpAllocator::new(block) };
        b.iter(|| match bump.try_allocate(black_box(64), 8) {
            Some(ptr) => {
                black_box(ptr);
            }
            None => bump.deallocate_all(),
        });
    });

    group.bench_function("pool", |b| {
        let mut storage = block_storage::<65536>();
        let block = MemoryBlock::from_slice(storage.as_uninit_slice());
        let pool = unsafe { PoolAllocator::new(64, block) };
        b.iter(|| {
            let ptr = pool.try_allocate(black_box(64), 8).unwrap();
            unsafe { pool.deallocate(black_box(ptr), 64) };
        });
    });

    group.bench_function("system", |b| {
        let system = SystemAllocator;
        b.iter(|| {
            let ptr = system.try_allocate(black_box(64), 8).unwrap();
            unsafe { system.deallocate(black_box(ptr), 64) };
        });
    });

    group.finish();
}

criterion_group!(benches, compare_allocators);
criterion_main!(benches);
