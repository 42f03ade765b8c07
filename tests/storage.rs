use core::cell::Cell;
use core::mem;
use core::ptr::NonNull;
use std::rc::Rc;

use compose_alloc::alloc::{RawAllocator, SystemAllocator};
use compose_alloc::allocators::{AnyAllocatorRef, BumpUpAllocator, PoolAllocator};
use compose_alloc::block::MemoryBlock;
use compose_alloc::block_allocators::block_storage;
use compose_alloc::deleter::{AllocatorDeleter, Deleter, PolymorphicDeleter, SliceDeleter};
use compose_alloc::storage::{
    AllocatorStorage, ReferencedAllocatorStorage, SharedAllocatorStorage,
    StatelessAllocatorStorage,
};

struct Probe {
    drops: Rc<Cell<usize>>,
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

fn place<T>(alloc: &impl RawAllocator, value: T) -> NonNull<T> {
    let ptr = alloc
        .try_allocate(mem::size_of::<T>(), mem::align_of::<T>())
        .unwrap()
        .cast::<T>();
    unsafe { ptr.as_ptr().write(value) };
    ptr
}

#[test]
fn deleter_runs_drop_and_returns_memory() {
    let drops = Rc::new(Cell::new(0));
    let storage = StatelessAllocatorStorage::<SystemAllocator>::new();

    let ptr = place(storage.allocator(), Probe { drops: drops.clone() });
    let deleter = AllocatorDeleter::<Probe, _>::new(storage);
    unsafe { deleter.delete(ptr) };
    assert_eq!(drops.get(), 1);
}

#[test]
fn slice_deleter_drops_every_element() {
    let drops = Rc::new(Cell::new(0));
    let storage = StatelessAllocatorStorage::<SystemAllocator>::new();

    let len = 3;
    let bytes = mem::size_of::<Probe>() * len;
    let first = storage
        .allocator()
        .try_allocate(bytes, mem::align_of::<Probe>())
        .unwrap()
        .cast::<Probe>();
    for i in 0..len {
        unsafe {
            first.as_ptr().add(i).write(Probe { drops: drops.clone() });
        }
    }

    let deleter = SliceDeleter::<Probe, _>::new(storage, len);
    assert_eq!(deleter.len(), 3);
    unsafe { deleter.delete(first) };
    assert_eq!(drops.get(), 3);
}

trait Notch {
    fn value(&self) -> u64;
}

struct Widget {
    value: u64,
    drops: Rc<Cell<usize>>,
}

impl Notch for Widget {
    fn value(&self) -> u64 {
        self.value
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[test]
fn polymorphic_deleter_deletes_through_a_trait_object() {
    let drops = Rc::new(Cell::new(0));
    let storage = StatelessAllocatorStorage::<SystemAllocator>::new();

    let concrete = place(
        storage.allocator(),
        Widget {
            value: 7,
            drops: drops.clone(),
        },
    );
    let deleter = PolymorphicDeleter::<Widget, _>::new(storage, mem::size_of::<Widget>());
    let erased = deleter.retarget::<dyn Notch>();
    assert_eq!(erased.size(), mem::size_of::<Widget>());

    let object: NonNull<dyn Notch> = concrete;
    assert_eq!(unsafe { object.as_ref().value() }, 7);
    unsafe { erased.delete(object) };
    assert_eq!(drops.get(), 1);
}

#[test]
fn referenced_storage_compares_by_identity() {
    let mut storage = block_storage::<512>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let pool = unsafe { PoolAllocator::new(64, block) };

    let s1 = ReferencedAllocatorStorage::new(&pool);
    let s2 = s1;
    assert_eq!(s1, s2);

    let ptr = s1.allocator().try_allocate(32, 8).unwrap();
    unsafe { s2.allocator().deallocate(ptr, 32) };
}

#[test]
fn shared_storage_clones_share_one_allocator() {
    let drops = Rc::new(Cell::new(0));
    let shared = SharedAllocatorStorage::new(SystemAllocator);
    let other = shared.clone();
    assert_eq!(shared, other);
    assert_ne!(shared, SharedAllocatorStorage::new(SystemAllocator));

    let ptr = place(shared.allocator(), Probe { drops: drops.clone() });
    let deleter = AllocatorDeleter::<Probe, _>::new(other);
    unsafe { deleter.delete(ptr) };
    assert_eq!(drops.get(), 1);
}

#[test]
fn stateless_storages_are_always_equal() {
    let a = StatelessAllocatorStorage::<SystemAllocator>::new();
    let b = StatelessAllocatorStorage::<SystemAllocator>::new();
    assert_eq!(a, b);
}

#[test]
fn erased_allocator_reference_forwards_calls() {
    let mut storage = block_storage::<256>();
    let block = MemoryBlock::from_slice(storage.as_uninit_slice());
    let bump = unsafe { BumpUpAllocator::new(block) };

    let erased = AnyAllocatorRef::new(&bump);
    assert_eq!(erased, AnyAllocatorRef::new(&bump));
    assert_eq!(erased.info().name(), "bump-up");

    let ptr = erased.try_allocate(32, 16).unwrap();
    assert_eq!(ptr.as_ptr() as usize % 16, 0);
    unsafe { erased.deallocate(ptr, 32) };

    let mut other_storage = block_storage::<256>();
    let other_block = MemoryBlock::from_slice(other_storage.as_uninit_slice());
    let other = unsafe { BumpUpAllocator::new(other_block) };
    assert_ne!(erased, AnyAllocatorRef::new(&other));
}

#[cfg(feature = "allocator-api2")]
mod standard {
    use super::*;
    use allocator_api2::alloc::Allocator;
    use core::alloc::Layout;

    use compose_alloc::standard::StandardAllocator;

    #[test]
    fn standard_adapter_serves_layout_requests() {
        let standard =
            StandardAllocator::new(StatelessAllocatorStorage::<SystemAllocator>::new());

        let layout = Layout::array::<u64>(8).unwrap();
        let slice = standard.allocate(layout).unwrap();
        assert!(slice.len() >= layout.size());
        unsafe {
            slice.cast::<u64>().as_ptr().write(0xDEAD_BEEF);
            standard.deallocate(slice.cast(), layout);
        }

        let zero = Layout::new::<()>();
        let empty = standard.allocate(zero).unwrap();
        assert_eq!(empty.len(), 0);
    }
}
