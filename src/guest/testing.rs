// SPDX-License-Identifier: Apache-2.0

//! Test doubles for the guest side.

use super::PhysHeap;
use crate::PAGE_SIZE;

use core::cell::Cell;
use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, dealloc, Layout};

const PHYS_BASE: u64 = 0x8000_0000;

/// A bump heap over page-aligned memory, backed by consecutive physical pages.
pub(crate) struct TestHeap {
    arena: NonNull<u8>,
    pages: usize,
    next: Cell<usize>,
    live: Cell<usize>,
    fail: Cell<bool>,
}

impl TestHeap {
    pub(crate) fn new(pages: usize) -> Self {
        let layout = Self::layout(pages);
        let arena = NonNull::new(unsafe { alloc_zeroed(layout) }).unwrap();
        Self {
            arena,
            pages,
            next: Cell::new(0),
            live: Cell::new(0),
            fail: Cell::new(false),
        }
    }

    fn layout(pages: usize) -> Layout {
        Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).unwrap()
    }

    /// Physical address of arena page `i`.
    pub(crate) fn page_phys(&self, i: usize) -> u64 {
        PHYS_BASE + (i * PAGE_SIZE) as u64
    }

    /// Makes every following allocation fail.
    pub(crate) fn exhaust(&self) {
        self.fail.set(true);
    }

    /// Number of allocations not yet freed.
    pub(crate) fn live(&self) -> usize {
        self.live.get()
    }
}

unsafe impl PhysHeap for TestHeap {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let offset = (self.next.get() + 7) & !7;
        if self.fail.get() || offset + size > self.pages * PAGE_SIZE {
            return None;
        }
        self.next.set(offset + size);
        self.live.set(self.live.get() + 1);
        NonNull::new(unsafe { self.arena.as_ptr().add(offset) })
    }

    unsafe fn free(&self, _: NonNull<u8>, _: usize) {
        self.live.set(self.live.get() - 1);
    }

    fn physical_address_of(&self, ptr: NonNull<u8>) -> u64 {
        let offset = ptr.as_ptr() as usize - self.arena.as_ptr() as usize;
        self.page_phys(offset / PAGE_SIZE) + (offset % PAGE_SIZE) as u64
    }
}

impl Drop for TestHeap {
    fn drop(&mut self) {
        unsafe { dealloc(self.arena.as_ptr(), Self::layout(self.pages)) }
    }
}
