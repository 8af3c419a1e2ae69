// SPDX-License-Identifier: Apache-2.0

use super::PhysRange;
use crate::item::shfl::{string_len, ShflStr};
use crate::status::VERR_NO_MEMORY;
use crate::Result;

use core::fmt;
use core::ptr::NonNull;

/// Heap of host-visible, physically backed memory.
///
/// # Safety
///
/// Allocations must be physically contiguous, at least 8-byte aligned, valid for reads and
/// writes of `size` bytes and stay valid until freed.
pub unsafe trait PhysHeap {
    /// Allocates `size` bytes, returning `None` if the heap is exhausted.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Returns an allocation to the heap.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`PhysHeap::allocate`] on this heap for `size` bytes
    /// and must not be used afterwards.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize);

    /// Returns the physical address of `ptr`, which must point into a live allocation.
    fn physical_address_of(&self, ptr: NonNull<u8>) -> u64;
}

/// A scoped allocation from a [`PhysHeap`], freed on drop.
pub struct PhysBuf<'h, H: PhysHeap + ?Sized> {
    heap: &'h H,
    ptr: NonNull<u8>,
    len: usize,
}

impl<H: PhysHeap + ?Sized> fmt::Debug for PhysBuf<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysBuf")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<'h, H: PhysHeap + ?Sized> PhysBuf<'h, H> {
    /// Allocates `len` zeroed bytes from `heap`.
    pub fn new(heap: &'h H, len: usize) -> Result<Self> {
        let ptr = heap.allocate(len.max(1)).ok_or(VERR_NO_MEMORY)?;
        // SAFETY: the heap handed out at least `len` writable bytes.
        unsafe { ptr.as_ptr().write_bytes(0, len) };
        Ok(Self { heap, ptr, len })
    }

    /// Allocates a copy of `bytes` from `heap`.
    pub fn from_bytes(heap: &'h H, bytes: &[u8]) -> Result<Self> {
        let mut buf = Self::new(heap, bytes.len())?;
        buf.as_mut_slice().copy_from_slice(bytes);
        Ok(buf)
    }

    /// Allocates an encoded shared folder string holding `s` from `heap`.
    pub fn string(heap: &'h H, s: &[u8]) -> Result<Self> {
        let mut buf = Self::new(heap, string_len(s.len()))?;
        ShflStr::encode(buf.as_mut_slice(), s)?;
        Ok(buf)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the allocation is live and initialized for `len` bytes.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: the allocation is live, initialized and exclusively borrowed.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Interprets the buffer as an encoded shared folder string.
    #[inline]
    pub fn as_shfl_str(&self) -> Result<ShflStr<'_>> {
        ShflStr::from_bytes(self.as_slice())
    }

    /// Physical address of the first byte of the buffer.
    #[inline]
    pub fn phys_addr(&self) -> u64 {
        self.heap.physical_address_of(self.ptr)
    }

    /// Physical address of the byte at `offset`, if within the buffer.
    pub fn phys_addr_at(&self, offset: usize) -> Option<u64> {
        if offset >= self.len {
            return None;
        }
        // SAFETY: `offset` is within the allocation.
        let ptr = unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) };
        Some(self.heap.physical_address_of(ptr))
    }

    /// Translates the buffer into its page-aligned physical base, offset and length.
    #[inline]
    pub fn phys_range(&self) -> Result<PhysRange> {
        PhysRange::new(self.phys_addr(), self.len)
    }

    /// Borrows the buffer along with its physical address.
    #[inline]
    pub fn phys(&self) -> Phys<'_> {
        Phys::new(self.as_slice(), self.phys_addr())
    }

    /// Mutably borrows the buffer along with its physical address.
    #[inline]
    pub fn phys_mut(&mut self) -> PhysMut<'_> {
        let phys = self.phys_addr();
        PhysMut::new(self.as_mut_slice(), phys)
    }
}

impl<H: PhysHeap + ?Sized> Drop for PhysBuf<'_, H> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `heap` for `len.max(1)` bytes and is not used afterwards.
        unsafe { self.heap.free(self.ptr, self.len.max(1)) }
    }
}

/// Physically contiguous memory the host may read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phys<'a> {
    bytes: &'a [u8],
    phys: u64,
}

impl<'a> Phys<'a> {
    /// Pairs `bytes` with the physical address of its first byte.
    ///
    /// The bytes must be physically contiguous.
    #[inline]
    pub fn new(bytes: &'a [u8], phys: u64) -> Self {
        Self { bytes, phys }
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub fn phys_addr(&self) -> u64 {
        self.phys
    }

    #[inline]
    pub fn range(&self) -> Result<PhysRange> {
        PhysRange::new(self.phys, self.bytes.len())
    }
}

/// Physically contiguous memory the host may read and write.
#[derive(Debug, PartialEq, Eq)]
pub struct PhysMut<'a> {
    bytes: &'a mut [u8],
    phys: u64,
}

impl<'a> PhysMut<'a> {
    /// Pairs `bytes` with the physical address of its first byte.
    ///
    /// The bytes must be physically contiguous.
    #[inline]
    pub fn new(bytes: &'a mut [u8], phys: u64) -> Self {
        Self { bytes, phys }
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &*self.bytes
    }

    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> &'a mut [u8] {
        self.bytes
    }

    #[inline]
    pub fn phys_addr(&self) -> u64 {
        self.phys
    }

    #[inline]
    pub fn range(&self) -> Result<PhysRange> {
        PhysRange::new(self.phys, self.bytes.len())
    }
}
