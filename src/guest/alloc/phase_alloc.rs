// SPDX-License-Identifier: Apache-2.0

use super::Allocator;
use crate::item::ByteSized;
use crate::status::{VERR_BUFFER_OVERFLOW, VERR_OUT_OF_RANGE};
use crate::Result;

use core::alloc::Layout;

/// Block allocator in stage phase.
///
/// Staging only computes block-relative offsets. Alignment is relative to the beginning of the
/// block, which the physical heap hands out at least 8-byte aligned.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Alloc {
    offset: usize,
}

impl Alloc {
    /// Creates a new allocator with nothing staged.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block length required by everything staged so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    /// Records the end of stage phase and moves into commit phase over `block`,
    /// whose first byte lives at physical address `phys`.
    ///
    /// Fails with [`VERR_BUFFER_OVERFLOW`] if `block` cannot hold everything staged.
    pub fn commit(self, block: &mut [u8], phys: u64) -> Result<Committer<'_>> {
        if block.len() < self.offset {
            return Err(VERR_BUFFER_OVERFLOW);
        }
        let block = &mut block[..self.offset];
        block.fill(0);
        Ok(Committer { block, phys })
    }
}

impl Allocator for Alloc {
    #[inline]
    fn offset(&self) -> usize {
        self.offset
    }

    fn reserve(&mut self, layout: Layout) -> Result<usize> {
        let mask = layout.align() - 1;
        let offset = self
            .offset
            .checked_add(mask)
            .map(|offset| offset & !mask)
            .ok_or(VERR_OUT_OF_RANGE)?;
        self.offset = offset
            .checked_add(layout.size())
            .ok_or(VERR_OUT_OF_RANGE)?;
        Ok(offset)
    }
}

/// Block in commit phase.
#[derive(Debug)]
pub struct Committer<'a> {
    block: &'a mut [u8],
    phys: u64,
}

impl<'a> Committer<'a> {
    /// Physical address of the beginning of the block.
    #[inline]
    pub fn phys(&self) -> u64 {
        self.phys
    }

    #[inline]
    pub(super) fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.block[offset..][..bytes.len()].copy_from_slice(bytes)
    }

    /// Records the end of commit phase and returns the committed block.
    #[inline]
    pub fn into_inner(self) -> &'a mut [u8] {
        self.block
    }
}

/// Block in collection phase.
#[derive(Debug)]
pub struct Collector<'a> {
    block: &'a [u8],
}

impl<'a> Collector<'a> {
    #[inline]
    pub fn new(block: &'a [u8]) -> Self {
        Self { block }
    }

    #[inline]
    pub(super) fn read(&self, offset: usize, len: usize) -> &'a [u8] {
        &self.block[offset..][..len]
    }

    #[inline]
    pub(super) fn read_value<T: ByteSized>(&self, offset: usize) -> T {
        let bytes = self.read(offset, T::SIZE);
        // SAFETY: `bytes` holds exactly `T::SIZE` bytes and `T` is valid for every bit pattern.
        unsafe { (bytes.as_ptr() as *const T).read_unaligned() }
    }
}
