// SPDX-License-Identifier: Apache-2.0

use super::{Allocator, Collect, Collector, CommitPassthrough};
use crate::item::{slice_as_bytes_mut, ByteSized};
use crate::Result;

use core::borrow::BorrowMut;
use core::marker::PhantomData;

/// Block-relative location of data the host writes.
#[derive(Debug, PartialEq, Eq)]
pub struct OutRef<'a, T: ?Sized> {
    offset: usize,

    /// Element count of a slice, `1` otherwise.
    len: usize,

    phantom: PhantomData<&'a T>,
}

impl<'a, T: ?Sized> OutRef<'a, T> {
    #[inline]
    pub(super) fn new(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            phantom: PhantomData,
        }
    }

    /// Byte offset within the block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<T> OutRef<'_, [T]> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: ByteSized> OutRef<'_, T> {
    #[inline]
    pub fn read(&self, col: &Collector<'_>) -> T {
        col.read_value(self.offset)
    }
}

impl<T: ByteSized> OutRef<'_, [T]> {
    /// Fills as much of `dest` as the reservation covers and returns the element count.
    #[inline]
    pub fn copy_to(&self, col: &Collector<'_>, dest: &mut [T]) -> usize {
        let len = dest.len().min(self.len);
        let src = col.read(self.offset, len * T::SIZE);
        slice_as_bytes_mut(&mut dest[..len]).copy_from_slice(src);
        len
    }
}

impl OutRef<'_, [u8]> {
    /// Borrows the reserved bytes straight from the block.
    #[inline]
    pub fn bytes<'b>(&self, col: &Collector<'b>) -> &'b [u8] {
        col.read(self.offset, self.len)
    }
}

/// A destination staged for the host to fill, copied out of the block on collect.
pub struct Output<'a, T: ?Sized, U> {
    at: OutRef<'a, T>,
    val: U,
}

impl<'a, T: ?Sized, U> Output<'a, T, U> {
    #[inline]
    pub(super) fn from_parts(at: OutRef<'a, T>, val: U) -> Self {
        Self { at, val }
    }

    /// Byte offset within the block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.at.offset()
    }
}

impl<T, U> Output<'_, [T], U> {
    #[inline]
    pub fn len(&self) -> usize {
        self.at.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.at.is_empty()
    }
}

impl<'a, T: ByteSized, U: BorrowMut<T>> Output<'a, T, U> {
    #[inline]
    pub fn stage(alloc: &mut impl Allocator, val: U) -> Result<Self> {
        let at = alloc.allocate_output()?;
        Ok(Self { at, val })
    }
}

impl<'a, T: ByteSized, U: AsMut<[T]>> Output<'a, [T], U> {
    #[inline]
    pub fn stage_slice(alloc: &mut impl Allocator, mut val: U) -> Result<Self> {
        let at = alloc.allocate_output_slice(val.as_mut().len())?;
        Ok(Self { at, val })
    }

    /// Collects no more than `len` elements and returns how many were collected.
    #[inline]
    pub fn collect_max(mut self, col: &Collector<'_>, len: usize) -> usize {
        let val = self.val.as_mut();
        let len = len.min(val.len());
        self.at.copy_to(col, &mut val[..len])
    }
}

// Nothing is written on commit, the host fills the reservation.
impl<T: ?Sized, U> CommitPassthrough for Output<'_, T, U> {}

impl<T: ByteSized, U: BorrowMut<T>> Collect for Output<'_, T, U> {
    type Item = ();

    #[inline]
    fn collect(mut self, col: &Collector<'_>) {
        *self.val.borrow_mut() = self.at.read(col)
    }
}

impl<T: ByteSized, U: AsMut<[T]>> Collect for Output<'_, [T], U> {
    type Item = ();

    #[inline]
    fn collect(mut self, col: &Collector<'_>) {
        self.at.copy_to(col, self.val.as_mut());
    }
}
