// SPDX-License-Identifier: Apache-2.0

use super::{Allocator, Commit, Committer};
use crate::item::{slice_as_bytes, ByteSized};
use crate::Result;

use core::borrow::Borrow;
use core::marker::PhantomData;

/// Block-relative location of data the host reads.
#[derive(Debug, PartialEq, Eq)]
pub struct InRef<'a, T: ?Sized> {
    offset: usize,

    /// Element count of a slice, `1` otherwise.
    len: usize,

    phantom: PhantomData<&'a mut T>,
}

impl<'a, T: ?Sized> InRef<'a, T> {
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

    #[inline]
    pub(super) fn parts(&self) -> (usize, usize) {
        (self.offset, self.len)
    }
}

impl<T> InRef<'_, [T]> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: ByteSized> InRef<'_, T> {
    #[inline]
    pub fn write(&self, com: &mut Committer<'_>, val: &T) {
        com.write(self.offset, val.as_bytes())
    }
}

impl<T: ByteSized> InRef<'_, [T]> {
    /// Writes `src` starting at element `index`. Elements past the reservation are dropped.
    #[inline]
    pub fn write_at(&self, com: &mut Committer<'_>, index: usize, src: &[T]) {
        let len = self.len.saturating_sub(index).min(src.len());
        com.write(self.offset + index * T::SIZE, slice_as_bytes(&src[..len]))
    }
}

/// A value staged for the host to read, copied into the block on commit.
pub struct Input<'a, T: ?Sized, U> {
    at: InRef<'a, T>,
    val: U,
}

impl<T: ?Sized, U> Input<'_, T, U> {
    /// Byte offset within the block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.at.offset()
    }
}

impl<T, U> Input<'_, [T], U> {
    #[inline]
    pub fn len(&self) -> usize {
        self.at.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.at.is_empty()
    }
}

impl<'a, T: ByteSized, U: Borrow<T>> Input<'a, T, U> {
    #[inline]
    pub fn stage(alloc: &mut impl Allocator, val: U) -> Result<Self> {
        let at = alloc.allocate_input()?;
        Ok(Self { at, val })
    }
}

impl<'a, T: ByteSized, U: AsRef<[T]>> Input<'a, [T], U> {
    #[inline]
    pub fn stage_slice(alloc: &mut impl Allocator, val: U) -> Result<Self> {
        let at = alloc.allocate_input_slice(val.as_ref().len())?;
        Ok(Self { at, val })
    }
}

impl<T: ByteSized, U: Borrow<T>> Commit for Input<'_, T, U> {
    type Item = ();

    #[inline]
    fn commit(self, com: &mut Committer<'_>) {
        self.at.write(com, self.val.borrow())
    }
}

impl<T: ByteSized, U: AsRef<[T]>> Commit for Input<'_, [T], U> {
    type Item = ();

    #[inline]
    fn commit(self, com: &mut Committer<'_>) {
        self.at.write_at(com, 0, self.val.as_ref())
    }
}
