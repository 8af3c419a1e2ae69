// SPDX-License-Identifier: Apache-2.0

use super::{Allocator, Commit, Committer, InRef, OutRef, Output};
use crate::item::ByteSized;
use crate::Result;

use core::borrow::BorrowMut;
use core::ops::Deref;

/// Block-relative location of data the host reads and then overwrites.
#[derive(Debug, PartialEq, Eq)]
pub struct InOutRef<'a, T: ?Sized>(InRef<'a, T>);

impl<'a, T: ?Sized> InOutRef<'a, T> {
    #[inline]
    pub(super) fn new(offset: usize, len: usize) -> Self {
        Self(InRef::new(offset, len))
    }
}

impl<'a, T: ?Sized> From<InOutRef<'a, T>> for OutRef<'a, T> {
    #[inline]
    fn from(at: InOutRef<'a, T>) -> Self {
        let (offset, len) = at.0.parts();
        OutRef::new(offset, len)
    }
}

impl<'a, T: ?Sized> Deref for InOutRef<'a, T> {
    type Target = InRef<'a, T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A value the host reads and updates in place. Commits into an [`Output`].
pub struct InOut<'a, T: ?Sized, U> {
    at: InOutRef<'a, T>,
    val: U,
}

impl<T: ?Sized, U> InOut<'_, T, U> {
    /// Byte offset within the block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.at.offset()
    }
}

impl<T, U> InOut<'_, [T], U> {
    #[inline]
    pub fn len(&self) -> usize {
        self.at.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.at.is_empty()
    }
}

impl<'a, T: ByteSized, U: BorrowMut<T>> InOut<'a, T, U> {
    #[inline]
    pub fn stage(alloc: &mut impl Allocator, val: U) -> Result<Self> {
        let at = alloc.allocate_inout()?;
        Ok(Self { at, val })
    }
}

impl<'a, T: ByteSized, U: AsMut<[T]>> InOut<'a, [T], U> {
    #[inline]
    pub fn stage_slice(alloc: &mut impl Allocator, mut val: U) -> Result<Self> {
        let at = alloc.allocate_inout_slice(val.as_mut().len())?;
        Ok(Self { at, val })
    }
}

impl<'a, T: ByteSized, U: BorrowMut<T>> Commit for InOut<'a, T, U> {
    type Item = Output<'a, T, U>;

    #[inline]
    fn commit(mut self, com: &mut Committer<'_>) -> Self::Item {
        self.at.write(com, self.val.borrow_mut());
        Output::from_parts(self.at.into(), self.val)
    }
}

impl<'a, T: ByteSized, U: AsMut<[T]>> Commit for InOut<'a, [T], U> {
    type Item = Output<'a, [T], U>;

    #[inline]
    fn commit(mut self, com: &mut Committer<'_>) -> Self::Item {
        self.at.write_at(com, 0, self.val.as_mut());
        Output::from_parts(self.at.into(), self.val)
    }
}
