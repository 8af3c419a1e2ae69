// SPDX-License-Identifier: Apache-2.0

//! Block layout and the stage, commit and collect phases.
//!
//! Requests are laid out in three phases. In the stage phase an [`Allocator`] hands out
//! block-relative references without touching memory, which yields the exact block length.
//! In the commit phase a [`Committer`] writes staged values into the acquired block, and in
//! the collect phase a [`Collector`] reads outputs back once the host has processed the block.


mod inout;
mod input;
mod output;
mod phase_alloc;

pub use inout::*;
pub use input::*;
pub use output::*;
pub use phase_alloc::*;

use crate::item::ByteSized;
use crate::status::VERR_OUT_OF_RANGE;
use crate::Result;

use core::alloc::Layout;

#[inline]
fn array_layout<T>(len: usize) -> Result<Layout> {
    Layout::array::<T>(len).map_err(|_| VERR_OUT_OF_RANGE)
}

/// Allocator in stage phase.
///
/// Only [`reserve`](Allocator::reserve) is block specific, typed references are derived from it.
pub trait Allocator {
    /// Returns the number of bytes staged so far, i.e. the block length.
    fn offset(&self) -> usize;

    /// Reserves room for `layout` and returns the block offset of the reservation.
    fn reserve(&mut self, layout: Layout) -> Result<usize>;

    #[inline]
    fn allocate_input<'a, T: ByteSized>(&mut self) -> Result<InRef<'a, T>> {
        let offset = self.reserve(Layout::new::<T>())?;
        Ok(InRef::new(offset, 1))
    }

    #[inline]
    fn allocate_output<'a, T: ByteSized>(&mut self) -> Result<OutRef<'a, T>> {
        let offset = self.reserve(Layout::new::<T>())?;
        Ok(OutRef::new(offset, 1))
    }

    #[inline]
    fn allocate_inout<'a, T: ByteSized>(&mut self) -> Result<InOutRef<'a, T>> {
        let offset = self.reserve(Layout::new::<T>())?;
        Ok(InOutRef::new(offset, 1))
    }

    /// Reserves `len` elements of `T` for the host to read.
    #[inline]
    fn allocate_input_slice<'a, T: ByteSized>(&mut self, len: usize) -> Result<InRef<'a, [T]>> {
        let offset = self.reserve(array_layout::<T>(len)?)?;
        Ok(InRef::new(offset, len))
    }

    /// Reserves `len` elements of `T` for the host to write.
    #[inline]
    fn allocate_output_slice<'a, T: ByteSized>(&mut self, len: usize) -> Result<OutRef<'a, [T]>> {
        let offset = self.reserve(array_layout::<T>(len)?)?;
        Ok(OutRef::new(offset, len))
    }

    /// Reserves `len` elements of `T` for the host to read and write.
    #[inline]
    fn allocate_inout_slice<'a, T: ByteSized>(&mut self, len: usize) -> Result<InOutRef<'a, [T]>> {
        let offset = self.reserve(array_layout::<T>(len)?)?;
        Ok(InOutRef::new(offset, len))
    }
}

/// A staged value, written to the block in commit phase.
pub trait Commit {
    type Item;

    fn commit(self, com: &mut Committer<'_>) -> Self::Item;
}

impl<T: Commit> Commit for Option<T> {
    type Item = Option<T::Item>;

    #[inline]
    fn commit(self, com: &mut Committer<'_>) -> Self::Item {
        self.map(|v| v.commit(com))
    }
}

impl Commit for () {
    type Item = ();

    #[inline]
    fn commit(self, _: &mut Committer<'_>) {}
}

impl<A: Commit, B: Commit> Commit for (A, B) {
    type Item = (A::Item, B::Item);

    /// Commits `A`, then `B`.
    #[inline]
    fn commit(self, com: &mut Committer<'_>) -> Self::Item {
        let (a, b) = self;
        let a = a.commit(com);
        (a, b.commit(com))
    }
}

/// Something, for which [`Commit::commit`] is an identity function.
pub trait CommitPassthrough {}

impl<T: CommitPassthrough> Commit for T {
    type Item = Self;

    #[inline]
    fn commit(self, _: &mut Committer<'_>) -> Self::Item {
        self
    }
}

/// A committed output, read back from the block in collect phase.
pub trait Collect {
    type Item;

    fn collect(self, col: &Collector<'_>) -> Self::Item;
}

impl<T: Collect> Collect for Option<T> {
    type Item = Option<T::Item>;

    #[inline]
    fn collect(self, col: &Collector<'_>) -> Self::Item {
        self.map(|v| v.collect(col))
    }
}

impl<A: Collect, B: Collect> Collect for (A, B) {
    type Item = (A::Item, B::Item);

    #[inline]
    fn collect(self, col: &Collector<'_>) -> Self::Item {
        let (a, b) = self;
        (a.collect(col), b.collect(col))
    }
}
