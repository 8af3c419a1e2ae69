// SPDX-License-Identifier: Apache-2.0

//! Buffer encodings shared by the calls.

use crate::guest::alloc::{Allocator, Commit, Committer, InOut, Input, Output};
use crate::guest::{Features, PhysRange};
use crate::item::{ByteSized, Direction, PageListHeader, Parameter, MAX_PAGES, PREFIX_SIZE};
use crate::status::{VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::{Result, NIL_PHYS};

/// Converts a block offset into an envelope-relative offset.
///
/// Fails with [`VERR_INVALID_PARAMETER`] for offsets inside the prefix, which happens when a
/// call is staged without the prefix and envelope in front of it.
#[inline]
fn envelope_offset(block_offset: usize) -> Result<usize> {
    block_offset
        .checked_sub(PREFIX_SIZE)
        .ok_or(VERR_INVALID_PARAMETER)
}

#[inline]
pub(super) fn embedded(features: Features) -> bool {
    features.contains(Features::EMBEDDED_BUFFERS)
}

#[inline]
pub(super) fn contiguous(features: Features) -> bool {
    features.contains(Features::CONTIGUOUS_PAGE_LIST)
}

/// Staged page list descriptor.
pub struct PageListInput<'a, U> {
    header: Input<'a, PageListHeader, PageListHeader>,
    pages: Input<'a, [u64], U>,
}

impl<'a, U: AsRef<[u64]>> Commit for PageListInput<'a, U> {
    type Item = ();

    #[inline]
    fn commit(self, com: &mut Committer<'_>) {
        self.header.commit(com);
        self.pages.commit(com);
    }
}

/// Stages a page list descriptor and returns its envelope-relative offset.
///
/// Lists of more than [`MAX_PAGES`] pages are rejected before anything is staged.
pub(super) fn page_list<'a, U: AsRef<[u64]>>(
    alloc: &mut impl Allocator,
    dir: Direction,
    first_page_offset: u16,
    pages: U,
) -> Result<(usize, PageListInput<'a, U>)> {
    let count = pages.as_ref().len();
    if count > MAX_PAGES {
        return Err(VERR_OUT_OF_RANGE);
    }

    let header = Input::stage(
        alloc,
        PageListHeader::new(dir, first_page_offset, count as u16),
    )?;
    let pages = Input::stage_slice(alloc, pages)?;
    Ok((envelope_offset(header.offset())?, PageListInput { header, pages }))
}

/// Stages a single-run page list covering `range`.
pub(super) fn contiguous_range<'a>(
    alloc: &mut impl Allocator,
    dir: Direction,
    range: PhysRange,
) -> Result<(Parameter, PageListInput<'a, [u64; 1]>)> {
    let (offset, list) = page_list(alloc, dir, range.offset, [range.page])?;
    Ok((Parameter::contiguous(offset, range.len as usize)?, list))
}

/// Stages a single-run page list describing no memory at all.
pub(super) fn contiguous_nil<'a>(
    alloc: &mut impl Allocator,
    dir: Direction,
) -> Result<(Parameter, PageListInput<'a, [u64; 1]>)> {
    let (offset, list) = page_list(alloc, dir, 0, [NIL_PHYS])?;
    Ok((Parameter::contiguous(offset, 0)?, list))
}

/// Refers to `bytes` in guest memory by linear address, for the host to read.
#[inline]
pub(super) fn linear_in(bytes: &[u8]) -> Result<Parameter> {
    Parameter::linear(Direction::TO_HOST, bytes.as_ptr() as u64, bytes.len())
}

/// Refers to `bytes` in guest memory by linear address, for the host to write in `dir`.
#[inline]
pub(super) fn linear_mut(dir: Direction, bytes: &mut [u8]) -> Result<Parameter> {
    Parameter::linear(dir, bytes.as_mut_ptr() as u64, bytes.len())
}

/// Refers to `val` in guest memory by linear address, for the host to write in `dir`.
#[inline]
fn linear_value<T: ByteSized>(dir: Direction, val: &mut T) -> Result<Parameter> {
    Parameter::linear(dir, val as *mut T as u64, T::SIZE)
}

/// Stages `bytes` for the host to read: embedded if enabled, by linear address otherwise.
pub(super) fn bytes_in<'a>(
    alloc: &mut impl Allocator,
    features: Features,
    bytes: &'a [u8],
) -> Result<(Parameter, Option<Input<'a, [u8], &'a [u8]>>)> {
    if !embedded(features) {
        return Ok((linear_in(bytes)?, None));
    }

    let input = Input::stage_slice(alloc, bytes)?;
    let parm = Parameter::embedded(
        Direction::TO_HOST,
        envelope_offset(input.offset())?,
        bytes.len(),
    )?;
    Ok((parm, Some(input)))
}

/// Stages `buf` for the host to write: embedded if enabled, by linear address otherwise.
pub(super) fn bytes_out<'a>(
    alloc: &mut impl Allocator,
    features: Features,
    buf: &'a mut [u8],
) -> Result<(Parameter, Option<Output<'a, [u8], &'a mut [u8]>>)> {
    if !embedded(features) {
        return Ok((linear_mut(Direction::FROM_HOST, buf)?, None));
    }

    let len = buf.len();
    let output = Output::stage_slice(alloc, buf)?;
    let offset = envelope_offset(output.offset())?;
    let parm = Parameter::embedded(Direction::FROM_HOST, offset, len)?;
    Ok((parm, Some(output)))
}

/// Stages `val` for the host to write: embedded if enabled, by linear address otherwise.
pub(super) fn value_out<'a, T: ByteSized>(
    alloc: &mut impl Allocator,
    features: Features,
    val: &'a mut T,
) -> Result<(Parameter, Option<Output<'a, T, &'a mut T>>)> {
    if !embedded(features) {
        return Ok((linear_value(Direction::FROM_HOST, val)?, None));
    }

    let output = Output::<T, _>::stage(alloc, val)?;
    let offset = envelope_offset(output.offset())?;
    let parm = Parameter::embedded(Direction::FROM_HOST, offset, T::SIZE)?;
    Ok((parm, Some(output)))
}

/// Stages `val` for the host to read and write: embedded if enabled, by linear address otherwise.
pub(super) fn value_inout<'a, T: ByteSized>(
    alloc: &mut impl Allocator,
    features: Features,
    val: &'a mut T,
) -> Result<(Parameter, Option<InOut<'a, T, &'a mut T>>)> {
    if !embedded(features) {
        return Ok((linear_value(Direction::BOTH, val)?, None));
    }

    let inout = InOut::<T, _>::stage(alloc, val)?;
    let offset = envelope_offset(inout.offset())?;
    let parm = Parameter::embedded(Direction::BOTH, offset, T::SIZE)?;
    Ok((parm, Some(inout)))
}
