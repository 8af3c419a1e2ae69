// SPDX-License-Identifier: Apache-2.0

//! Read calls.
//!
//! All variants encode the scalar parameters identically and collect the number of bytes the
//! host transferred, never more than requested.

use super::buffer::{
    bytes_out, contiguous, contiguous_range, linear_mut, page_list, PageListInput,
};
use super::{Call, Count, Parms, Reply};
use crate::guest::alloc::{Allocator, Collector, Output};
use crate::guest::{Features, PageList, PhysMut};
use crate::item::{Direction, Function, Handle, Parameter, Root, MAX_PAGES};
use crate::status::{VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::Result;

/// Builds the parameters of a transfer of `count` bytes at `offset` within `handle`.
#[inline]
pub(super) fn transfer_parms(
    root: Root,
    handle: Handle,
    offset: u64,
    count: Count,
    buf: Parameter,
) -> Parms<5> {
    Parms([
        Parameter::U32(root),
        Parameter::U64(handle),
        Parameter::U64(offset),
        Parameter::U32(count.get()),
        buf,
    ])
}

/// Validates a caller-built page list against a transfer of `len` bytes.
pub(super) fn check_page_list(pages: &PageList<'_>, len: u32) -> Result<Count> {
    if pages.pages().len() > MAX_PAGES {
        return Err(VERR_OUT_OF_RANGE);
    }
    if len as usize > pages.capacity() {
        return Err(VERR_INVALID_PARAMETER);
    }
    Ok(Count(len))
}

/// Reads into `buf`, embedding it in the block if possible.
pub struct ReadEmbedded<'a> {
    pub root: Root,
    pub handle: Handle,
    pub offset: u64,
    pub buf: &'a mut [u8],
}

impl<'a> Call<'a> for ReadEmbedded<'a> {
    const FUNCTION: Function = Function::Read;

    type Parms = Parms<5>;
    type Staged = (Option<Output<'a, [u8], &'a mut [u8]>>, Count);
    type Committed = Self::Staged;
    type Collected = u32;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let count = Count::new(self.buf.len())?;
        let (buf, staged) = bytes_out(alloc, features, self.buf)?;
        Ok((
            transfer_parms(self.root, self.handle, self.offset, count, buf),
            (staged, count),
        ))
    }

    fn collect(
        (buf, count): Self::Committed,
        reply: &Reply<'_>,
        col: &Collector<'_>,
    ) -> Result<u32> {
        let read = count.clamp(reply.value32(3)?);
        if let Some(buf) = buf {
            buf.collect_max(col, read as _);
        }
        Ok(read)
    }
}

/// Reads `len` bytes into the pages of a caller-built page list.
pub struct ReadPageList<'a> {
    pub root: Root,
    pub handle: Handle,
    pub offset: u64,
    pub len: u32,
    pub pages: PageList<'a>,
}

impl<'a> Call<'a> for ReadPageList<'a> {
    const FUNCTION: Function = Function::Read;

    type Parms = Parms<5>;
    type Staged = (PageListInput<'a, &'a [u64]>, Count);
    type Committed = ((), Count);
    type Collected = u32;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        _: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let count = check_page_list(&self.pages, self.len)?;
        let (offset, list) = page_list(
            alloc,
            Direction::FROM_HOST,
            self.pages.first_page_offset(),
            self.pages.pages(),
        )?;
        let buf = Parameter::page_list(offset, self.len as _)?;
        Ok((
            transfer_parms(self.root, self.handle, self.offset, count, buf),
            (list, count),
        ))
    }

    #[inline]
    fn collect((_, count): Self::Committed, reply: &Reply<'_>, _: &Collector<'_>) -> Result<u32> {
        Ok(count.clamp(reply.value32(3)?))
    }
}

/// Reads into a physically contiguous buffer.
pub struct ReadContiguous<'a> {
    pub root: Root,
    pub handle: Handle,
    pub offset: u64,
    pub buf: PhysMut<'a>,
}

impl<'a> Call<'a> for ReadContiguous<'a> {
    const FUNCTION: Function = Function::Read;

    type Parms = Parms<5>;
    type Staged = (Option<PageListInput<'a, [u64; 1]>>, Count);
    type Committed = (Option<()>, Count);
    type Collected = u32;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let count = Count::new(self.buf.bytes().len())?;
        let (buf, staged) = if contiguous(features) {
            let (buf, list) = contiguous_range(alloc, Direction::FROM_HOST, self.buf.range()?)?;
            (buf, Some(list))
        } else {
            (linear_mut(Direction::FROM_HOST, self.buf.into_bytes())?, None)
        };
        Ok((
            transfer_parms(self.root, self.handle, self.offset, count, buf),
            (staged, count),
        ))
    }

    #[inline]
    fn collect((_, count): Self::Committed, reply: &Reply<'_>, _: &Collector<'_>) -> Result<u32> {
        Ok(count.clamp(reply.value32(3)?))
    }
}
