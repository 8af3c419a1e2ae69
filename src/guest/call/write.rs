// SPDX-License-Identifier: Apache-2.0

//! Write calls, mirroring the [read calls](super::ReadEmbedded).

use super::buffer::{bytes_in, contiguous, contiguous_range, linear_in, page_list, PageListInput};
use super::read::{check_page_list, transfer_parms};
use super::{Call, Count, Parms, Reply};
use crate::guest::alloc::{Allocator, Collector, Input};
use crate::guest::{Features, PageList, Phys};
use crate::item::{Direction, Function, Handle, Parameter, Root};
use crate::Result;

/// Writes `buf`, embedding it in the block if possible.
pub struct WriteEmbedded<'a> {
    pub root: Root,
    pub handle: Handle,
    pub offset: u64,
    pub buf: &'a [u8],
}

impl<'a> Call<'a> for WriteEmbedded<'a> {
    const FUNCTION: Function = Function::Write;

    type Parms = Parms<5>;
    type Staged = (Option<Input<'a, [u8], &'a [u8]>>, Count);
    type Committed = (Option<()>, Count);
    type Collected = u32;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let count = Count::new(self.buf.len())?;
        let (buf, staged) = bytes_in(alloc, features, self.buf)?;
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

/// Writes `len` bytes from the pages of a caller-built page list.
pub struct WritePageList<'a> {
    pub root: Root,
    pub handle: Handle,
    pub offset: u64,
    pub len: u32,
    pub pages: PageList<'a>,
}

impl<'a> Call<'a> for WritePageList<'a> {
    const FUNCTION: Function = Function::Write;

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
            Direction::TO_HOST,
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

/// Writes from a physically contiguous buffer.
pub struct WriteContiguous<'a> {
    pub root: Root,
    pub handle: Handle,
    pub offset: u64,
    pub buf: Phys<'a>,
}

impl<'a> Call<'a> for WriteContiguous<'a> {
    const FUNCTION: Function = Function::Write;

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
            let (buf, list) = contiguous_range(alloc, Direction::TO_HOST, self.buf.range()?)?;
            (buf, Some(list))
        } else {
            (linear_in(self.buf.bytes())?, None)
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
