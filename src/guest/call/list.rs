// SPDX-License-Identifier: Apache-2.0

use super::buffer::{
    contiguous, contiguous_nil, contiguous_range, linear_in, linear_mut, PageListInput,
};
use super::{Call, Count, Parms, Reply};
use crate::guest::alloc::{Allocator, Collector};
use crate::guest::{Features, Phys, PhysMut};
use crate::item::shfl::ListFlags;
use crate::item::{Direction, Function, Handle, Parameter, Root};
use crate::Result;

/// Outcome of a [`ListDir`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListResult {
    /// Bytes of the buffer filled with directory entries.
    pub bytes: u32,

    /// Number of entries in the buffer.
    pub entries: u32,

    /// Whether the end of the directory was reached.
    pub done: bool,
}

/// Lists the directory `handle` into `buf`.
///
/// `filter`, if any, must hold an encoded shared folder string. The buffer is filled with
/// packed entries, see [`DirEntries`](crate::item::shfl::DirEntries).
pub struct ListDir<'a> {
    pub root: Root,
    pub handle: Handle,
    pub flags: ListFlags,
    pub filter: Option<Phys<'a>>,
    pub buf: PhysMut<'a>,
}

type StagedLists<'a> = (PageListInput<'a, [u64; 1]>, PageListInput<'a, [u64; 1]>);

impl<'a> Call<'a> for ListDir<'a> {
    const FUNCTION: Function = Function::List;

    type Parms = Parms<8>;
    type Staged = (Option<StagedLists<'a>>, Count);
    type Committed = (Option<((), ())>, Count);
    type Collected = ListResult;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let count = Count::new(self.buf.bytes().len())?;

        let (filter, buf, staged) = if contiguous(features) {
            let (filter, filter_list) = match self.filter {
                Some(filter) => contiguous_range(alloc, Direction::TO_HOST, filter.range()?)?,
                None => contiguous_nil(alloc, Direction::TO_HOST)?,
            };
            let (buf, buf_list) =
                contiguous_range(alloc, Direction::FROM_HOST, self.buf.range()?)?;
            (filter, buf, Some((filter_list, buf_list)))
        } else {
            let filter = match self.filter {
                Some(filter) => linear_in(filter.bytes())?,
                None => Parameter::linear(Direction::TO_HOST, 0, 0)?,
            };
            let buf = linear_mut(Direction::FROM_HOST, self.buf.into_bytes())?;
            (filter, buf, None)
        };

        Ok((
            Parms([
                Parameter::U32(self.root),
                Parameter::U64(self.handle),
                Parameter::U32(self.flags.bits()),
                Parameter::U32(count.get()),
                filter,
                buf,
                Parameter::U32(0),
                Parameter::U32(0),
            ]),
            (staged, count),
        ))
    }

    fn collect(
        (_, count): Self::Committed,
        reply: &Reply<'_>,
        _: &Collector<'_>,
    ) -> Result<ListResult> {
        Ok(ListResult {
            bytes: count.clamp(reply.value32(3)?),
            entries: reply.value32(7)?,
            done: reply.value32(6)? != 0,
        })
    }
}
