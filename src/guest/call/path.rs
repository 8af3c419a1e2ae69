// SPDX-License-Identifier: Apache-2.0

//! Calls naming objects by path.

use super::buffer::{bytes_in, contiguous, contiguous_range, linear_in, PageListInput};
use super::{Call, Parms, Reply};
use crate::guest::alloc::{Allocator, Collector, Input};
use crate::guest::{Features, Phys};
use crate::item::shfl::{RemoveFlags, RenameFlags, ShflStr};
use crate::item::{Direction, Function, Parameter, Root};
use crate::Result;

/// Removes the object at `path`.
pub struct Remove<'a> {
    pub root: Root,
    pub path: ShflStr<'a>,
    pub flags: RemoveFlags,
}

impl<'a> Call<'a> for Remove<'a> {
    const FUNCTION: Function = Function::Remove;

    type Parms = Parms<3>;
    type Staged = Option<Input<'a, [u8], &'a [u8]>>;
    type Committed = Option<()>;
    type Collected = ();

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let (path, staged) = bytes_in(alloc, features, self.path.as_bytes())?;
        Ok((
            Parms([
                Parameter::U32(self.root),
                path,
                Parameter::U32(self.flags.bits()),
            ]),
            staged,
        ))
    }

    #[inline]
    fn collect(_: Self::Committed, _: &Reply<'_>, _: &Collector<'_>) -> Result<()> {
        Ok(())
    }
}

/// Renames the object at `src` to `dst`.
///
/// `src` must hold an encoded shared folder string.
pub struct Rename<'a> {
    pub root: Root,
    pub src: Phys<'a>,
    pub dst: ShflStr<'a>,
    pub flags: RenameFlags,
}

impl<'a> Call<'a> for Rename<'a> {
    const FUNCTION: Function = Function::Rename;

    type Parms = Parms<4>;
    type Staged = (
        Option<Input<'a, [u8], &'a [u8]>>,
        Option<PageListInput<'a, [u64; 1]>>,
    );
    type Committed = (Option<()>, Option<()>);
    type Collected = ();

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        // Embedded payload precedes page lists within the block.
        let (dst, dst_staged) = bytes_in(alloc, features, self.dst.as_bytes())?;

        let (src, src_staged) = if contiguous(features) {
            let (src, list) = contiguous_range(alloc, Direction::TO_HOST, self.src.range()?)?;
            (src, Some(list))
        } else {
            (linear_in(self.src.bytes())?, None)
        };

        Ok((
            Parms([
                Parameter::U32(self.root),
                src,
                dst,
                Parameter::U32(self.flags.bits()),
            ]),
            (dst_staged, src_staged),
        ))
    }

    #[inline]
    fn collect(_: Self::Committed, _: &Reply<'_>, _: &Collector<'_>) -> Result<()> {
        Ok(())
    }
}
