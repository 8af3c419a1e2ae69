// SPDX-License-Identifier: Apache-2.0

use super::buffer::{contiguous, linear_in, page_list, PageListInput};
use super::{Call, Parms, Reply};
use crate::guest::alloc::{Allocator, Collector};
use crate::guest::{Features, Phys};
use crate::item::{Direction, Function, Parameter, Root, ROOT_NIL};
use crate::Result;

/// Maps the shared folder called `name` and returns its root id.
///
/// `name` must hold an encoded shared folder string.
pub struct MapFolder<'a> {
    pub name: Phys<'a>,
    pub delimiter: u16,
    pub case_sensitive: bool,
}

impl<'a> Call<'a> for MapFolder<'a> {
    const FUNCTION: Function = Function::MapFolder;

    type Parms = Parms<4>;
    type Staged = Option<PageListInput<'a, [u64; 1]>>;
    type Committed = Option<()>;
    type Collected = Root;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let range = self.name.range()?;

        // The host reads and writes the name through a plain page list of one page.
        let (name, staged) = if contiguous(features) && range.page_count() == 1 {
            let (offset, list) = page_list(alloc, Direction::BOTH, range.offset, [range.page])?;
            (Parameter::page_list(offset, range.len as _)?, Some(list))
        } else {
            (linear_in(self.name.bytes())?, None)
        };

        Ok((
            Parms([
                name,
                Parameter::U32(ROOT_NIL),
                Parameter::U32(self.delimiter.into()),
                Parameter::U32(self.case_sensitive.into()),
            ]),
            staged,
        ))
    }

    #[inline]
    fn collect(_: Self::Committed, reply: &Reply<'_>, _: &Collector<'_>) -> Result<Root> {
        reply.value32(1)
    }
}

/// Unmaps the shared folder `root`.
pub struct UnmapFolder {
    pub root: Root,
}

impl Call<'_> for UnmapFolder {
    const FUNCTION: Function = Function::UnmapFolder;

    type Parms = Parms<1>;
    type Staged = ();
    type Committed = ();
    type Collected = ();

    #[inline]
    fn stage(self, _: &mut impl Allocator, _: Features) -> Result<(Self::Parms, Self::Staged)> {
        Ok((Parms([Parameter::U32(self.root)]), ()))
    }

    #[inline]
    fn collect(_: Self::Committed, _: &Reply<'_>, _: &Collector<'_>) -> Result<()> {
        Ok(())
    }
}
