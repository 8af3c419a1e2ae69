// SPDX-License-Identifier: Apache-2.0

use super::buffer::{bytes_in, value_inout};
use super::{Call, Parms, Reply};
use crate::guest::alloc::{Allocator, Collect, Collector, InOut, Input, Output};
use crate::guest::Features;
use crate::item::shfl::{CreateParms, ShflStr};
use crate::item::{Function, Parameter, Root};
use crate::Result;

/// Opens or creates the object at `path`.
///
/// The host updates `parms` in place, most notably [`CreateParms::handle`] and
/// [`CreateParms::result`].
pub struct Create<'a> {
    pub root: Root,
    pub path: ShflStr<'a>,
    pub parms: &'a mut CreateParms,
}

impl<'a> Call<'a> for Create<'a> {
    const FUNCTION: Function = Function::Create;

    type Parms = Parms<3>;
    type Staged = (
        Option<InOut<'a, CreateParms, &'a mut CreateParms>>,
        Option<Input<'a, [u8], &'a [u8]>>,
    );
    type Committed = (Option<Output<'a, CreateParms, &'a mut CreateParms>>, Option<()>);
    type Collected = ();

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let (parms, parms_staged) = value_inout(alloc, features, self.parms)?;
        let (path, path_staged) = bytes_in(alloc, features, self.path.as_bytes())?;
        Ok((
            Parms([Parameter::U32(self.root), path, parms]),
            (parms_staged, path_staged),
        ))
    }

    #[inline]
    fn collect(
        (parms, _): Self::Committed,
        _: &Reply<'_>,
        col: &Collector<'_>,
    ) -> Result<()> {
        parms.collect(col);
        Ok(())
    }
}
