// SPDX-License-Identifier: Apache-2.0

//! Object and volume information calls.

use super::buffer::{
    contiguous, contiguous_range, linear_mut, value_inout, value_out, PageListInput,
};
use super::{Call, Parms, Reply};
use crate::guest::alloc::{Allocator, Collect, Collector, CommitPassthrough, InOut, Output};
use crate::guest::{Features, PhysMut, PhysRange};
use crate::item::shfl::{InfoFlags, ObjInfo, VolInfo};
use crate::item::{ByteSized, Direction, Function, Handle, Parameter, Root};
use crate::status::VERR_INVALID_PARAMETER;
use crate::Result;

#[inline]
fn info_parms(
    root: Root,
    handle: Handle,
    flags: InfoFlags,
    size: usize,
    info: Parameter,
) -> Parms<5> {
    Parms([
        Parameter::U32(root),
        Parameter::U64(handle),
        Parameter::U32(flags.bits()),
        Parameter::U32(size as _),
        info,
    ])
}

/// Queries volume information of the folder `handle` lives on.
pub struct QueryVolInfo<'a> {
    pub root: Root,
    pub handle: Handle,
    pub info: &'a mut VolInfo,
}

impl<'a> Call<'a> for QueryVolInfo<'a> {
    const FUNCTION: Function = Function::Information;

    type Parms = Parms<5>;
    type Staged = Option<Output<'a, VolInfo, &'a mut VolInfo>>;
    type Committed = Self::Staged;
    type Collected = ();

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let (info, staged) = value_out(alloc, features, self.info)?;
        let flags = InfoFlags::VOLUME | InfoFlags::GET;
        Ok((info_parms(self.root, self.handle, flags, VolInfo::SIZE, info), staged))
    }

    #[inline]
    fn collect(info: Self::Committed, _: &Reply<'_>, col: &Collector<'_>) -> Result<()> {
        info.collect(col);
        Ok(())
    }
}

/// Queries information of the object `handle`.
pub struct QueryObjInfo<'a> {
    pub root: Root,
    pub handle: Handle,
    pub info: &'a mut ObjInfo,
}

impl<'a> Call<'a> for QueryObjInfo<'a> {
    const FUNCTION: Function = Function::Information;

    type Parms = Parms<5>;
    type Staged = Option<Output<'a, ObjInfo, &'a mut ObjInfo>>;
    type Committed = Self::Staged;
    type Collected = ();

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let (info, staged) = value_out(alloc, features, self.info)?;
        let flags = InfoFlags::FILE | InfoFlags::GET;
        Ok((info_parms(self.root, self.handle, flags, ObjInfo::SIZE, info), staged))
    }

    #[inline]
    fn collect(info: Self::Committed, _: &Reply<'_>, col: &Collector<'_>) -> Result<()> {
        info.collect(col);
        Ok(())
    }
}

/// Updates times, attributes or size of the object `handle`.
///
/// The host writes the resulting object information back into `info`.
pub struct SetObjInfo<'a> {
    pub root: Root,
    pub handle: Handle,
    pub info: &'a mut ObjInfo,
}

impl<'a> Call<'a> for SetObjInfo<'a> {
    const FUNCTION: Function = Function::Information;

    type Parms = Parms<5>;
    type Staged = Option<InOut<'a, ObjInfo, &'a mut ObjInfo>>;
    type Committed = Option<Output<'a, ObjInfo, &'a mut ObjInfo>>;
    type Collected = ();

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let (info, staged) = value_inout(alloc, features, self.info)?;
        let flags = InfoFlags::FILE | InfoFlags::SET;
        Ok((info_parms(self.root, self.handle, flags, ObjInfo::SIZE, info), staged))
    }

    #[inline]
    fn collect(info: Self::Committed, _: &Reply<'_>, col: &Collector<'_>) -> Result<()> {
        info.collect(col);
        Ok(())
    }
}

/// Object information buffer of a staged [`SetObjInfoWithBuf`].
pub struct StagedObjInfoBuf<'a> {
    buf: PhysMut<'a>,
    offset: usize,
}

impl CommitPassthrough for StagedObjInfoBuf<'_> {}

/// Like [`SetObjInfo`], with the object information at `offset` within a physically
/// contiguous buffer.
///
/// Collects the object information written back by the host.
pub struct SetObjInfoWithBuf<'a> {
    pub root: Root,
    pub handle: Handle,
    pub buf: PhysMut<'a>,
    pub offset: usize,
}

impl<'a> Call<'a> for SetObjInfoWithBuf<'a> {
    const FUNCTION: Function = Function::Information;

    type Parms = Parms<5>;
    type Staged = (Option<PageListInput<'a, [u64; 1]>>, StagedObjInfoBuf<'a>);
    type Committed = (Option<()>, StagedObjInfoBuf<'a>);
    type Collected = ObjInfo;

    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)> {
        let Self {
            root,
            handle,
            mut buf,
            offset,
        } = self;

        let end = offset.checked_add(ObjInfo::SIZE);
        if end.map_or(true, |end| end > buf.bytes().len()) {
            return Err(VERR_INVALID_PARAMETER);
        }

        let (info, staged) = if contiguous(features) {
            let range = PhysRange::new(buf.phys_addr() + offset as u64, ObjInfo::SIZE)?;
            let (info, list) = contiguous_range(alloc, Direction::BOTH, range)?;
            (info, Some(list))
        } else {
            let bytes = &mut buf.bytes_mut()[offset..][..ObjInfo::SIZE];
            (linear_mut(Direction::BOTH, bytes)?, None)
        };

        let flags = InfoFlags::FILE | InfoFlags::SET;
        Ok((
            info_parms(root, handle, flags, ObjInfo::SIZE, info),
            (staged, StagedObjInfoBuf { buf, offset }),
        ))
    }

    fn collect(
        (_, StagedObjInfoBuf { buf, offset }): Self::Committed,
        _: &Reply<'_>,
        _: &Collector<'_>,
    ) -> Result<ObjInfo> {
        ObjInfo::from_bytes(&buf.bytes()[offset..][..ObjInfo::SIZE])
            .ok_or(VERR_INVALID_PARAMETER)
    }
}
