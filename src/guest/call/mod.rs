// SPDX-License-Identifier: Apache-2.0

//! Shared folder calls.
//!
//! Every call knows its [function](Function), stages its [parameters](Parameter) and payload
//! into a block and collects its outputs from the block once the host has replied.

#[cfg(test)]
mod tests;

mod buffer;
mod create;
mod info;
mod list;
mod path;
mod read;
mod root;
mod simple;
mod write;

pub use create::*;
pub use info::*;
pub use list::*;
pub use path::*;
pub use read::*;
pub use root::*;
pub use simple::*;
pub use write::*;

use super::alloc::{
    Alloc, Allocator, Collector, Commit, CommitPassthrough, Committer, InOutRef, InRef, OutRef,
};
use super::{Features, Session};
use crate::item::{Envelope, Function, Parameter, Prefix, PARM_SIZE, PREFIX_SIZE};
use crate::status::{failure, VERR_OUT_OF_RANGE};
use crate::Result;

use core::convert::TryFrom;
use log::debug;

/// A fixed-size parameter list.
pub trait ParmList {
    /// Number of parameters.
    const COUNT: usize;

    fn as_slice(&self) -> &[Parameter];
}

/// Parameters of a call taking `N` parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parms<const N: usize>(pub [Parameter; N]);

impl<const N: usize> ParmList for Parms<N> {
    const COUNT: usize = N;

    #[inline]
    fn as_slice(&self) -> &[Parameter] {
        &self.0
    }
}

/// Parameters as left by the host.
#[derive(Clone, Copy, Debug)]
pub struct Reply<'a> {
    slots: &'a [u8],
}

impl<'a> Reply<'a> {
    #[inline]
    pub fn new(slots: &'a [u8]) -> Self {
        Self { slots }
    }

    /// Decodes parameter `i`.
    pub fn parameter(&self, i: usize) -> Result<Parameter> {
        let slot = self
            .slots
            .get(i * PARM_SIZE..(i + 1) * PARM_SIZE)
            .ok_or(VERR_OUT_OF_RANGE)?;
        Parameter::decode(slot)
    }

    /// Returns the 32-bit value of parameter `i`.
    #[inline]
    pub fn value32(&self, i: usize) -> Result<u32> {
        self.parameter(i)?.value32()
    }

    /// Returns the 64-bit value of parameter `i`.
    #[inline]
    pub fn value64(&self, i: usize) -> Result<u64> {
        self.parameter(i)?.value64()
    }
}

/// Byte count requested by a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Count(u32);

impl CommitPassthrough for Count {}

impl Count {
    /// Fails with [`VERR_OUT_OF_RANGE`] if `len` does not fit the 32-bit count field.
    fn new(len: usize) -> Result<Self> {
        u32::try_from(len).map(Self).map_err(|_| VERR_OUT_OF_RANGE)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Clamps a count reported by the host to the requested one.
    #[inline]
    fn clamp(self, reported: u32) -> u32 {
        reported.min(self.0)
    }
}

/// A shared folder call, which can be staged within a block.
pub trait Call<'a> {
    /// Function code of this call.
    const FUNCTION: Function;

    /// Parameter list of this call.
    type Parms: ParmList;

    /// Payload and page lists allocated by [`stage`](Self::stage), which turn into
    /// [`Self::Committed`] once written to the block.
    type Staged: Commit<Item = Self::Committed>;

    /// What [`collect`](Self::collect) needs to know about the committed payload.
    type Committed;

    /// Value the call collects as.
    type Collected;

    /// Allocate payload, if necessary, and return the parameters along with the resulting
    /// opaque [staged value](Self::Staged) on success.
    fn stage(
        self,
        alloc: &mut impl Allocator,
        features: Features,
    ) -> Result<(Self::Parms, Self::Staged)>;

    /// Collect outputs of a call the host completed successfully.
    fn collect(
        committed: Self::Committed,
        reply: &Reply<'_>,
        col: &Collector<'_>,
    ) -> Result<Self::Collected>;
}

/// Staged call, which holds allocated references to the prefix, envelope and parameters within
/// the block and the [opaque staged value](Call::Staged).
pub struct StagedCall<'a, T: Call<'a>> {
    prefix_ref: InRef<'a, Prefix>,
    envelope_ref: InOutRef<'a, Envelope>,
    parms_ref: InOutRef<'a, [u8]>,
    parms: T::Parms,
    staged: T::Staged,
    size: u32,
}

impl<'a, T: Call<'a>> StagedCall<'a, T> {
    /// Stages `call` in `alloc`.
    ///
    /// Protocol limits are enforced here, before any memory is acquired.
    pub fn stage(call: T, alloc: &mut Alloc, features: Features) -> Result<Self> {
        let prefix_ref = alloc.allocate_input()?;
        let envelope_ref = alloc.allocate_inout()?;
        let parms_ref = alloc.allocate_inout_slice(T::Parms::COUNT * PARM_SIZE)?;
        let (parms, staged) = call.stage(alloc, features)?;
        debug_assert_eq!(T::Parms::COUNT, T::FUNCTION.parm_count());

        let size = u32::try_from(alloc.len() - PREFIX_SIZE).map_err(|_| VERR_OUT_OF_RANGE)?;
        Ok(Self {
            prefix_ref,
            envelope_ref,
            parms_ref,
            parms,
            staged,
            size,
        })
    }

    /// Returns the staged parameters.
    #[inline]
    pub fn parms(&self) -> &[Parameter] {
        self.parms.as_slice()
    }

    /// Writes the prefix, the envelope, the parameters and the payload, in this order.
    pub fn commit(self, com: &mut Committer<'_>, session: &Session) -> CommittedCall<'a, T> {
        let prefix = Prefix {
            phys_req: com.phys() + PREFIX_SIZE as u64,
            ..Default::default()
        };
        self.prefix_ref.write(com, &prefix);

        let envelope = Envelope::new(
            self.size,
            session.client_id,
            T::FUNCTION,
            T::Parms::COUNT as _,
        );
        self.envelope_ref.write(com, &envelope);

        for (i, parm) in self.parms.as_slice().iter().enumerate() {
            self.parms_ref.write_at(com, i * PARM_SIZE, &parm.encode());
        }

        CommittedCall {
            envelope_ref: self.envelope_ref.into(),
            parms_ref: self.parms_ref.into(),
            committed: self.staged.commit(com),
        }
    }
}

/// Committed call, which holds allocated references to the envelope and parameters and the
/// [opaque committed value](Call::Committed).
pub struct CommittedCall<'a, T: Call<'a>> {
    envelope_ref: OutRef<'a, Envelope>,
    parms_ref: OutRef<'a, [u8]>,
    committed: T::Committed,
}

impl<'a, T: Call<'a>> CommittedCall<'a, T> {
    /// Reads the host result and, on success, the outputs of the call.
    ///
    /// A failing host result is returned unmodified.
    pub fn collect(self, col: &Collector<'_>) -> Result<T::Collected> {
        let envelope = self.envelope_ref.read(col);
        if failure(envelope.result) {
            debug!("{:?} failed on host: {}", T::FUNCTION, envelope.result);
            return Err(envelope.result);
        }

        let reply = Reply::new(self.parms_ref.bytes(col));
        T::collect(self.committed, &reply, col)
    }
}
