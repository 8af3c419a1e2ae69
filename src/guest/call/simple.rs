// SPDX-License-Identifier: Apache-2.0

//! Calls taking scalars only.

use super::{Call, Parms, Reply};
use crate::guest::alloc::{Allocator, Collector};
use crate::guest::Features;
use crate::item::{Function, Handle, Parameter, Root};
use crate::Result;

/// Closes `handle`.
pub struct Close {
    pub root: Root,
    pub handle: Handle,
}

/// Flushes buffered writes of `handle`.
pub struct Flush {
    pub root: Root,
    pub handle: Handle,
}

/// Truncates or extends the file `handle` to `size` bytes.
pub struct SetFileSize {
    pub root: Root,
    pub handle: Handle,
    pub size: u64,
}

macro_rules! scalar_call {
    ($name:ident, $function:expr, $n:literal, |$call:ident| $parms:expr) => {
        impl Call<'_> for $name {
            const FUNCTION: Function = $function;

            type Parms = Parms<$n>;
            type Staged = ();
            type Committed = ();
            type Collected = ();

            #[inline]
            fn stage(
                self,
                _: &mut impl Allocator,
                _: Features,
            ) -> Result<(Self::Parms, Self::Staged)> {
                let $call = self;
                Ok((Parms($parms), ()))
            }

            #[inline]
            fn collect(_: Self::Committed, _: &Reply<'_>, _: &Collector<'_>) -> Result<()> {
                Ok(())
            }
        }
    };
}

scalar_call!(Close, Function::Close, 2, |call| [
    Parameter::U32(call.root),
    Parameter::U64(call.handle),
]);

scalar_call!(Flush, Function::Flush, 2, |call| [
    Parameter::U32(call.root),
    Parameter::U64(call.handle),
]);

scalar_call!(SetFileSize, Function::SetFileSize, 3, |call| [
    Parameter::U32(call.root),
    Parameter::U64(call.handle),
    Parameter::U64(call.size),
]);
