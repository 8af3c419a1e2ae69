// SPDX-License-Identifier: Apache-2.0

//! Status codes exchanged with the host and the transport.
//!
//! Negative values are failures, zero and positive values are (informational) successes.

#![allow(missing_docs)]

use crate::Error;

pub const VINF_SUCCESS: Error = 0;

pub const VERR_INVALID_PARAMETER: Error = -2;
pub const VERR_NO_MEMORY: Error = -8;
pub const VERR_NOT_IMPLEMENTED: Error = -12;
pub const VERR_NOT_SUPPORTED: Error = -37;
pub const VERR_ACCESS_DENIED: Error = -38;
pub const VERR_BUFFER_OVERFLOW: Error = -41;
pub const VERR_OUT_OF_RANGE: Error = -54;
pub const VERR_FILE_NOT_FOUND: Error = -102;
pub const VERR_INTERNAL_ERROR: Error = -225;

/// Returns `true` if `rc` denotes success, informational statuses included.
#[inline]
pub const fn success(rc: Error) -> bool {
    rc >= VINF_SUCCESS
}

/// Returns `true` if `rc` denotes failure.
#[inline]
pub const fn failure(rc: Error) -> bool {
    !success(rc)
}
