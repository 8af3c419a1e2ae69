// SPDX-License-Identifier: Apache-2.0

//! Shared `sfport` wire definitions.

mod function;
mod page_list;
mod parameter;
pub mod shfl;

pub use function::*;
pub use page_list::*;
pub use parameter::*;

use crate::status::{VERR_INTERNAL_ERROR, VINF_SUCCESS};

use core::mem::size_of;

/// Shared folder root id, as returned by [`Function::MapFolder`].
pub type Root = u32;

/// Shared folder object handle, as returned by [`Function::Create`].
pub type Handle = u64;

/// The root id of a folder that is not mapped.
pub const ROOT_NIL: Root = u32::MAX;

/// The handle of an object that is not open.
pub const HANDLE_NIL: Handle = u64::MAX;

/// Envelope header version.
pub const VERSION: u32 = 0x0001_0001;

/// Envelope request type of a 64-bit host call.
pub const REQUEST_HGCM_CALL64: u32 = 63;

/// Requestor information of a kernel-mode caller of unknown origin.
pub const REQUESTOR_USR_DRV_OTHER: u32 = 0x0000_0002;

/// Plain data that has the same representation in memory and on the wire.
///
/// # Safety
///
/// Implementors must be `repr(C)`, contain no padding and be valid for every bit pattern.
pub unsafe trait ByteSized: Copy + Sized {
    /// The size of the type on the wire.
    const SIZE: usize = size_of::<Self>();

    /// Create Self from a byte slice.
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }

        // SAFETY: `bytes` holds `Self::SIZE` bytes and `Self` is valid for every bit pattern.
        Some(unsafe { (bytes.as_ptr() as *const Self).read_unaligned() })
    }

    /// Serialize Self to a byte slice.
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: the pointer is non-null, the length is correct and u8 needs no alignment.
        unsafe { core::slice::from_raw_parts(self as *const _ as *const u8, Self::SIZE) }
    }
}

/// Views a slice of plain data as its bytes.
#[inline]
pub fn slice_as_bytes<T: ByteSized>(slice: &[T]) -> &[u8] {
    // SAFETY: `T` has no padding, so every byte of the slice is initialized.
    unsafe { core::slice::from_raw_parts(slice.as_ptr() as *const u8, slice.len() * T::SIZE) }
}

/// Views a mutable slice of plain data as its bytes.
#[inline]
pub fn slice_as_bytes_mut<T: ByteSized>(slice: &mut [T]) -> &mut [u8] {
    // SAFETY: `T` has no padding and is valid for every bit pattern.
    unsafe { core::slice::from_raw_parts_mut(slice.as_mut_ptr() as *mut u8, slice.len() * T::SIZE) }
}

unsafe impl ByteSized for u8 {}
unsafe impl ByteSized for u16 {}
unsafe impl ByteSized for u32 {}
unsafe impl ByteSized for u64 {}

/// Guest-private prefix of a fast host call.
///
/// The host never sees the prefix, it is consumed by the call primitive, which hands
/// [`Prefix::phys_req`] to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct Prefix {
    /// Physical address of the [`Envelope`].
    pub phys_req: u64,

    /// Whether the call may be interrupted.
    pub interruptible: u8,

    pub reserved: [u8; 7],
}

unsafe impl ByteSized for Prefix {}

/// Size of the [`Prefix`] in bytes.
pub const PREFIX_SIZE: usize = size_of::<Prefix>();

/// Host call envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Envelope {
    /// Size of the request, excluding the [`Prefix`].
    pub size: u32,
    pub version: u32,
    pub request_type: u32,

    /// Transport status.
    pub rc: i32,

    pub reserved1: u32,
    pub requestor: u32,
    pub flags: u32,

    /// Result of the call as reported by the host service.
    pub result: i32,

    pub client_id: u32,
    pub function: u32,
    pub parm_count: u32,
}

unsafe impl ByteSized for Envelope {}

/// Size of the [`Envelope`] in bytes.
pub const ENVELOPE_SIZE: usize = size_of::<Envelope>();

/// Offset of the first parameter within a block.
pub const PARMS_OFFSET: usize = PREFIX_SIZE + ENVELOPE_SIZE;

impl Envelope {
    /// Creates an envelope for a request of `size` bytes (excluding the prefix).
    pub fn new(size: u32, client_id: u32, function: Function, parm_count: u32) -> Self {
        Self {
            size,
            version: VERSION,
            request_type: REQUEST_HGCM_CALL64,
            rc: VERR_INTERNAL_ERROR,
            reserved1: 0,
            requestor: REQUESTOR_USR_DRV_OTHER,
            flags: 0,
            result: VINF_SUCCESS,
            client_id,
            function: function as _,
            parm_count,
        }
    }
}
