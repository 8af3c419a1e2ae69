// SPDX-License-Identifier: Apache-2.0

//! Guest-side request marshalling for the paravirtual shared-folder service
//!
//! `sfport` is a protocol crate for encoding shared-folder file operations (open, read, write,
//! list, rename, ...) issued inside a virtual machine into request blocks consumed by the
//! host-side shared-folder service, and for decoding the host's reply.
//!
//! # Mechanism of action
//!
//! Every operation is staged first: the exact size and layout of the request block are computed
//! from the operation and the negotiated [features](guest::Features) without touching memory.
//! A block of that size is then acquired from a physically contiguous [heap](guest::PhysHeap),
//! the envelope, parameters and payload are committed into it, and the block is handed to the
//! host through a synchronous call. After the call returns, outputs are collected from the
//! block and the block is released.
//!
//! Every buffer reference inside a request is either embedded in the block itself, or expressed
//! as a host-visible physical address, or, as a last resort, a guest linear address.
//!
//! # Block format
//!
//! A request [block](item) consists of the following zones, in order:
//!
//! * [prefix](item::Prefix): `16` bytes, guest-private, holds the physical address of the envelope
//! * [envelope](item::Envelope): `44` bytes, the call header
//! * [parameters](item::Parameter): `16` bytes each, as many as the envelope's parameter count
//! * embedded payload: optional
//! * [page lists](item::PageListHeader): optional, `8`-byte aligned
//!
//! The envelope's size field covers everything except the prefix.
//!
//! ## Envelope
//!
//! * `size`: `u32` - size of the request excluding the prefix
//! * `version`: `u32` - `0x0001_0001`
//! * `request_type`: `u32` - `63`, a 64-bit host call
//! * `rc`: `i32` - transport status, initialized to `VERR_INTERNAL_ERROR`
//! * `reserved1`: `u32`
//! * `requestor`: `u32`
//! * `flags`: `u32`
//! * `result`: `i32` - host result, initialized to `VINF_SUCCESS`
//! * `client_id`: `u32` - the session's client id
//! * `function`: `u32` - the [function](item::Function) code
//! * `parm_count`: `u32` - the number of parameters following the envelope
//!
//! All offsets referenced by parameters (embedded data, page lists) are relative to the
//! beginning of the envelope. All multi-byte values are little endian. Wire structures are
//! copied to and from the block as they are laid out in memory, so the crate only builds for
//! little-endian targets.

#![cfg_attr(not(test), no_std)]
#![deny(clippy::all)]

#[cfg(target_endian = "big")]
compile_error!("sfport requires a little-endian target");

pub mod guest;
pub mod host;
pub mod item;
pub mod status;

/// Error type used within this crate.
///
/// Errors are status codes as spoken by the host and the transport, see [`status`].
pub type Error = i32;

/// Result type returned by functionality exposed by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Size of a page as seen by the host.
pub const PAGE_SIZE: usize = primordial::Page::SIZE;

/// Internal representation of a null physical address.
pub const NIL_PHYS: u64 = u64::MAX;

/// The sfport version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
