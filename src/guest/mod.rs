// SPDX-License-Identifier: Apache-2.0

//! Guest side of the shared folder protocol.
//!
//! The main entrypoint into this module is a long-lived [`Handler`], which stages requests,
//! acquires request blocks from a physically contiguous [heap](PhysHeap), passes each block to
//! the host via [`dispatch`](Handler::dispatch) and reads the replies once it gets the control
//! back.
//!
//! On top of the three methods an implementor supplies, [`Handler`] offers:
//! - API for execution of an arbitrary [`Call`](call::Call):
//!     - [`execute`](Handler::execute), which allocates the request block from the heap
//!     - [`execute_in`](Handler::execute_in), which uses a block owned by the caller
//!
//! - one method per shared folder operation, for example:
//!     - [`map_folder`](Handler::map_folder)
//!     - [`create`](Handler::create)
//!     - [`read_embedded`](Handler::read_embedded)
//!     - [`list_dir`](Handler::list_dir)
//!
//! # Request phases
//!
//! Every request goes through the same three phases:
//!
//! ## Stage
//! In this phase [input references], [output references] and [inout references] are sequentially
//! allocated within a request block, which does not exist yet. Staging computes the exact
//! length of the block and enforces the protocol limits.
//!
//! ## Commit
//! In this phase the prefix, the envelope, the parameters and the payload are written to the
//! block acquired for the length computed in the stage phase.
//!
//! Once this phase is finished, the block is ready to be passed to the host via
//! [`dispatch`](Handler::dispatch).
//!
//! Staged values write themselves into the block through [`Commit`](alloc::Commit).
//!
//! ## Collect
//! In this phase the host result and the data written by the host are read from the block.
//! This phase starts after the control returns to the guest. Once this phase is finished, the
//! block is released.
//!
//! Outputs read themselves back through [`Collect`](alloc::Collect).
//!
//! [inout references]: alloc::InOutRef
//! [input references]: alloc::InRef
//! [output references]: alloc::OutRef

pub mod alloc;
pub mod call;

mod handler;
mod heap;
mod phys;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use handler::*;
pub use heap::*;
pub use phys::*;
pub use registry::*;
