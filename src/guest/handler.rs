// SPDX-License-Identifier: Apache-2.0

use super::alloc::{Alloc, Collector};
use super::call::{self, Call, ListResult, StagedCall};
use super::{PageList, Phys, PhysBuf, PhysHeap, PhysMut, Registry};
use crate::item::shfl::{
    CreateParms, ListFlags, ObjInfo, RemoveFlags, RenameFlags, ShflStr, VolInfo,
};
use crate::item::{Handle, Root};
use crate::status::VERR_NOT_IMPLEMENTED;
use crate::Result;

use log::{debug, trace};

/// Commits `staged` into `block`, dispatches it and collects the reply.
fn run<'a, H: Handler + ?Sized, T: Call<'a>>(
    handler: &H,
    alloc: Alloc,
    staged: StagedCall<'a, T>,
    block: PhysMut<'_>,
) -> Result<T::Collected> {
    let registry = handler.registry();
    let len = alloc.len();
    let phys = block.phys_addr();

    let mut com = alloc.commit(block.into_bytes(), phys)?;
    let committed = staged.commit(&mut com, registry.session());
    let block = com.into_inner();

    trace!(
        "{:?}: {} bytes, features {:?}",
        T::FUNCTION,
        len,
        registry.features()
    );
    if let Err(rc) = handler.dispatch(block) {
        debug!("{:?} failed in transport: {}", T::FUNCTION, rc);
        return Err(rc);
    }
    committed.collect(&Collector::new(block))
}

/// Guest request handler.
///
/// Implementors provide the negotiated [`Registry`], the [heap](PhysHeap) request blocks are
/// allocated from and the call primitive. Everything else is provided.
pub trait Handler {
    type Heap: PhysHeap + ?Sized;

    /// Returns the negotiated features and the session.
    fn registry(&self) -> &Registry;

    /// Returns the heap request blocks are allocated from.
    fn heap(&self) -> &Self::Heap;

    /// Passes the committed request `block` to the host and returns when the host is done
    /// with it.
    ///
    /// The block begins with the [prefix](crate::item::Prefix) carrying the physical address of
    /// the envelope. An error is a transport failure, in which case the block is not inspected.
    fn dispatch(&self, block: &mut [u8]) -> Result<()>;

    /// Executes an arbitrary call in a block allocated from the [heap](Handler::heap).
    ///
    /// The block is released before returning, on every path.
    #[inline]
    fn execute<'a, T: Call<'a>>(&self, call: T) -> Result<T::Collected> {
        let mut alloc = Alloc::new();
        let staged = StagedCall::stage(call, &mut alloc, self.registry().features())?;
        let mut block = PhysBuf::new(self.heap(), alloc.len())?;
        run(self, alloc, staged, block.phys_mut())
    }

    /// Executes an arbitrary call in a block owned by the caller.
    ///
    /// Fails with [`VERR_BUFFER_OVERFLOW`](crate::status::VERR_BUFFER_OVERFLOW) if `block` is
    /// too small.
    #[inline]
    fn execute_in<'a, T: Call<'a>>(&self, block: PhysMut<'_>, call: T) -> Result<T::Collected> {
        let mut alloc = Alloc::new();
        let staged = StagedCall::stage(call, &mut alloc, self.registry().features())?;
        run(self, alloc, staged, block)
    }

    /// Maps the shared folder called `name` and returns its root id.
    ///
    /// `name` must hold an encoded shared folder string.
    #[inline]
    fn map_folder(&self, name: Phys<'_>, delimiter: u16, case_sensitive: bool) -> Result<Root> {
        self.execute(call::MapFolder {
            name,
            delimiter,
            case_sensitive,
        })
    }

    #[inline]
    fn unmap_folder(&self, root: Root) -> Result<()> {
        self.execute(call::UnmapFolder { root })
    }

    /// Opens or creates the object at `path`, updating `parms` with the outcome.
    #[inline]
    fn create(&self, root: Root, path: ShflStr<'_>, parms: &mut CreateParms) -> Result<()> {
        self.execute(call::Create { root, path, parms })
    }

    #[inline]
    fn close(&self, root: Root, handle: Handle) -> Result<()> {
        self.execute(call::Close { root, handle })
    }

    #[inline]
    fn query_vol_info(&self, root: Root, handle: Handle, info: &mut VolInfo) -> Result<()> {
        self.execute(call::QueryVolInfo { root, handle, info })
    }

    #[inline]
    fn query_obj_info(&self, root: Root, handle: Handle, info: &mut ObjInfo) -> Result<()> {
        self.execute(call::QueryObjInfo { root, handle, info })
    }

    #[inline]
    fn set_obj_info(&self, root: Root, handle: Handle, info: &mut ObjInfo) -> Result<()> {
        self.execute(call::SetObjInfo { root, handle, info })
    }

    /// Sets the object information at `offset` within `buf` and returns the object information
    /// written back by the host.
    #[inline]
    fn set_obj_info_with_buf(
        &self,
        root: Root,
        handle: Handle,
        buf: PhysMut<'_>,
        offset: usize,
    ) -> Result<ObjInfo> {
        self.execute(call::SetObjInfoWithBuf {
            root,
            handle,
            buf,
            offset,
        })
    }

    #[inline]
    fn remove(&self, root: Root, path: ShflStr<'_>, flags: RemoveFlags) -> Result<()> {
        self.execute(call::Remove { root, path, flags })
    }

    /// Renames `src` to `dst`, where `src` holds an encoded shared folder string.
    #[inline]
    fn rename_with_src_buf(
        &self,
        root: Root,
        src: Phys<'_>,
        dst: ShflStr<'_>,
        flags: RenameFlags,
    ) -> Result<()> {
        self.execute(call::Rename {
            root,
            src,
            dst,
            flags,
        })
    }

    #[inline]
    fn flush(&self, root: Root, handle: Handle) -> Result<()> {
        self.execute(call::Flush { root, handle })
    }

    #[inline]
    fn set_file_size(&self, root: Root, handle: Handle, size: u64) -> Result<()> {
        self.execute(call::SetFileSize { root, handle, size })
    }

    /// Reads at `offset` into `buf` and returns the number of bytes read.
    #[inline]
    fn read_embedded(
        &self,
        root: Root,
        handle: Handle,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<u32> {
        self.execute(call::ReadEmbedded {
            root,
            handle,
            offset,
            buf,
        })
    }

    /// Reads `len` bytes at `offset` into `pages` and returns the number of bytes read.
    #[inline]
    fn read_page_list(
        &self,
        root: Root,
        handle: Handle,
        offset: u64,
        len: u32,
        pages: PageList<'_>,
    ) -> Result<u32> {
        self.execute(call::ReadPageList {
            root,
            handle,
            offset,
            len,
            pages,
        })
    }

    /// Reads at `offset` into `buf` and returns the number of bytes read.
    #[inline]
    fn read_contiguous(
        &self,
        root: Root,
        handle: Handle,
        offset: u64,
        buf: PhysMut<'_>,
    ) -> Result<u32> {
        self.execute(call::ReadContiguous {
            root,
            handle,
            offset,
            buf,
        })
    }

    /// Writes `buf` at `offset` and returns the number of bytes written.
    #[inline]
    fn write_embedded(&self, root: Root, handle: Handle, offset: u64, buf: &[u8]) -> Result<u32> {
        self.execute(call::WriteEmbedded {
            root,
            handle,
            offset,
            buf,
        })
    }

    /// Writes `len` bytes from `pages` at `offset` and returns the number of bytes written.
    #[inline]
    fn write_page_list(
        &self,
        root: Root,
        handle: Handle,
        offset: u64,
        len: u32,
        pages: PageList<'_>,
    ) -> Result<u32> {
        self.execute(call::WritePageList {
            root,
            handle,
            offset,
            len,
            pages,
        })
    }

    /// Writes `buf` at `offset` and returns the number of bytes written.
    #[inline]
    fn write_contiguous(
        &self,
        root: Root,
        handle: Handle,
        offset: u64,
        buf: Phys<'_>,
    ) -> Result<u32> {
        self.execute(call::WriteContiguous {
            root,
            handle,
            offset,
            buf,
        })
    }

    /// Lists the directory `handle` into `buf`.
    #[inline]
    fn list_dir(
        &self,
        root: Root,
        handle: Handle,
        filter: Option<Phys<'_>>,
        flags: ListFlags,
        buf: PhysMut<'_>,
    ) -> Result<ListResult> {
        self.execute(call::ListDir {
            root,
            handle,
            flags,
            filter,
            buf,
        })
    }

    /// Not supported by the shared folder service. Nothing is dispatched.
    #[inline]
    fn set_path_mode(&self, root: Root, path: ShflStr<'_>, mode: u32) -> Result<()> {
        debug!(
            "set mode {:o} of {:?} on {}: not implemented",
            mode,
            path.string(),
            root
        );
        Err(VERR_NOT_IMPLEMENTED)
    }

    /// Not supported by the shared folder service. Nothing is dispatched.
    #[inline]
    fn set_path_owner(&self, root: Root, path: ShflStr<'_>, uid: u32, gid: u32) -> Result<()> {
        debug!(
            "set owner {}:{} of {:?} on {}: not implemented",
            uid,
            gid,
            path.string(),
            root
        );
        Err(VERR_NOT_IMPLEMENTED)
    }

    /// Not supported by the shared folder service. Nothing is dispatched.
    #[inline]
    fn set_path_times(
        &self,
        root: Root,
        path: ShflStr<'_>,
        access_time: i64,
        modification_time: i64,
    ) -> Result<()> {
        debug!(
            "set times {}/{} of {:?} on {}: not implemented",
            access_time,
            modification_time,
            path.string(),
            root
        );
        Err(VERR_NOT_IMPLEMENTED)
    }
}
