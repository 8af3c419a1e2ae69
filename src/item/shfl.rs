// SPDX-License-Identifier: Apache-2.0

//! Shared folder payload definitions.

use super::{ByteSized, Handle, HANDLE_NIL};
use crate::status::{VERR_BUFFER_OVERFLOW, VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::{Error, Result};

use bitflags::bitflags;
use core::convert::TryFrom;
use core::mem::size_of;

/// Size of the string header (`size: u16`, `length: u16`).
pub const STRING_HEADER_SIZE: usize = 4;

/// Size of the terminator following the string bytes.
pub const STRING_TERMINATOR_SIZE: usize = 2;

/// Returns the encoded size of a string of `len` bytes.
#[inline]
pub const fn string_len(len: usize) -> usize {
    STRING_HEADER_SIZE + len + STRING_TERMINATOR_SIZE
}

/// An encoded, length-prefixed shared folder string.
///
/// The wire format is `size: u16` (bytes following the header), `length: u16` (bytes of
/// actual string data), then `size` bytes holding the string and its terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShflStr<'a> {
    bytes: &'a [u8],
}

impl<'a> ShflStr<'a> {
    /// Encodes `src` into `dst`, returning a view of the encoded string.
    pub fn encode(dst: &'a mut [u8], src: &[u8]) -> Result<Self> {
        let len = string_len(src.len());
        let size = u16::try_from(src.len() + STRING_TERMINATOR_SIZE)
            .map_err(|_| VERR_OUT_OF_RANGE)?;
        if dst.len() < len {
            return Err(VERR_BUFFER_OVERFLOW);
        }

        let dst = &mut dst[..len];
        dst[..2].copy_from_slice(&size.to_le_bytes());
        dst[2..4].copy_from_slice(&(src.len() as u16).to_le_bytes());
        dst[STRING_HEADER_SIZE..][..src.len()].copy_from_slice(src);
        dst[STRING_HEADER_SIZE + src.len()..].fill(0);

        Ok(Self { bytes: dst })
    }

    /// Interprets `bytes` as an encoded string.
    ///
    /// Trailing bytes past the encoded size are ignored.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < STRING_HEADER_SIZE {
            return Err(VERR_INVALID_PARAMETER);
        }

        let size = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        let length = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
        if length > size || STRING_HEADER_SIZE + size > bytes.len() {
            return Err(VERR_INVALID_PARAMETER);
        }

        Ok(Self {
            bytes: &bytes[..STRING_HEADER_SIZE + size],
        })
    }

    /// Size of the buffer following the header.
    #[inline]
    pub fn size(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    /// Length of the string data.
    #[inline]
    pub fn length(&self) -> u16 {
        u16::from_le_bytes([self.bytes[2], self.bytes[3]])
    }

    /// The string data, without terminator.
    #[inline]
    pub fn string(&self) -> &'a [u8] {
        &self.bytes[STRING_HEADER_SIZE..][..self.length() as usize]
    }

    /// The full encoded string, header included.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Size of the full encoded string.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }
}

/// Result of a [`Function::Create`](super::Function::Create) request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum CreateResult {
    NoResult = 0,
    PathNotFound = 1,
    FileNotFound = 2,
    FileExists = 3,
    FileCreated = 4,
    FileReplaced = 5,
}

impl TryFrom<u32> for CreateResult {
    type Error = Error;

    #[inline]
    fn try_from(result: u32) -> core::result::Result<Self, Self::Error> {
        match result {
            result if result == Self::NoResult as _ => Ok(Self::NoResult),
            result if result == Self::PathNotFound as _ => Ok(Self::PathNotFound),
            result if result == Self::FileNotFound as _ => Ok(Self::FileNotFound),
            result if result == Self::FileExists as _ => Ok(Self::FileExists),
            result if result == Self::FileCreated as _ => Ok(Self::FileCreated),
            result if result == Self::FileReplaced as _ => Ok(Self::FileReplaced),
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }
}

bitflags! {
    /// Flags of a [`CreateParms`] request.
    #[derive(Default)]
    pub struct CreateFlags: u32 {
        /// Only look the object up, do not open it.
        const LOOKUP = 0x0000_0001;
        const OPEN_TARGET_DIRECTORY = 0x0000_0002;
        const DIRECTORY = 0x0000_0004;

        const ACT_FAIL_IF_EXISTS = 0x0000_0010;
        const ACT_OVERWRITE_IF_EXISTS = 0x0000_0020;
        const ACT_REPLACE_IF_EXISTS = 0x0000_0030;
        const ACT_FAIL_IF_NEW = 0x0000_0100;

        const ACCESS_READ = 0x0000_1000;
        const ACCESS_WRITE = 0x0000_2000;
        const ACCESS_READWRITE = Self::ACCESS_READ.bits | Self::ACCESS_WRITE.bits;
        const ACCESS_APPEND = 0x0001_0000;
    }
}

bitflags! {
    /// Flags of a [`Function::Information`](super::Function::Information) request.
    #[derive(Default)]
    pub struct InfoFlags: u32 {
        const SET = 0x01;
        const NAME = 0x02;
        const SIZE = 0x04;
        const FILE = 0x08;
        const VOLUME = 0x10;
    }
}

impl InfoFlags {
    /// Query, the absence of [`InfoFlags::SET`].
    pub const GET: Self = Self::empty();
}

bitflags! {
    /// Flags of a [`Function::Remove`](super::Function::Remove) request.
    #[derive(Default)]
    pub struct RemoveFlags: u32 {
        const FILE = 0x01;
        const DIR = 0x02;
        const SYMLINK = 0x04;
    }
}

bitflags! {
    /// Flags of a [`Function::Rename`](super::Function::Rename) request.
    #[derive(Default)]
    pub struct RenameFlags: u32 {
        const FILE = 0x01;
        const DIR = 0x02;
        const REPLACE_IF_EXISTS = 0x04;
    }
}

bitflags! {
    /// Flags of a [`Function::List`](super::Function::List) request.
    #[derive(Default)]
    pub struct ListFlags: u32 {
        const RETURN_ONE = 0x01;
        const RESTART = 0x02;
    }
}

/// Filesystem object information.
///
/// Times are nanoseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ObjInfo {
    pub size: i64,
    pub allocated: i64,
    pub access_time: i64,
    pub modification_time: i64,
    pub change_time: i64,
    pub birth_time: i64,

    pub mode: u32,
    pub additional: u32,
    pub uid: u32,
    pub gid: u32,
    pub hardlinks: u32,
    pub inode_id_device: u32,
    pub inode_id: u64,
    pub flags: u32,
    pub generation_id: u32,
    pub device: u32,
    pub reserved: u32,
}

unsafe impl ByteSized for ObjInfo {}

/// Parameters and result of a [`Function::Create`](super::Function::Create) request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct CreateParms {
    /// Handle of the opened object, [`HANDLE_NIL`] if none.
    pub handle: Handle,

    /// Raw [`CreateResult`].
    pub result: u32,

    /// Raw [`CreateFlags`].
    pub flags: u32,

    pub info: ObjInfo,
}

unsafe impl ByteSized for CreateParms {}

impl Default for CreateParms {
    fn default() -> Self {
        Self::new(CreateFlags::empty())
    }
}

impl CreateParms {
    pub fn new(flags: CreateFlags) -> Self {
        Self {
            handle: HANDLE_NIL,
            result: CreateResult::NoResult as _,
            flags: flags.bits(),
            info: ObjInfo::default(),
        }
    }

    #[inline]
    pub fn create_result(&self) -> Result<CreateResult> {
        CreateResult::try_from(self.result)
    }
}

/// Volume information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct VolInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub bytes_per_allocation_unit: u32,
    pub bytes_per_sector: u32,
    pub serial: u32,
    pub max_component: u32,
    pub remote: u8,
    pub case_sensitive: u8,
    pub read_only: u8,
    pub supports_unicode: u8,
    pub compressed: u8,
    pub file_compression: u8,
    pub reserved: [u8; 2],
}

unsafe impl ByteSized for VolInfo {}

/// Offset of the short name length within a directory entry.
const DIR_SHORT_NAME_OFFSET: usize = size_of::<ObjInfo>();

/// Offset of the name string within a directory entry.
pub const DIR_NAME_OFFSET: usize = DIR_SHORT_NAME_OFFSET + 2 + 14 * 2;

/// A single directory entry as returned by [`Function::List`](super::Function::List).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirEntry<'a> {
    pub info: ObjInfo,

    /// Short name as raw UTF-16LE bytes.
    pub short_name: &'a [u8],

    pub name: ShflStr<'a>,
}

/// Iterator over packed directory entries in a list buffer.
#[derive(Clone, Debug)]
pub struct DirEntries<'a> {
    buf: &'a [u8],
    remaining: u32,
}

impl<'a> DirEntries<'a> {
    /// Iterates at most `entries` entries stored in `buf`.
    pub fn new(buf: &'a [u8], entries: u32) -> Self {
        Self {
            buf,
            remaining: entries,
        }
    }
}

impl<'a> Iterator for DirEntries<'a> {
    type Item = DirEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.buf.len() < DIR_NAME_OFFSET {
            return None;
        }

        let info = ObjInfo::from_bytes(&self.buf[..DIR_SHORT_NAME_OFFSET])?;
        let short = &self.buf[DIR_SHORT_NAME_OFFSET..DIR_NAME_OFFSET];
        let short_len =
            (u16::from_le_bytes([short[0], short[1]]) as usize * 2).min(short.len() - 2);
        let name = ShflStr::from_bytes(&self.buf[DIR_NAME_OFFSET..]).ok()?;

        self.buf = &self.buf[(DIR_NAME_OFFSET + name.len()).min(self.buf.len())..];
        self.remaining -= 1;

        Some(DirEntry {
            info,
            short_name: &short[2..][..short_len],
            name,
        })
    }
}
