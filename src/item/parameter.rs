// SPDX-License-Identifier: Apache-2.0

use crate::status::{VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::{Error, Result};

use bitflags::bitflags;
use core::convert::TryFrom;

/// Size of a single parameter on the wire.
pub const PARM_SIZE: usize = 16;

/// Largest envelope-relative offset an embedded parameter can express.
pub const MAX_EMBEDDED_OFFSET: usize = 0x00FF_FFFF;

/// Parameter type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ParmType {
    Invalid = 0,
    U32 = 1,
    U64 = 2,
    PhysAddr = 3,
    LinAddr = 4,
    LinAddrIn = 5,
    LinAddrOut = 6,
    LinAddrLocked = 7,
    LinAddrLockedIn = 8,
    LinAddrLockedOut = 9,
    PageList = 10,
    Embedded = 11,
    ContiguousPageList = 12,
    NoBouncePageList = 13,
}

impl TryFrom<u32> for ParmType {
    type Error = Error;

    #[inline]
    fn try_from(kind: u32) -> core::result::Result<Self, Self::Error> {
        match kind {
            kind if kind == Self::Invalid as _ => Ok(Self::Invalid),
            kind if kind == Self::U32 as _ => Ok(Self::U32),
            kind if kind == Self::U64 as _ => Ok(Self::U64),
            kind if kind == Self::PhysAddr as _ => Ok(Self::PhysAddr),
            kind if kind == Self::LinAddr as _ => Ok(Self::LinAddr),
            kind if kind == Self::LinAddrIn as _ => Ok(Self::LinAddrIn),
            kind if kind == Self::LinAddrOut as _ => Ok(Self::LinAddrOut),
            kind if kind == Self::LinAddrLocked as _ => Ok(Self::LinAddrLocked),
            kind if kind == Self::LinAddrLockedIn as _ => Ok(Self::LinAddrLockedIn),
            kind if kind == Self::LinAddrLockedOut as _ => Ok(Self::LinAddrLockedOut),
            kind if kind == Self::PageList as _ => Ok(Self::PageList),
            kind if kind == Self::Embedded as _ => Ok(Self::Embedded),
            kind if kind == Self::ContiguousPageList as _ => Ok(Self::ContiguousPageList),
            kind if kind == Self::NoBouncePageList as _ => Ok(Self::NoBouncePageList),
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }
}

bitflags! {
    /// Direction of a buffer transfer.
    #[derive(Default)]
    pub struct Direction: u32 {
        /// The host reads the buffer.
        const TO_HOST = 1;

        /// The host writes the buffer.
        const FROM_HOST = 1 << 1;

        const BOTH = Self::TO_HOST.bits | Self::FROM_HOST.bits;
    }
}

/// A request parameter.
///
/// Offsets are relative to the beginning of the [`Envelope`](super::Envelope).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parameter {
    U32(u32),
    U64(u64),

    /// Guest linear address.
    Linear {
        dir: Direction,
        size: u32,
        addr: u64,
    },

    /// Reference to a [page list](super::PageListHeader) within the block.
    PageList { size: u32, offset: u32 },

    /// Reference to a single-run [page list](super::PageListHeader) within the block.
    ContiguousPageList { size: u32, offset: u32 },

    /// Data embedded within the block.
    Embedded {
        dir: Direction,
        size: u32,
        offset: u32,
    },
}

#[inline]
fn size32(size: usize) -> Result<u32> {
    u32::try_from(size).map_err(|_| VERR_OUT_OF_RANGE)
}

impl Parameter {
    /// Creates a [`Parameter::Linear`] for `size` bytes at `addr`.
    pub fn linear(dir: Direction, addr: u64, size: usize) -> Result<Self> {
        Ok(Self::Linear {
            dir,
            size: size32(size)?,
            addr,
        })
    }

    /// Creates a [`Parameter::Embedded`] for `size` bytes at envelope-relative `offset`.
    pub fn embedded(dir: Direction, offset: usize, size: usize) -> Result<Self> {
        if offset > MAX_EMBEDDED_OFFSET {
            return Err(VERR_OUT_OF_RANGE);
        }
        Ok(Self::Embedded {
            dir,
            size: size32(size)?,
            offset: offset as _,
        })
    }

    /// Creates a [`Parameter::PageList`] for `size` bytes described at envelope-relative `offset`.
    pub fn page_list(offset: usize, size: usize) -> Result<Self> {
        Ok(Self::PageList {
            size: size32(size)?,
            offset: size32(offset)?,
        })
    }

    /// Creates a [`Parameter::ContiguousPageList`] for `size` bytes described at envelope-relative
    /// `offset`.
    pub fn contiguous(offset: usize, size: usize) -> Result<Self> {
        Ok(Self::ContiguousPageList {
            size: size32(size)?,
            offset: size32(offset)?,
        })
    }

    /// Returns the wire type tag.
    pub fn kind(&self) -> ParmType {
        match self {
            Self::U32(..) => ParmType::U32,
            Self::U64(..) => ParmType::U64,
            Self::Linear { dir, .. } if *dir == Direction::TO_HOST => ParmType::LinAddrIn,
            Self::Linear { dir, .. } if *dir == Direction::FROM_HOST => ParmType::LinAddrOut,
            Self::Linear { .. } => ParmType::LinAddr,
            Self::PageList { .. } => ParmType::PageList,
            Self::ContiguousPageList { .. } => ParmType::ContiguousPageList,
            Self::Embedded { .. } => ParmType::Embedded,
        }
    }

    /// Encodes the parameter into its wire representation. Unused bytes are zero.
    pub fn encode(&self) -> [u8; PARM_SIZE] {
        let mut raw = [0u8; PARM_SIZE];
        raw[..4].copy_from_slice(&(self.kind() as u32).to_le_bytes());
        match *self {
            Self::U32(val) => raw[4..8].copy_from_slice(&val.to_le_bytes()),
            Self::U64(val) => raw[4..12].copy_from_slice(&val.to_le_bytes()),
            Self::Linear { size, addr, .. } => {
                raw[4..8].copy_from_slice(&size.to_le_bytes());
                raw[8..16].copy_from_slice(&addr.to_le_bytes());
            }
            Self::PageList { size, offset } | Self::ContiguousPageList { size, offset } => {
                raw[4..8].copy_from_slice(&size.to_le_bytes());
                raw[8..12].copy_from_slice(&offset.to_le_bytes());
            }
            Self::Embedded { dir, size, offset } => {
                let word = (dir.bits() & 0xFF) | (offset << 8);
                raw[4..8].copy_from_slice(&word.to_le_bytes());
                raw[8..12].copy_from_slice(&size.to_le_bytes());
            }
        }
        raw
    }

    /// Decodes a parameter from its wire representation.
    ///
    /// Types this crate never produces are rejected with [`VERR_INVALID_PARAMETER`].
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() != PARM_SIZE {
            return Err(VERR_INVALID_PARAMETER);
        }

        let u32_at =
            |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let u64_at = |at: usize| u64::from(u32_at(at)) | u64::from(u32_at(at + 4)) << 32;

        let linear = |dir| Self::Linear {
            dir,
            size: u32_at(4),
            addr: u64_at(8),
        };

        match ParmType::try_from(u32_at(0))? {
            ParmType::U32 => Ok(Self::U32(u32_at(4))),
            ParmType::U64 => Ok(Self::U64(u64_at(4))),
            ParmType::LinAddr => Ok(linear(Direction::BOTH)),
            ParmType::LinAddrIn => Ok(linear(Direction::TO_HOST)),
            ParmType::LinAddrOut => Ok(linear(Direction::FROM_HOST)),
            ParmType::PageList => Ok(Self::PageList {
                size: u32_at(4),
                offset: u32_at(8),
            }),
            ParmType::ContiguousPageList => Ok(Self::ContiguousPageList {
                size: u32_at(4),
                offset: u32_at(8),
            }),
            ParmType::Embedded => {
                let word = u32_at(4);
                Ok(Self::Embedded {
                    dir: Direction::from_bits(word & 0xFF).ok_or(VERR_INVALID_PARAMETER)?,
                    size: u32_at(8),
                    offset: word >> 8,
                })
            }
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }

    /// Returns the 32-bit value of a [`Parameter::U32`].
    pub fn value32(&self) -> Result<u32> {
        match *self {
            Self::U32(val) => Ok(val),
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }

    /// Returns the 64-bit value of a [`Parameter::U64`].
    pub fn value64(&self) -> Result<u64> {
        match *self {
            Self::U64(val) => Ok(val),
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }

    /// Returns the size of a buffer parameter.
    pub fn size(&self) -> Option<u32> {
        match *self {
            Self::U32(..) | Self::U64(..) => None,
            Self::Linear { size, .. }
            | Self::PageList { size, .. }
            | Self::ContiguousPageList { size, .. }
            | Self::Embedded { size, .. } => Some(size),
        }
    }
}
