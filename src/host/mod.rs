// SPDX-License-Identifier: Apache-2.0

//! Host-specific functionality.
//!
//! [`Request`] is a reference decoder of request blocks, as the host-side shared folder service
//! sees them. It validates the envelope, the parameter tags and the bounds of every buffer
//! reference, resolves buffer parameters to their locations and writes the reply.

use crate::item::{
    ByteSized, Direction, Envelope, Function, PageListHeader, Parameter, Prefix,
    PAGE_LIST_HEADER_SIZE, PARMS_OFFSET, PARM_SIZE, PREFIX_SIZE, REQUEST_HGCM_CALL64, VERSION,
};
use crate::status::{VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::{Result, PAGE_SIZE};

use core::convert::TryFrom;
use core::ops::Range;

/// Offset of [`Envelope::result`] within a block.
const RESULT_OFFSET: usize = PREFIX_SIZE + 28;

/// Physical pages of a page list within a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pages<'a> {
    bytes: &'a [u8],
}

impl<'a> Pages<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / 8
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns page `i`, if within the list.
    pub fn get(&self, i: usize) -> Option<u64> {
        let raw = self.bytes.get(i * 8..(i + 1) * 8)?;
        u64::from_bytes(raw).map(u64::from_le)
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + 'a {
        let pages = *self;
        (0..pages.len()).filter_map(move |i| pages.get(i))
    }
}

/// Location of a buffer referenced by a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffer<'a> {
    /// Data within the block, at the given block offset.
    Embedded {
        dir: Direction,
        offset: usize,
        size: usize,
    },

    /// Guest linear address.
    Linear { dir: Direction, addr: u64, size: usize },

    /// Guest physical pages. Page lists described as contiguous have a single run.
    Pages {
        dir: Direction,
        first_page_offset: u16,
        size: usize,
        pages: Pages<'a>,
        contiguous: bool,
    },
}

impl Buffer<'_> {
    #[inline]
    pub fn direction(&self) -> Direction {
        match *self {
            Self::Embedded { dir, .. } | Self::Linear { dir, .. } | Self::Pages { dir, .. } => dir,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        match *self {
            Self::Embedded { size, .. } | Self::Linear { size, .. } | Self::Pages { size, .. } => {
                size
            }
        }
    }
}

/// A validated request block.
#[derive(Debug)]
pub struct Request<'a> {
    block: &'a mut [u8],
    envelope: Envelope,
    function: Function,
}

impl<'a> Request<'a> {
    /// Validates `block`, which begins with the guest-private [prefix](Prefix).
    pub fn new(block: &'a mut [u8]) -> Result<Self> {
        if block.len() < PARMS_OFFSET {
            return Err(VERR_INVALID_PARAMETER);
        }

        let envelope =
            Envelope::from_bytes(&block[PREFIX_SIZE..PARMS_OFFSET]).ok_or(VERR_INVALID_PARAMETER)?;
        if envelope.size as usize + PREFIX_SIZE != block.len()
            || envelope.version != VERSION
            || envelope.request_type != REQUEST_HGCM_CALL64
        {
            return Err(VERR_INVALID_PARAMETER);
        }

        let function = Function::try_from(envelope.function)?;
        let count = envelope.parm_count as usize;
        if count != function.parm_count() || PARMS_OFFSET + count * PARM_SIZE > block.len() {
            return Err(VERR_INVALID_PARAMETER);
        }

        Ok(Self {
            block,
            envelope,
            function,
        })
    }

    /// Physical address of the envelope as recorded in the prefix.
    #[inline]
    pub fn phys_req(&self) -> u64 {
        Prefix::from_bytes(&self.block[..PREFIX_SIZE]).map_or(0, |prefix| prefix.phys_req)
    }

    #[inline]
    pub fn function(&self) -> Function {
        self.function
    }

    #[inline]
    pub fn client_id(&self) -> u32 {
        self.envelope.client_id
    }

    #[inline]
    pub fn parm_count(&self) -> usize {
        self.envelope.parm_count as _
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    #[inline]
    fn slot(&self, i: usize) -> Result<Range<usize>> {
        if i >= self.parm_count() {
            return Err(VERR_OUT_OF_RANGE);
        }
        let start = PARMS_OFFSET + i * PARM_SIZE;
        Ok(start..start + PARM_SIZE)
    }

    /// End of the parameter zone, before which no buffer may live.
    #[inline]
    fn parms_end(&self) -> usize {
        PARMS_OFFSET + self.parm_count() * PARM_SIZE
    }

    /// Decodes parameter `i`.
    pub fn parameter(&self, i: usize) -> Result<Parameter> {
        Parameter::decode(&self.block[self.slot(i)?])
    }

    #[inline]
    pub fn value32(&self, i: usize) -> Result<u32> {
        self.parameter(i)?.value32()
    }

    #[inline]
    pub fn value64(&self, i: usize) -> Result<u64> {
        self.parameter(i)?.value64()
    }

    /// Translates an envelope-relative range into a block range outside the header zones.
    fn payload(&self, offset: u32, size: usize) -> Result<Range<usize>> {
        let start = PREFIX_SIZE + offset as usize;
        let end = start.checked_add(size).ok_or(VERR_INVALID_PARAMETER)?;
        if start < self.parms_end() || end > self.block.len() {
            return Err(VERR_INVALID_PARAMETER);
        }
        Ok(start..end)
    }

    fn pages(&self, offset: u32, size: u32, contiguous: bool) -> Result<Buffer<'_>> {
        let at = self.payload(offset, PAGE_LIST_HEADER_SIZE)?;
        let header =
            PageListHeader::from_bytes(&self.block[at.clone()]).ok_or(VERR_INVALID_PARAMETER)?;
        let dir = header.direction().ok_or(VERR_INVALID_PARAMETER)?;
        let count = header.page_count as usize;
        let first_page_offset = header.first_page_offset;
        if count == 0 || first_page_offset as usize >= PAGE_SIZE {
            return Err(VERR_INVALID_PARAMETER);
        }

        // A single run is physically contiguous, otherwise the pages must cover the buffer.
        let size = size as usize;
        let covered = if contiguous {
            count == 1
        } else {
            first_page_offset as usize + size <= count * PAGE_SIZE
        };
        if !covered {
            return Err(VERR_INVALID_PARAMETER);
        }

        let pages = self.payload(offset + PAGE_LIST_HEADER_SIZE as u32, count * 8)?;
        Ok(Buffer::Pages {
            dir,
            first_page_offset,
            size,
            pages: Pages {
                bytes: &self.block[pages],
            },
            contiguous,
        })
    }

    /// Resolves the buffer referenced by parameter `i`.
    pub fn buffer(&self, i: usize) -> Result<Buffer<'_>> {
        match self.parameter(i)? {
            Parameter::Embedded { dir, size, offset } => {
                let range = self.payload(offset, size as _)?;
                Ok(Buffer::Embedded {
                    dir,
                    offset: range.start,
                    size: size as _,
                })
            }
            Parameter::Linear { dir, size, addr } => Ok(Buffer::Linear {
                dir,
                addr,
                size: size as _,
            }),
            Parameter::PageList { size, offset } => self.pages(offset, size, false),
            Parameter::ContiguousPageList { size, offset } => self.pages(offset, size, true),
            Parameter::U32(..) | Parameter::U64(..) => Err(VERR_INVALID_PARAMETER),
        }
    }

    /// Returns the embedded data referenced by parameter `i`.
    pub fn embedded(&self, i: usize) -> Result<&[u8]> {
        match self.buffer(i)? {
            Buffer::Embedded { offset, size, .. } => Ok(&self.block[offset..][..size]),
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }

    /// Mutably returns the embedded data referenced by parameter `i`.
    ///
    /// Data the guest does not expect back is rejected.
    pub fn embedded_mut(&mut self, i: usize) -> Result<&mut [u8]> {
        let (offset, size) = match self.buffer(i)? {
            Buffer::Embedded { dir, offset, size } if dir.contains(Direction::FROM_HOST) => {
                (offset, size)
            }
            _ => return Err(VERR_INVALID_PARAMETER),
        };
        Ok(&mut self.block[offset..][..size])
    }

    /// Replaces the value of the 32-bit parameter `i`.
    pub fn set_value32(&mut self, i: usize, val: u32) -> Result<()> {
        match self.parameter(i)? {
            Parameter::U32(..) => {
                let slot = self.slot(i)?;
                self.block[slot].copy_from_slice(&Parameter::U32(val).encode());
                Ok(())
            }
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }

    /// Records the result of the call.
    #[inline]
    pub fn set_result(&mut self, rc: i32) {
        self.envelope.result = rc;
        self.block[RESULT_OFFSET..][..4].copy_from_slice(&rc.to_le_bytes());
    }

    #[inline]
    pub fn result(&self) -> i32 {
        self.envelope.result
    }
}
