// SPDX-License-Identifier: Apache-2.0

use super::{PhysBuf, PhysHeap};
use crate::item::{page_count, split_phys, MAX_PAGES};
use crate::status::{VERR_BUFFER_OVERFLOW, VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::{Result, PAGE_SIZE};

use core::convert::TryFrom;

/// A physically contiguous byte range split into page-aligned base, first-page offset and length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysRange {
    /// Page-aligned physical address of the first page.
    pub page: u64,

    /// Offset of the first byte within the first page.
    pub offset: u16,

    pub len: u32,
}

impl PhysRange {
    /// Translates `len` bytes starting at physical address `phys`.
    pub fn new(phys: u64, len: usize) -> Result<Self> {
        let (page, offset) = split_phys(phys);
        Ok(Self {
            page,
            offset,
            len: u32::try_from(len).map_err(|_| VERR_OUT_OF_RANGE)?,
        })
    }

    /// Number of pages the range touches.
    #[inline]
    pub fn page_count(&self) -> usize {
        page_count(self.offset as usize, self.len as usize)
    }
}

/// A caller-built scatter list of physical pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageList<'a> {
    first_page_offset: u16,
    pages: &'a [u64],
}

impl<'a> PageList<'a> {
    /// Creates a page list from page-aligned physical addresses.
    ///
    /// The list must hold at least one page. The page count limit is enforced when a request using the list is staged.
    pub fn new(first_page_offset: u16, pages: &'a [u64]) -> Result<Self> {
        let mask = PAGE_SIZE as u64 - 1;
        if pages.is_empty()
            || first_page_offset as usize >= PAGE_SIZE
            || pages.iter().any(|page| page & mask != 0)
        {
            return Err(VERR_INVALID_PARAMETER);
        }

        Ok(Self {
            first_page_offset,
            pages,
        })
    }

    /// Builds the page list of `buf`, translating it page by page into `pages`.
    ///
    /// Fails with [`VERR_BUFFER_OVERFLOW`] if `pages` cannot hold all pages of `buf`.
    pub fn for_buffer<H: PhysHeap + ?Sized>(
        buf: &PhysBuf<'_, H>,
        pages: &'a mut [u64],
    ) -> Result<Self> {
        let first = buf.phys_range()?;
        let count = first.page_count();
        if count > MAX_PAGES {
            return Err(VERR_OUT_OF_RANGE);
        }
        if count > pages.len() {
            return Err(VERR_BUFFER_OVERFLOW);
        }

        pages[0] = first.page;
        for (i, page) in pages[..count].iter_mut().enumerate().skip(1) {
            let offset = i * PAGE_SIZE - first.offset as usize;
            let phys = buf.phys_addr_at(offset).ok_or(VERR_INVALID_PARAMETER)?;
            *page = split_phys(phys).0;
        }

        Ok(Self {
            first_page_offset: first.offset,
            pages: &pages[..count],
        })
    }

    #[inline]
    pub fn first_page_offset(&self) -> u16 {
        self.first_page_offset
    }

    #[inline]
    pub fn pages(&self) -> &'a [u64] {
        self.pages
    }

    /// Number of bytes the list can describe.
    #[inline]
    pub fn capacity(&self) -> usize {
        (self.pages.len() * PAGE_SIZE).saturating_sub(self.first_page_offset as usize)
    }
}
