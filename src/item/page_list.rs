// SPDX-License-Identifier: Apache-2.0

use super::{ByteSized, Direction};
use crate::PAGE_SIZE;

use core::mem::size_of;

/// Largest number of pages a single page list can describe.
pub const MAX_PAGES: usize = u16::MAX as usize;

/// Page list descriptor header.
///
/// The header is immediately followed by `page_count` page-aligned 64-bit physical addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct PageListHeader {
    /// Transfer [`Direction`] bits.
    pub flags: u32,

    /// Offset of the data within the first page.
    pub first_page_offset: u16,

    pub page_count: u16,
}

unsafe impl ByteSized for PageListHeader {}

/// Size of the [`PageListHeader`] in bytes.
pub const PAGE_LIST_HEADER_SIZE: usize = size_of::<PageListHeader>();

impl PageListHeader {
    #[inline]
    pub fn new(dir: Direction, first_page_offset: u16, page_count: u16) -> Self {
        Self {
            flags: dir.bits(),
            first_page_offset,
            page_count,
        }
    }

    /// Returns the transfer direction, if valid.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_bits(self.flags)
    }

    /// Size of the descriptor including its page array.
    #[inline]
    pub fn size(&self) -> usize {
        PAGE_LIST_HEADER_SIZE + self.page_count as usize * size_of::<u64>()
    }
}

/// Number of pages touched by `len` bytes starting `offset` bytes into a page.
///
/// An empty range still occupies one page entry.
#[inline]
pub const fn page_count(offset: usize, len: usize) -> usize {
    let pages = (offset + len + PAGE_SIZE - 1) / PAGE_SIZE;
    if pages == 0 {
        1
    } else {
        pages
    }
}

/// Splits a physical address into its page-aligned base and the offset within that page.
#[inline]
pub const fn split_phys(phys: u64) -> (u64, u16) {
    let mask = PAGE_SIZE as u64 - 1;
    (phys & !mask, (phys & mask) as u16)
}
