/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use bitflags::bitflags;
use static_assertions::assert_eq_size;

use crate::VOID_IDX;

bitflags! {
    /// Flag bits of a page table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[repr(transparent)]
    pub struct PteFlags: u32 {
        const PRESENT = 0x1;
        const DIRTY = 0x2;
        const REF = 0x4;
    }
}

assert_eq_size!(PteFlags, u32);

/// One entry of the page table as it is laid out in the shared region.
///
/// `frame` is `VOID_IDX` while the page is not mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PageTableEntry {
    flags: u32,
    frame: i32,
}

assert_eq_size!(PageTableEntry, u64);

impl PageTableEntry {
    pub const fn unmapped() -> Self {
        Self {
            flags: PteFlags::empty().bits(),
            frame: VOID_IDX,
        }
    }

    /// Entry of a freshly loaded page: `PRESENT | REF`, not dirty.
    pub(crate) fn loaded(frame: usize) -> Self {
        Self {
            flags: (PteFlags::PRESENT | PteFlags::REF).bits(),
            frame: frame as i32,
        }
    }

    #[inline]
    pub fn flags(&self) -> PteFlags {
        PteFlags::from_bits_retain(self.flags)
    }

    #[inline]
    pub(crate) fn set_flags(&mut self, flags: PteFlags) {
        self.flags = flags.bits();
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.flags().contains(PteFlags::PRESENT)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.flags().contains(PteFlags::DIRTY)
    }

    #[inline]
    pub fn is_referenced(&self) -> bool {
        self.flags().contains(PteFlags::REF)
    }

    /// The frame backing this page, `None` if unmapped.
    #[inline]
    pub fn frame(&self) -> Option<usize> {
        if self.frame == VOID_IDX {
            None
        } else {
            Some(self.frame as usize)
        }
    }

    /// Raw frame value, `VOID_IDX` if unmapped
    #[inline]
    pub fn raw_frame(&self) -> i32 {
        self.frame
    }
}

impl Default for PageTableEntry {
    fn default() -> Self {
        Self::unmapped()
    }
}
