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

use core::{
    marker::PhantomData,
    mem::{align_of, size_of},
    ptr::{self, slice_from_raw_parts, slice_from_raw_parts_mut},
};

use log::debug;
use static_assertions::{assert_eq_size, const_assert_eq};

use crate::{
    modules::shared_region::SharedRegionModule, PageTableEntry, PteFlags, VmemConfig, VmemError,
};

const REGION_MAGIC: u32 = 0x564d_454d;

/// Start of the shared region. Tells the access side how the rest is laid out.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct RegionHeader {
    magic: u32,
    page_size: u32,
    npages: u32,
    nframes: u32,
}

assert_eq_size!(RegionHeader, [u32; 4]);
const_assert_eq!(size_of::<RegionHeader>() % align_of::<PageTableEntry>(), 0);

/// Byte offsets of the parts of the shared region:
///
/// ```text
/// | RegionHeader | PageTableEntry[npages] | u8[nframes * page_size] |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmemLayout {
    config: VmemConfig,
    page_table_offset: usize,
    memory_offset: usize,
    size: usize,
}

impl VmemLayout {
    pub fn new(config: VmemConfig) -> Self {
        let page_table_offset = size_of::<RegionHeader>();
        let memory_offset = page_table_offset + config.npages * size_of::<PageTableEntry>();

        Self {
            config,
            page_table_offset,
            memory_offset,
            size: memory_offset + config.physmem_size(),
        }
    }

    #[inline]
    pub fn config(&self) -> &VmemConfig {
        &self.config
    }

    /// Total number of bytes the shared region needs
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Raw access to a region that holds a valid layout.
#[derive(Clone, Copy)]
struct RawRegion {
    base_ptr: *mut u8,
    layout: VmemLayout,
}

impl RawRegion {
    #[inline]
    fn entry_ptr(&self, page: usize) -> *mut PageTableEntry {
        assert!(
            page < self.layout.config.npages,
            "page {} out of range ({} pages)",
            page,
            self.layout.config.npages
        );
        unsafe {
            (self.base_ptr.add(self.layout.page_table_offset) as *mut PageTableEntry).add(page)
        }
    }

    #[inline]
    fn read_entry(&self, page: usize) -> PageTableEntry {
        unsafe { ptr::read(self.entry_ptr(page)) }
    }

    #[inline]
    fn write_entry(&self, page: usize, entry: PageTableEntry) {
        unsafe { ptr::write(self.entry_ptr(page), entry) }
    }

    #[inline]
    fn frame_ptr(&self, frame: usize) -> *mut u8 {
        assert!(
            frame < self.layout.config.nframes,
            "frame {} out of range ({} frames)",
            frame,
            self.layout.config.nframes
        );
        unsafe {
            self.base_ptr
                .add(self.layout.memory_offset + frame * self.layout.config.page_size)
        }
    }

    #[inline]
    fn memory_ptr(&self) -> *mut u8 {
        unsafe { self.base_ptr.add(self.layout.memory_offset) }
    }
}

/// View of the manager onto the shared region.
///
/// The manager is the only one writing the page table. While it handles a
/// command the access side is blocked waiting for the ack, so the borrowed
/// slices handed out here are never aliased by a writer.
pub struct ManagerView<'a> {
    raw: RawRegion,
    _region: PhantomData<&'a ()>,
}

// see struct documentation: the request/ack protocol serializes all accesses
unsafe impl Send for ManagerView<'_> {}

impl<'a> ManagerView<'a> {
    /// Writes a fresh layout for `config` into `region`.
    ///
    /// All pages are unmapped afterwards and main memory is zeroed.
    pub fn initialize<R: SharedRegionModule>(
        region: &'a R,
        config: VmemConfig,
    ) -> Result<Self, VmemError> {
        config.validate()?;
        let layout = VmemLayout::new(config);

        if region.size() < layout.size() {
            return Err(VmemError::BadRegion("region too small for configuration"));
        }

        let base_ptr = region.as_ptr();
        let header = RegionHeader {
            magic: REGION_MAGIC,
            page_size: config.page_size as u32,
            npages: config.npages as u32,
            nframes: config.nframes as u32,
        };

        unsafe {
            ptr::write_bytes(base_ptr, 0, layout.size());
            ptr::write(base_ptr as *mut RegionHeader, header);
        }

        let raw = RawRegion { base_ptr, layout };
        for page in 0..config.npages {
            raw.write_entry(page, PageTableEntry::unmapped());
        }

        debug!(
            "Initialized shared region: {} pages, {} frames, page size {}",
            config.npages, config.nframes, config.page_size
        );

        Ok(Self {
            raw,
            _region: PhantomData,
        })
    }

    #[inline]
    pub fn config(&self) -> &VmemConfig {
        &self.raw.layout.config
    }

    #[inline]
    pub fn entry(&self, page: usize) -> PageTableEntry {
        self.raw.read_entry(page)
    }

    #[inline]
    pub(crate) fn set_entry(&mut self, page: usize, entry: PageTableEntry) {
        self.raw.write_entry(page, entry)
    }

    /// Clears `PRESENT` of `page` and removes its frame. `REF` and `DIRTY` are left as they are.
    pub(crate) fn unmap(&mut self, page: usize) {
        let mut flags = self.entry(page).flags();
        flags.remove(PteFlags::PRESENT);

        let mut unmapped = PageTableEntry::unmapped();
        unmapped.set_flags(flags);
        self.set_entry(page, unmapped);
    }

    pub(crate) fn clear_ref(&mut self, page: usize) {
        let mut entry = self.entry(page);
        let mut flags = entry.flags();
        flags.remove(PteFlags::REF);
        entry.set_flags(flags);
        self.set_entry(page, entry);
    }

    /// Bytes of `frame`
    pub fn frame(&self, frame: usize) -> &[u8] {
        let ptr = self.raw.frame_ptr(frame);
        unsafe { &*slice_from_raw_parts(ptr, self.raw.layout.config.page_size) }
    }

    pub(crate) fn frame_mut(&mut self, frame: usize) -> &mut [u8] {
        let ptr = self.raw.frame_ptr(frame);
        unsafe { &mut *slice_from_raw_parts_mut(ptr, self.raw.layout.config.page_size) }
    }

    /// Complete main memory, frame after frame
    pub fn memory(&self) -> &[u8] {
        unsafe {
            &*slice_from_raw_parts(
                self.raw.memory_ptr(),
                self.raw.layout.config.physmem_size(),
            )
        }
    }
}

/// View of the access side onto the shared region.
///
/// Can only set `REF` and `DIRTY` and touch bytes of frames that belong to pages it saw `PRESENT`.
pub struct AccessView<'a> {
    raw: RawRegion,
    _region: PhantomData<&'a ()>,
}

unsafe impl Send for AccessView<'_> {}

impl<'a> AccessView<'a> {
    /// Attaches to a region that was initialized by a [`ManagerView`].
    pub fn attach<R: SharedRegionModule>(region: &'a R) -> Result<Self, VmemError> {
        if region.size() < size_of::<RegionHeader>() {
            return Err(VmemError::BadRegion("region smaller than its header"));
        }

        let base_ptr = region.as_ptr();
        let header = unsafe { ptr::read(base_ptr as *const RegionHeader) };
        if header.magic != REGION_MAGIC {
            return Err(VmemError::BadRegion("region was not initialized by a manager"));
        }

        let config = VmemConfig {
            page_size: header.page_size as usize,
            nframes: header.nframes as usize,
            npages: header.npages as usize,
        };
        config.validate()?;

        let layout = VmemLayout::new(config);
        if region.size() < layout.size() {
            return Err(VmemError::BadRegion("region too small for advertised geometry"));
        }

        Ok(Self {
            raw: RawRegion { base_ptr, layout },
            _region: PhantomData,
        })
    }

    #[inline]
    pub fn config(&self) -> &VmemConfig {
        &self.raw.layout.config
    }

    #[inline]
    pub fn flags(&self, page: usize) -> PteFlags {
        self.raw.read_entry(page).flags()
    }

    /// Frame of `page` if it is present
    #[inline]
    pub fn frame_of(&self, page: usize) -> Option<usize> {
        let entry = self.raw.read_entry(page);
        if entry.is_present() {
            entry.frame()
        } else {
            None
        }
    }

    #[inline]
    pub fn mark_referenced(&mut self, page: usize) {
        self.insert_flags(page, PteFlags::REF);
    }

    #[inline]
    pub fn mark_dirty(&mut self, page: usize) {
        self.insert_flags(page, PteFlags::DIRTY);
    }

    fn insert_flags(&mut self, page: usize, flags: PteFlags) {
        let mut entry = self.raw.read_entry(page);
        debug_assert!(entry.is_present(), "page {} is not present", page);

        let mut current = entry.flags();
        current.insert(flags);
        entry.set_flags(current);
        self.raw.write_entry(page, entry);
    }

    #[inline]
    pub fn read_byte(&self, frame: usize, offset: usize) -> u8 {
        debug_assert!(offset < self.raw.layout.config.page_size);
        unsafe { ptr::read(self.raw.frame_ptr(frame).add(offset)) }
    }

    #[inline]
    pub fn write_byte(&mut self, frame: usize, offset: usize, value: u8) {
        debug_assert!(offset < self.raw.layout.config.page_size);
        unsafe { ptr::write(self.raw.frame_ptr(frame).add(offset), value) }
    }
}
